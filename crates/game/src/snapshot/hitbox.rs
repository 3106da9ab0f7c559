use std::fmt;

use glam::{Quat, Vec3};

use crate::lerp::Lerp;
use crate::time::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HitboxId(pub u32);

impl HitboxId {
    pub fn id(self) -> u32 {
        self.0
    }
}

pub trait Hitbox {
    type Sample: Lerp + Clone + Default + fmt::Debug;

    fn id(&self) -> HitboxId;
    fn assign_id(&mut self, id: HitboxId);
    fn capture(&self) -> Self::Sample;
    fn apply(&mut self, sample: &Self::Sample);
    fn collider_enabled(&self) -> bool;
    fn set_collider_enabled(&mut self, enabled: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HitboxPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl HitboxPose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

impl Lerp for HitboxPose {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: Lerp::lerp(&self.position, &other.position, t),
            rotation: Lerp::lerp(&self.rotation, &other.rotation, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitboxShape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
}

impl HitboxShape {
    /// Distance along `direction` (unit length) to the first surface hit, if
    /// within `max_distance`. Rays starting inside the volume hit at 0.
    pub fn raycast(
        &self,
        pose: &HitboxPose,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<f32> {
        match *self {
            HitboxShape::Sphere { radius } => {
                let oc = origin - pose.position;
                let b = oc.dot(direction);
                let c = oc.length_squared() - radius * radius;
                if c > 0.0 && b > 0.0 {
                    return None;
                }
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }
                let distance = (-b - discriminant.sqrt()).max(0.0);
                (distance <= max_distance).then_some(distance)
            }
            HitboxShape::Box { half_extents } => {
                let inverse = pose.rotation.inverse();
                let local_origin = inverse * (origin - pose.position);
                let local_direction = inverse * direction;

                let mut t_min = 0.0f32;
                let mut t_max = max_distance;
                for axis in 0..3 {
                    let o = local_origin[axis];
                    let d = local_direction[axis];
                    let extent = half_extents[axis];

                    if d.abs() < 1e-8 {
                        if o.abs() > extent {
                            return None;
                        }
                        continue;
                    }

                    let mut t1 = (-extent - o) / d;
                    let mut t2 = (extent - o) / d;
                    if t1 > t2 {
                        std::mem::swap(&mut t1, &mut t2);
                    }
                    t_min = t_min.max(t1);
                    t_max = t_max.min(t2);
                    if t_min > t_max {
                        return None;
                    }
                }
                Some(t_min)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColliderHitbox {
    id: HitboxId,
    pub shape: HitboxShape,
    pub offset: Vec3,
    pub pose: HitboxPose,
    pub damage_multiplier: f32,
    collider_enabled: bool,
}

impl ColliderHitbox {
    pub fn new(shape: HitboxShape, offset: Vec3) -> Self {
        Self {
            id: HitboxId::default(),
            shape,
            offset,
            pose: HitboxPose::default(),
            damage_multiplier: 1.0,
            collider_enabled: true,
        }
    }

    pub fn sphere(radius: f32, offset: Vec3) -> Self {
        Self::new(HitboxShape::Sphere { radius }, offset)
    }

    pub fn cuboid(half_extents: Vec3, offset: Vec3) -> Self {
        Self::new(HitboxShape::Box { half_extents }, offset)
    }

    pub fn with_damage_multiplier(mut self, multiplier: f32) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    pub fn follow(&mut self, owner_position: Vec3, owner_rotation: Quat) {
        self.pose.position = owner_position + owner_rotation * self.offset;
        self.pose.rotation = owner_rotation;
    }

    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        if !self.collider_enabled {
            return None;
        }
        self.shape
            .raycast(&self.pose, origin, direction, max_distance)
    }
}

impl Hitbox for ColliderHitbox {
    type Sample = HitboxPose;

    fn id(&self) -> HitboxId {
        self.id
    }

    fn assign_id(&mut self, id: HitboxId) {
        self.id = id;
    }

    fn capture(&self) -> HitboxPose {
        self.pose
    }

    fn apply(&mut self, sample: &HitboxPose) {
        self.pose = *sample;
    }

    fn collider_enabled(&self) -> bool {
        self.collider_enabled
    }

    fn set_collider_enabled(&mut self, enabled: bool) {
        self.collider_enabled = enabled;
    }
}

#[derive(Debug, Clone, Default)]
pub struct HitboxSnapshot<S> {
    pub frame: Frame,
    pub active: bool,
    pub proximity: S,
    pub samples: Vec<S>,
}

impl<S: Lerp + Clone> HitboxSnapshot<S> {
    /// Blends towards `other`. Activity is the union of both ends, so a blend
    /// across a spawn frame still yields a testable (if imprecise) pose.
    pub fn lerp(&self, other: &Self, t: f32, proximity_only: bool) -> Self {
        let samples = if proximity_only {
            Vec::new()
        } else {
            self.samples
                .iter()
                .zip(other.samples.iter())
                .map(|(from, to)| from.lerp(to, t))
                .collect()
        };

        Self {
            frame: self.frame,
            active: self.active || other.active,
            proximity: self.proximity.lerp(&other.proximity, t),
            samples,
        }
    }

    pub fn to_owned_view(&self, proximity_only: bool) -> Self {
        Self {
            frame: self.frame,
            active: self.active,
            proximity: self.proximity.clone(),
            samples: if proximity_only {
                Vec::new()
            } else {
                self.samples.clone()
            },
        }
    }
}
