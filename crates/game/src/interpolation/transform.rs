use glam::{Quat, Vec3};

use crate::error::MessageError;
use crate::lerp::Lerp;
use crate::net::{MessageReader, MessageWriter};

use super::state::{InterpolationTarget, NetworkSnapshot};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSnapshot {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for TransformSnapshot {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl TransformSnapshot {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }
}

impl Lerp for TransformSnapshot {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: Lerp::lerp(&self.position, &other.position, t),
            rotation: Lerp::lerp(&self.rotation, &other.rotation, t),
        }
    }
}

impl NetworkSnapshot for TransformSnapshot {
    fn write(&self, writer: &mut MessageWriter) {
        writer.write_vec3(self.position);
        writer.write_quat(self.rotation);
    }

    fn read(reader: &mut MessageReader) -> Result<Self, MessageError> {
        Ok(Self {
            position: reader.read_vec3()?,
            rotation: reader.read_quat()?,
        })
    }
}

/// Presentation transform of a remote object.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedTransform {
    pub position: Vec3,
    pub rotation: Quat,
    resets: u32,
}

impl Default for SmoothedTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            resets: 0,
        }
    }
}

impl SmoothedTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> TransformSnapshot {
        TransformSnapshot::new(self.position, self.rotation)
    }

    pub fn reset_count(&self) -> u32 {
        self.resets
    }
}

impl InterpolationTarget<TransformSnapshot> for SmoothedTransform {
    fn final_interpolation(&mut self, snapshot: &TransformSnapshot, smoothing: f32) {
        self.position = self.position.lerp(snapshot.position, smoothing);
        self.rotation = Lerp::lerp(&self.rotation, &snapshot.rotation, smoothing);
    }

    fn state_reset(&mut self, snapshot: &TransformSnapshot, first: bool) {
        if first {
            log::debug!("transform reset to {:?}", snapshot.position);
        }
        self.position = snapshot.position;
        self.rotation = snapshot.rotation;
        self.resets += 1;
    }
}
