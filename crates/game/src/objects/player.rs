use glam::{Quat, Vec3};

use crate::config::SimulationConfig;
use crate::error::HitboxError;
use crate::interpolation::{NetworkSnapshot, SmoothedTransform, StateInterpolator, TransformSnapshot};
use crate::net::{InputCommand, InputFlags, MessageWriter};
use crate::simulation::{
    FrameContext, ObjectAuthority, ObjectKind, PeerId, PeerRole, RemoteView, SimulatedObject,
};
use crate::snapshot::{ColliderHitbox, HitboxBody};
use crate::time::Frame;

#[derive(Debug, Clone, PartialEq)]
pub struct MovementSettings {
    pub move_speed: f32,
    pub sprint_multiplier: f32,
    pub crouch_multiplier: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            sprint_multiplier: 2.0,
            crouch_multiplier: 0.5,
        }
    }
}

/// A command-driven character with lag-compensated hitboxes.
///
/// The server simulates it from queued input and records hitbox history.
/// The owning client predicts it when prediction is enabled; every other
/// client shows an interpolated proxy.
#[derive(Debug)]
pub struct PlayerObject {
    owner: Option<PeerId>,
    active: bool,
    hittable: bool,
    client_side_prediction: bool,
    movement: MovementSettings,
    position: Vec3,
    velocity: Vec3,
    rotation: Quat,
    yaw: f32,
    pitch: f32,
    body: HitboxBody<ColliderHitbox>,
    interpolator: StateInterpolator<TransformSnapshot>,
    presentation: SmoothedTransform,
    remote_view: Option<RemoteView>,
}

impl PlayerObject {
    pub fn new(
        owner: Option<PeerId>,
        authoritative: bool,
        config: &SimulationConfig,
    ) -> Result<Self, HitboxError> {
        let mut body = HitboxBody::from_config(config);
        body.register_hitboxes(
            Self::proximity_hitbox(),
            Self::default_hitboxes(),
            authoritative,
            config.tick_rate(),
        )?;

        let mut player = Self {
            owner,
            active: true,
            hittable: true,
            client_side_prediction: true,
            movement: MovementSettings::default(),
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            yaw: 0.0,
            pitch: 0.0,
            body,
            interpolator: StateInterpolator::from_config(config),
            presentation: SmoothedTransform::new(),
            remote_view: None,
        };
        player.sync_hitboxes();
        Ok(player)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self.presentation.position = position;
        self.sync_hitboxes();
        self
    }

    pub fn with_prediction(mut self, enabled: bool) -> Self {
        self.client_side_prediction = enabled;
        self
    }

    pub fn with_movement(mut self, movement: MovementSettings) -> Self {
        self.movement = movement;
        self
    }

    pub fn proximity_hitbox() -> ColliderHitbox {
        ColliderHitbox::sphere(1.6, Vec3::new(0.0, 0.9, 0.0))
    }

    pub fn default_hitboxes() -> Vec<ColliderHitbox> {
        vec![
            ColliderHitbox::sphere(0.22, Vec3::new(0.0, 1.65, 0.0)).with_damage_multiplier(2.5),
            ColliderHitbox::cuboid(Vec3::new(0.3, 0.35, 0.18), Vec3::new(0.0, 1.1, 0.0)),
            ColliderHitbox::cuboid(Vec3::new(0.25, 0.38, 0.15), Vec3::new(0.0, 0.38, 0.0))
                .with_damage_multiplier(0.75),
        ]
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_hittable(&self) -> bool {
        self.hittable
    }

    pub fn set_hittable(&mut self, hittable: bool) {
        self.hittable = hittable;
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn view_angles(&self) -> (f32, f32) {
        (self.yaw, self.pitch)
    }

    pub fn hitbox_body(&self) -> &HitboxBody<ColliderHitbox> {
        &self.body
    }

    pub fn interpolator(&self) -> &StateInterpolator<TransformSnapshot> {
        &self.interpolator
    }

    pub fn presentation(&self) -> &SmoothedTransform {
        &self.presentation
    }

    fn authority(&self, role: PeerRole) -> ObjectAuthority {
        ObjectAuthority::resolve(role, self.owner, self.client_side_prediction)
    }

    fn apply_command(&mut self, command: &InputCommand) {
        let move_dir = command.decode_move_direction();
        let (yaw, pitch) = command.decode_view_angles();
        let flags = command.flags();

        let mut speed = self.movement.move_speed;
        if flags.contains(InputFlags::SPRINT) {
            speed *= self.movement.sprint_multiplier;
        } else if flags.contains(InputFlags::CROUCH) {
            speed *= self.movement.crouch_multiplier;
        }

        let local = Vec3::new(move_dir[0], 0.0, move_dir[2]);
        self.velocity = local_to_world_direction(local, yaw) * speed;
        self.yaw = yaw;
        self.pitch = pitch;
        self.rotation = Quat::from_rotation_y(yaw);
    }

    fn sync_hitboxes(&mut self) {
        let (position, rotation) = (self.position, self.rotation);
        if let Some(proximity) = self.body.proximity_mut() {
            proximity.follow(position, rotation);
        }
        for hitbox in self.body.hitboxes_mut() {
            hitbox.follow(position, rotation);
        }
    }
}

fn local_to_world_direction(local: Vec3, yaw: f32) -> Vec3 {
    if local.length_squared() < 0.001 {
        return Vec3::ZERO;
    }

    let normalized = local.normalize();
    let (sin_yaw, cos_yaw) = yaw.sin_cos();

    Vec3::new(
        normalized.x * cos_yaw + normalized.z * sin_yaw,
        0.0,
        -normalized.x * sin_yaw + normalized.z * cos_yaw,
    )
}

impl SimulatedObject for PlayerObject {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Player
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn owner(&self) -> Option<PeerId> {
        self.owner
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn begin_simulate(&mut self, ctx: &FrameContext) {
        if self.authority(ctx.role).simulates() {
            self.sync_hitboxes();
        }
    }

    fn simulate(&mut self, ctx: &FrameContext) {
        if self.authority(ctx.role).simulates() {
            self.position += self.velocity * ctx.delta_time;
        }
    }

    fn interpolate_frame(&mut self, ctx: &FrameContext) {
        if !self.authority(ctx.role).should_interpolate() {
            return;
        }

        let result = self
            .interpolator
            .apply(ctx.local_time, ctx.delta_time, &mut self.presentation);
        if let Some(result) = result.filter(|r| r.interpolated.valid) {
            self.remote_view = Some(RemoteView {
                frame: result.view_frame(),
                position: result.interpolated.snapshot.position,
            });
        }

        self.position = self.presentation.position;
        self.rotation = self.presentation.rotation;
    }

    fn simulate_frame(&mut self, ctx: &FrameContext, commands: &[InputCommand]) {
        if !self.authority(ctx.role).simulates() {
            return;
        }
        for command in commands {
            self.apply_command(command);
        }
    }

    fn finish_simulate(&mut self, ctx: &FrameContext) {
        self.sync_hitboxes();
        if !ctx.is_authoritative() {
            return;
        }
        if let Err(e) = self.body.perform_snapshot(ctx.frame, self.hittable) {
            log::warn!("failed to record hitboxes at frame {}: {}", ctx.frame, e);
        }
    }

    fn write_snapshot(&self, writer: &mut MessageWriter) {
        TransformSnapshot::new(self.position, self.rotation).write(writer);
    }

    fn receive_snapshot(&mut self, payload: &[u8], local_time: f64, frame: Frame, role: PeerRole) {
        if self.authority(role).should_interpolate() {
            self.interpolator.add_raw_state(payload, local_time, frame);
        }
    }

    fn remote_view(&self) -> Option<RemoteView> {
        self.remote_view
    }

    fn hitbox_body_mut(&mut self) -> Option<&mut HitboxBody<ColliderHitbox>> {
        Some(&mut self.body)
    }
}
