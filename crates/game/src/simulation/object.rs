use glam::Vec3;

use crate::config::SimulationConfig;
use crate::net::{InputCommand, MessageWriter};
use crate::snapshot::{ColliderHitbox, HitboxBody};
use crate::time::Frame;

use super::authority::{ObjectAuthority, PeerId, PeerRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId(pub u32);

impl ObjectId {
    pub fn id(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectKind {
    Player = 0,
    NavAgent = 1,
}

impl From<ObjectKind> for u8 {
    fn from(kind: ObjectKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for ObjectKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0 => Ok(ObjectKind::Player),
            1 => Ok(ObjectKind::NavAgent),
            other => Err(other),
        }
    }
}

/// Interpolated view of a remote object, as displayed at `frame`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteView {
    pub frame: f64,
    pub position: Vec3,
}

/// Frame data shared by every object during one simulation pass.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub frame: Frame,
    pub server_frame: Frame,
    pub local_time: f64,
    pub delta_time: f32,
    pub role: PeerRole,
    pub config: &'a SimulationConfig,
}

impl FrameContext<'_> {
    pub fn is_authoritative(&self) -> bool {
        self.role.is_authoritative()
    }

    pub fn authority(&self, owner: Option<PeerId>, client_side_prediction: bool) -> ObjectAuthority {
        ObjectAuthority::resolve(self.role, owner, client_side_prediction)
    }
}

/// Per-kind hooks run by the driver, one stage at a time across all objects.
pub trait SimulatedObject {
    fn kind(&self) -> ObjectKind;

    fn is_active(&self) -> bool;

    fn owner(&self) -> Option<PeerId> {
        None
    }

    fn position(&self) -> Vec3;

    fn begin_simulate(&mut self, _ctx: &FrameContext) {}

    fn simulate(&mut self, _ctx: &FrameContext) {}

    fn interpolate_frame(&mut self, _ctx: &FrameContext) {}

    fn simulate_frame(&mut self, _ctx: &FrameContext, _commands: &[InputCommand]) {}

    fn finish_simulate(&mut self, _ctx: &FrameContext) {}

    fn write_snapshot(&self, writer: &mut MessageWriter);

    /// Buffers a received snapshot; it takes effect on a later pass.
    fn receive_snapshot(&mut self, payload: &[u8], local_time: f64, frame: Frame, role: PeerRole);

    fn remote_view(&self) -> Option<RemoteView> {
        None
    }

    fn hitbox_body_mut(&mut self) -> Option<&mut HitboxBody<ColliderHitbox>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_values() {
        assert_eq!(u8::from(ObjectKind::NavAgent), 1);
        assert_eq!(ObjectKind::try_from(0), Ok(ObjectKind::Player));
        assert_eq!(ObjectKind::try_from(5), Err(5));
    }
}
