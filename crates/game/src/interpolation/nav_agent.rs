use glam::{Quat, Vec3};

use crate::error::MessageError;
use crate::lerp::Lerp;
use crate::net::{MessageReader, MessageWriter};

use super::state::NetworkSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AgentState {
    #[default]
    Idle = 0,
    Moving = 1,
    Arrived = 2,
}

impl From<AgentState> for u8 {
    fn from(state: AgentState) -> u8 {
        state as u8
    }
}

impl TryFrom<u8> for AgentState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0 => Ok(AgentState::Idle),
            1 => Ok(AgentState::Moving),
            2 => Ok(AgentState::Arrived),
            other => Err(other),
        }
    }
}

/// Replicated state of a server-driven navigation agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavAgentSnapshot {
    pub position: Vec3,
    pub rotation: Quat,
    pub destination: Vec3,
    pub speed: f32,
    pub state: AgentState,
}

impl Default for NavAgentSnapshot {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            destination: Vec3::ZERO,
            speed: 0.0,
            state: AgentState::Idle,
        }
    }
}

impl Lerp for NavAgentSnapshot {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        // Discrete fields switch over at the midpoint.
        let discrete = if t < 0.5 { self } else { other };
        Self {
            position: Lerp::lerp(&self.position, &other.position, t),
            rotation: Lerp::lerp(&self.rotation, &other.rotation, t),
            destination: discrete.destination,
            speed: Lerp::lerp(&self.speed, &other.speed, t),
            state: discrete.state,
        }
    }
}

impl NetworkSnapshot for NavAgentSnapshot {
    fn write(&self, writer: &mut MessageWriter) {
        writer.write_vec3(self.position);
        writer.write_quat(self.rotation);
        writer.write_message(|path| {
            path.write_vec3(self.destination);
            path.write_f32(self.speed);
            path.write_enum(self.state);
        });
    }

    fn read(reader: &mut MessageReader) -> Result<Self, MessageError> {
        let position = reader.read_vec3()?;
        let rotation = reader.read_quat()?;
        let mut path = reader.read_message()?;
        Ok(Self {
            position,
            rotation,
            destination: path.read_vec3()?,
            speed: path.read_f32()?,
            state: path.read_enum("AgentState")?,
        })
    }
}
