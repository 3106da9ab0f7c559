mod nav_agent;
mod player;

pub use nav_agent::{NavAgentObject, NavAgentView};
pub use player::{MovementSettings, PlayerObject};

use crate::config::SimulationConfig;
use crate::simulation::{ObjectKind, PeerId, SimulatedObject};

/// Builds the client-side replica for an object first seen in a snapshot batch.
pub fn spawn_replica(
    kind: ObjectKind,
    owner: Option<PeerId>,
    config: &SimulationConfig,
) -> Option<Box<dyn SimulatedObject>> {
    match kind {
        ObjectKind::Player => match PlayerObject::new(owner, false, config) {
            Ok(player) => Some(Box::new(player)),
            Err(e) => {
                log::warn!("cannot replicate player: {}", e);
                None
            }
        },
        ObjectKind::NavAgent => Some(Box::new(NavAgentObject::new(config))),
    }
}
