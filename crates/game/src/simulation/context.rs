use crate::config::SimulationConfig;
use crate::time::{Frame, SimulationClock, TickRate};

use super::authority::{ObjectAuthority, PeerId, PeerRole};

/// Per-peer simulation state handed to every tick.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    config: SimulationConfig,
    clock: SimulationClock,
    role: PeerRole,
}

impl SimulationContext {
    pub fn new(config: SimulationConfig, role: PeerRole) -> Self {
        let config = config.validated();
        let clock = SimulationClock::from_config(&config, role.is_authoritative());
        Self {
            config,
            clock,
            role,
        }
    }

    pub fn server(config: SimulationConfig) -> Self {
        Self::new(config, PeerRole::Server)
    }

    pub fn client(config: SimulationConfig, peer: PeerId) -> Self {
        Self::new(config, PeerRole::Client(peer))
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SimulationClock {
        &mut self.clock
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn is_authoritative(&self) -> bool {
        self.role.is_authoritative()
    }

    pub fn tick_rate(&self) -> TickRate {
        self.clock.tick_rate()
    }

    pub fn frame(&self) -> Frame {
        self.clock.frame()
    }

    pub fn server_frame(&self) -> Frame {
        self.clock.server_frame()
    }

    pub fn local_time(&self) -> f64 {
        self.clock.local_time()
    }

    pub fn authority(&self, owner: Option<PeerId>, client_side_prediction: bool) -> ObjectAuthority {
        ObjectAuthority::resolve(self.role, owner, client_side_prediction)
    }
}
