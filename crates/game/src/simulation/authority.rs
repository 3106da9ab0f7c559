/// Identifies a connected peer; the authoritative peer is not a player.
pub type PeerId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Server,
    Client(PeerId),
}

impl PeerRole {
    pub fn is_authoritative(self) -> bool {
        matches!(self, PeerRole::Server)
    }

    pub fn peer_id(self) -> Option<PeerId> {
        match self {
            PeerRole::Server => None,
            PeerRole::Client(id) => Some(id),
        }
    }
}

/// What the local peer may do with one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectAuthority {
    pub is_server: bool,
    pub is_owner: bool,
    pub client_side_prediction: bool,
}

impl ObjectAuthority {
    pub fn resolve(role: PeerRole, owner: Option<PeerId>, client_side_prediction: bool) -> Self {
        Self {
            is_server: role.is_authoritative(),
            is_owner: owner.is_some() && owner == role.peer_id(),
            client_side_prediction,
        }
    }

    /// Owned objects with prediction trust their own simulation, and the
    /// server never interpolates.
    pub fn should_interpolate(&self) -> bool {
        !self.is_server && !self.predicts()
    }

    pub fn predicts(&self) -> bool {
        !self.is_server && self.is_owner && self.client_side_prediction
    }

    pub fn simulates(&self) -> bool {
        self.is_server || self.predicts()
    }
}
