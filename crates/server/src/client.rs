use anyhow::{Context, Result};
use glam::Vec3;

use qnet::{
    HitRequest, ObjectId, ObjectKind, Packet, PacketHeader, PacketType, PeerId, SimulationConfig,
    SimulationContext, SimulationDriver, sequence_greater_than, spawn_replica,
};

use crate::events::SessionEvent;

const AIM_HEIGHT: f32 = 1.1;
const AIM_STANDOFF: f32 = 12.0;

/// A remote player that only sees interpolated replicas and shoots at them.
pub struct RemotePeer {
    peer: PeerId,
    config: SimulationConfig,
    driver: SimulationDriver,
    shot_interval: f64,
    next_shot: f64,
    next_target: usize,
    sequence: u32,
    last_received: Option<u32>,
    out_of_order: u64,
    pending_events: Vec<SessionEvent>,
}

impl RemotePeer {
    pub fn new(config: &SimulationConfig, peer: PeerId, shot_interval: f64) -> Self {
        Self {
            peer,
            config: config.clone(),
            driver: SimulationDriver::new(SimulationContext::client(config.clone(), peer)),
            shot_interval: shot_interval.max(0.0),
            // Give the interpolation buffer a second to fill.
            next_shot: 1.0,
            next_target: 0,
            sequence: 0,
            last_received: None,
            out_of_order: 0,
            pending_events: Vec::new(),
        }
    }

    pub fn driver(&self) -> &SimulationDriver {
        &self.driver
    }

    pub fn out_of_order(&self) -> u64 {
        self.out_of_order
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = SessionEvent> + '_ {
        self.pending_events.drain(..)
    }

    pub fn handle_packet(&mut self, data: &[u8]) {
        let packet = match Packet::deserialize(data) {
            Ok(packet) => packet,
            Err(e) => {
                self.pending_events.push(SessionEvent::Error {
                    message: format!("dropping packet: {}", e),
                });
                return;
            }
        };

        let sequence = packet.header.sequence;
        match self.last_received {
            Some(last) if !sequence_greater_than(sequence, last) => self.out_of_order += 1,
            _ => self.last_received = Some(sequence),
        }

        let PacketType::SnapshotBatch(batch) = packet.payload else {
            log::warn!("client {} received an unexpected payload", self.peer);
            return;
        };

        let fresh: Vec<_> = batch
            .objects
            .iter()
            .map(|snapshot| ObjectId(snapshot.object_id))
            .filter(|id| self.driver.object(*id).is_none())
            .collect();

        let config = &self.config;
        self.driver
            .receive_batch(&batch, |kind, owner| spawn_replica(kind, owner, config));

        for object in fresh {
            if let Some(replica) = self.driver.object(object) {
                let kind = replica.kind();
                self.pending_events
                    .push(SessionEvent::ObjectSpawned { object, kind });
            }
        }
    }

    /// Advances the client and returns any hit requests it fired.
    pub fn tick(&mut self, delta: f64) -> Result<Vec<Vec<u8>>> {
        self.driver.tick(delta);

        let now = self.driver.context().local_time();
        if self.shot_interval <= 0.0 || now < self.next_shot {
            return Ok(Vec::new());
        }
        self.next_shot = now + self.shot_interval;

        let Some(request) = self.aim() else {
            return Ok(Vec::new());
        };
        self.pending_events.push(SessionEvent::ShotFired {
            target: ObjectId(request.target),
            view_frame: request.view_frame,
        });

        self.sequence = self.sequence.wrapping_add(1);
        let packet = Packet::new(
            PacketHeader::new(self.sequence),
            PacketType::HitRequest(request),
        );
        Ok(vec![packet.serialize().context("failed to encode hit request")?])
    }

    /// Picks the next player replica in turn and aims at its displayed torso.
    fn aim(&mut self) -> Option<HitRequest> {
        let targets: Vec<_> = self
            .driver
            .objects()
            .filter(|(_, object)| object.kind() == ObjectKind::Player)
            .filter_map(|(id, object)| object.remote_view().map(|view| (id, view)))
            .collect();
        if targets.is_empty() {
            return None;
        }

        let (target, view) = targets[self.next_target % targets.len()];
        self.next_target = self.next_target.wrapping_add(1);

        let origin = view.position + Vec3::new(0.0, AIM_HEIGHT, -AIM_STANDOFF);
        Some(HitRequest {
            shooter: self.peer,
            target: target.id(),
            origin: origin.to_array(),
            direction: Vec3::Z.to_array(),
            max_distance: AIM_STANDOFF * 2.0,
            view_frame: view.frame,
        })
    }
}
