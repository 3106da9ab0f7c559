use anyhow::{Context, Result};
use glam::Vec3;

use qnet::{
    HitRequest, InputCommand, LagCompensation, NavAgentObject, ObjectId, ObjectKind, Packet,
    PacketHeader, PacketType, PeerId, PlayerObject, RewindOutcome, SimulationConfig,
    SimulationContext, SimulationDriver,
};

use crate::events::{SessionEvent, ShotOutcome};

/// Frames a bot strafes in one direction before turning around.
const STRAFE_FRAMES: u32 = 90;

pub struct AuthoritativePeer {
    driver: SimulationDriver,
    bots: Vec<ObjectId>,
    sequence: u32,
    pending_events: Vec<SessionEvent>,
}

impl AuthoritativePeer {
    pub fn new(config: &SimulationConfig, bots: usize, agents: usize) -> Result<Self> {
        let mut driver = SimulationDriver::new(SimulationContext::server(config.clone()));
        let mut pending_events = Vec::new();

        let mut bot_ids = Vec::with_capacity(bots);
        for i in 0..bots {
            let spawn = Vec3::new(0.0, 0.0, 4.0 * i as f32);
            let bot = PlayerObject::new(None, true, config)
                .context("failed to register bot hitboxes")?
                .with_position(spawn);
            let id = driver.spawn(Box::new(bot));
            pending_events.push(SessionEvent::ObjectSpawned {
                object: id,
                kind: ObjectKind::Player,
            });
            bot_ids.push(id);
        }

        for i in 0..agents {
            let z = -6.0 - 3.0 * i as f32;
            let route = vec![
                Vec3::new(-8.0, 0.0, z),
                Vec3::new(8.0, 0.0, z),
                Vec3::new(8.0, 0.0, z - 2.0),
                Vec3::new(-8.0, 0.0, z - 2.0),
            ];
            let agent = NavAgentObject::new(config).with_route(route, 3.0);
            let id = driver.spawn(Box::new(agent));
            pending_events.push(SessionEvent::ObjectSpawned {
                object: id,
                kind: ObjectKind::NavAgent,
            });
        }

        Ok(Self {
            driver,
            bots: bot_ids,
            sequence: 0,
            pending_events,
        })
    }

    pub fn driver(&self) -> &SimulationDriver {
        &self.driver
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = SessionEvent> + '_ {
        self.pending_events.drain(..)
    }

    fn next_header(&mut self) -> PacketHeader {
        self.sequence = self.sequence.wrapping_add(1);
        PacketHeader::new(self.sequence)
    }

    fn drive_bots(&mut self) {
        let frame = self.driver.context().frame() + 1;
        let direction = if (frame / STRAFE_FRAMES) % 2 == 0 { 1.0 } else { -1.0 };

        for (i, bot) in self.bots.iter().enumerate() {
            let mut command = InputCommand::new(frame, frame);
            let sign = if i % 2 == 0 { direction } else { -direction };
            command.encode_move_direction([sign, 0.0, 0.0]);
            self.driver.queue_command(*bot, command);
        }
    }

    /// Runs the passes due after `delta` seconds and returns encoded snapshot packets.
    pub fn tick(&mut self, delta: f64) -> Result<Vec<Vec<u8>>> {
        self.drive_bots();
        self.driver.tick(delta);

        let mut packets = Vec::new();
        for batch in self.driver.take_outbox() {
            let packet = Packet::new(self.next_header(), PacketType::SnapshotBatch(batch));
            packets.push(packet.serialize().context("failed to encode snapshot batch")?);
        }
        Ok(packets)
    }

    /// Handles a packet that arrived from `sender`.
    pub fn handle_packet(&mut self, sender: PeerId, data: &[u8]) {
        let packet = match Packet::deserialize(data) {
            Ok(packet) => packet,
            Err(e) => {
                self.pending_events.push(SessionEvent::Error {
                    message: format!("dropping packet: {}", e),
                });
                return;
            }
        };

        match packet.payload {
            PacketType::HitRequest(request) => {
                let outcome = self.resolve_hit(&request);
                self.pending_events.push(SessionEvent::ShotResolved {
                    target: ObjectId(request.target),
                    view_frame: request.view_frame,
                    outcome,
                });
            }
            PacketType::Input { object_id, commands } => {
                let object = ObjectId(object_id);
                let owner = self.driver.object(object).and_then(|o| o.owner());
                if owner != Some(sender) {
                    log::warn!(
                        "peer {} sent input for object {} it does not own",
                        sender,
                        object_id
                    );
                    return;
                }
                for command in commands {
                    self.driver.queue_command(object, command);
                }
            }
            PacketType::SnapshotBatch(_) => {
                log::warn!("authoritative peer received a snapshot batch");
            }
        }
    }

    fn resolve_hit(&mut self, request: &HitRequest) -> ShotOutcome {
        let Some(body) = self.driver.hitbox_body_mut(ObjectId(request.target)) else {
            return ShotOutcome::UnknownTarget;
        };

        let outcome = LagCompensation::raycast(
            body,
            request.view_frame,
            Vec3::from_array(request.origin),
            Vec3::from_array(request.direction),
            request.max_distance,
        );

        match outcome {
            Ok(RewindOutcome::Tested(hits)) => {
                let nearest = hits
                    .iter()
                    .min_by(|a, b| a.result.total_cmp(&b.result));
                match nearest {
                    Some(hit) => {
                        let multiplier = body
                            .hitbox(hit.hitbox)
                            .map_or(1.0, |hitbox| hitbox.damage_multiplier);
                        ShotOutcome::Hit {
                            hitbox: hit.hitbox,
                            distance: hit.result,
                            damage: 25.0 * multiplier,
                        }
                    }
                    None => ShotOutcome::Miss,
                }
            }
            Ok(RewindOutcome::ProximityMiss) => ShotOutcome::ProximityMiss,
            Ok(RewindOutcome::Inactive) => ShotOutcome::Inactive,
            Ok(RewindOutcome::Unavailable) => ShotOutcome::Unavailable,
            Err(e) => {
                log::warn!("object {} cannot be rewound: {}", request.target, e);
                ShotOutcome::UnknownTarget
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(payload: PacketType) -> Vec<u8> {
        Packet::new(PacketHeader::new(1), payload).serialize().unwrap()
    }

    fn running_peer() -> AuthoritativePeer {
        let mut peer = AuthoritativePeer::new(&SimulationConfig::default(), 1, 0).unwrap();
        for _ in 0..30 {
            peer.tick(1.0 / 60.0).unwrap();
        }
        peer.drain_events().for_each(drop);
        peer
    }

    #[test]
    fn hostile_view_frames_resolve_as_unavailable() {
        let mut peer = running_peer();
        let target = peer.bots[0];

        for view_frame in [f64::NAN, f64::INFINITY, -1.0e9] {
            let request = HitRequest {
                shooter: 1,
                target: target.id(),
                origin: [0.0, 1.1, -10.0],
                direction: [0.0, 0.0, 1.0],
                max_distance: 50.0,
                view_frame,
            };
            peer.handle_packet(1, &encode(PacketType::HitRequest(request)));

            let events: Vec<_> = peer.drain_events().collect();
            assert!(
                matches!(
                    events.as_slice(),
                    [SessionEvent::ShotResolved {
                        outcome: ShotOutcome::Unavailable,
                        ..
                    }]
                ),
                "view frame {view_frame}: {events:?}"
            );
        }
    }

    #[test]
    fn input_for_unowned_objects_is_dropped() {
        let mut peer = running_peer();
        let bot = peer.bots[0];
        let queued = peer.driver().pending_commands();

        let payload = PacketType::Input {
            object_id: bot.id(),
            commands: vec![InputCommand::new(500, 1)],
        };
        peer.handle_packet(1, &encode(payload));

        assert_eq!(peer.driver().pending_commands(), queued);
    }

    #[test]
    fn input_from_the_owner_is_queued() {
        let config = SimulationConfig::default();
        let mut peer = running_peer();
        let player = PlayerObject::new(Some(1), true, &config).unwrap();
        let id = peer.driver.spawn(Box::new(player));
        let queued = peer.driver().pending_commands();

        let payload = PacketType::Input {
            object_id: id.id(),
            commands: vec![InputCommand::new(500, 1), InputCommand::new(501, 2)],
        };
        peer.handle_packet(1, &encode(payload));

        assert_eq!(peer.driver().pending_commands(), queued + 2);
    }
}
