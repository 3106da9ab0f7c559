#![allow(dead_code)]

use qnet::{
    HitRequest, InputCommand, LinkConditions, LinkSimulator, ObjectId, Packet, PacketHeader,
    PacketType, PlayerObject, SimulationConfig, SimulationContext, SimulationDriver, spawn_replica,
};

pub const DT: f64 = 1.0 / 60.0;
pub const CLIENT_PEER: u32 = 1;

/// An authoritative peer and one remote client joined by two simulated links.
pub struct Loopback {
    pub config: SimulationConfig,
    pub server: SimulationDriver,
    pub client: SimulationDriver,
    pub downlink: LinkSimulator,
    pub uplink: LinkSimulator,
    pub now: f64,
    pub hit_requests: Vec<HitRequest>,
    sequence: u32,
}

impl Loopback {
    pub fn new(config: SimulationConfig, down: LinkConditions, up: LinkConditions) -> Self {
        Self {
            server: SimulationDriver::new(SimulationContext::server(config.clone())),
            client: SimulationDriver::new(SimulationContext::client(config.clone(), CLIENT_PEER)),
            downlink: LinkSimulator::new(down, 11),
            uplink: LinkSimulator::new(up, 12),
            now: 0.0,
            hit_requests: Vec::new(),
            sequence: 0,
            config,
        }
    }

    pub fn spawn_bot(&mut self) -> ObjectId {
        let bot = PlayerObject::new(None, true, &self.config).unwrap();
        self.server.spawn(Box::new(bot))
    }

    /// Queues a command for the bot on the server's next frame.
    pub fn drive(&mut self, bot: ObjectId, move_direction: [f32; 3]) {
        let frame = self.server.context().frame() + 1;
        let mut command = InputCommand::new(frame, frame);
        command.encode_move_direction(move_direction);
        self.server.queue_command(bot, command);
    }

    fn next_header(&mut self) -> PacketHeader {
        self.sequence += 1;
        PacketHeader::new(self.sequence)
    }

    pub fn step(&mut self) {
        self.now += DT;
        self.server.tick(DT);

        for batch in self.server.take_outbox() {
            let packet = Packet::new(self.next_header(), PacketType::SnapshotBatch(batch));
            self.downlink.send(self.now, packet.serialize().unwrap());
        }

        for data in self.downlink.receive(self.now) {
            let packet = Packet::deserialize(&data).unwrap();
            if let PacketType::SnapshotBatch(batch) = packet.payload {
                let config = &self.config;
                self.client
                    .receive_batch(&batch, |kind, owner| spawn_replica(kind, owner, config));
            }
        }

        for data in self.uplink.receive(self.now) {
            let packet = Packet::deserialize(&data).unwrap();
            if let PacketType::HitRequest(request) = packet.payload {
                self.hit_requests.push(request);
            }
        }

        self.client.tick(DT);
    }

    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    pub fn send_hit(&mut self, request: HitRequest) {
        let packet = Packet::new(self.next_header(), PacketType::HitRequest(request));
        self.uplink.send(self.now, packet.serialize().unwrap());
    }
}
