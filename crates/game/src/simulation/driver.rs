use std::collections::BTreeMap;

use crate::net::{InputCommand, MessageWriter, ObjectSnapshot, SnapshotBatch};
use crate::snapshot::{ColliderHitbox, HitboxBody};
use crate::time::FrameStep;

use super::authority::PeerId;
use super::command::CommandBuffer;
use super::context::SimulationContext;
use super::object::{FrameContext, ObjectId, ObjectKind, SimulatedObject};

/// Runs every simulated object through the per-frame stages.
///
/// Each stage completes for all active objects before the next stage starts,
/// so no object observes another's state from later in the same frame.
/// Objects are visited in id order.
pub struct SimulationDriver {
    context: SimulationContext,
    objects: BTreeMap<ObjectId, Box<dyn SimulatedObject>>,
    commands: CommandBuffer,
    next_object_id: u32,
    frames_since_broadcast: u32,
    outbox: Vec<SnapshotBatch>,
}

impl SimulationDriver {
    pub fn new(context: SimulationContext) -> Self {
        Self {
            context,
            objects: BTreeMap::new(),
            commands: CommandBuffer::default(),
            next_object_id: 1,
            frames_since_broadcast: 0,
            outbox: Vec::new(),
        }
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.context
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn spawn(&mut self, object: Box<dyn SimulatedObject>) -> ObjectId {
        let id = ObjectId(self.next_object_id);
        self.insert(id, object);
        id
    }

    pub fn insert(&mut self, id: ObjectId, object: Box<dyn SimulatedObject>) {
        log::debug!("spawned {:?} object {}", object.kind(), id.0);
        self.next_object_id = self.next_object_id.max(id.0.wrapping_add(1));
        self.objects.insert(id, object);
    }

    pub fn despawn(&mut self, id: ObjectId) -> Option<Box<dyn SimulatedObject>> {
        let object = self.objects.remove(&id)?;
        self.commands.remove_object(id);
        log::debug!("despawned {:?} object {}", object.kind(), id.0);
        Some(object)
    }

    pub fn object(&self, id: ObjectId) -> Option<&(dyn SimulatedObject + 'static)> {
        self.objects.get(&id).map(|object| object.as_ref())
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut (dyn SimulatedObject + 'static)> {
        self.objects.get_mut(&id).map(|object| object.as_mut())
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &(dyn SimulatedObject + 'static))> + '_ {
        self.objects.iter().map(|(id, object)| (*id, object.as_ref()))
    }

    pub fn hitbox_body_mut(&mut self, id: ObjectId) -> Option<&mut HitboxBody<ColliderHitbox>> {
        self.objects.get_mut(&id)?.hitbox_body_mut()
    }

    pub fn queue_command(&mut self, object: ObjectId, command: InputCommand) {
        self.commands.push(object, command);
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Advances local time by `delta` seconds and runs every pass that became
    /// due. Returns the number of passes run.
    pub fn tick(&mut self, delta: f64) -> u32 {
        self.context.clock_mut().advance(delta);

        let mut passes = 0;
        while let Some(step) = self.context.clock_mut().next_pass() {
            self.run_pass(step);
            passes += 1;
        }
        passes
    }

    pub fn step(&mut self) -> FrameStep {
        let step = self.context.clock_mut().step();
        self.run_pass(step);
        step
    }

    fn run_pass(&mut self, step: FrameStep) {
        let mut commands: BTreeMap<ObjectId, Vec<InputCommand>> = BTreeMap::new();
        for pending in self.commands.drain_for_frame(step.frame) {
            commands.entry(pending.object).or_default().push(pending.command);
        }

        let ctx = FrameContext {
            frame: step.frame,
            server_frame: self.context.server_frame(),
            local_time: self.context.local_time(),
            delta_time: self.context.tick_rate().tick_step() as f32,
            role: self.context.role(),
            config: self.context.config(),
        };

        for object in self.objects.values_mut().filter(|o| o.is_active()) {
            object.begin_simulate(&ctx);
        }
        for object in self.objects.values_mut().filter(|o| o.is_active()) {
            object.simulate(&ctx);
        }
        for object in self.objects.values_mut().filter(|o| o.is_active()) {
            object.interpolate_frame(&ctx);
        }
        for (id, object) in self.objects.iter_mut().filter(|(_, o)| o.is_active()) {
            let queued = commands.get(id).map(Vec::as_slice).unwrap_or(&[]);
            object.simulate_frame(&ctx, queued);
        }
        for object in self.objects.values_mut().filter(|o| o.is_active()) {
            object.finish_simulate(&ctx);
        }

        if !self.context.is_authoritative() {
            return;
        }

        self.frames_since_broadcast += 1;
        if self.frames_since_broadcast >= self.context.config().send_rate.max(1) {
            self.frames_since_broadcast = 0;
            let batch = self.snapshot_batch(step.frame);
            self.outbox.push(batch);
        }
    }

    fn snapshot_batch(&self, server_frame: u32) -> SnapshotBatch {
        let mut batch = SnapshotBatch::new(server_frame);
        for (id, object) in self.objects.iter().filter(|(_, o)| o.is_active()) {
            let mut writer = MessageWriter::new();
            object.write_snapshot(&mut writer);
            batch.objects.push(ObjectSnapshot {
                object_id: id.0,
                kind: object.kind().into(),
                owner: object.owner(),
                payload: writer.finish().to_vec(),
            });
        }
        batch
    }

    pub fn take_outbox(&mut self) -> Vec<SnapshotBatch> {
        std::mem::take(&mut self.outbox)
    }

    /// Buffers a batch from the authoritative peer. Unknown objects are
    /// created through `spawn`; the states apply on later passes.
    pub fn receive_batch(
        &mut self,
        batch: &SnapshotBatch,
        mut spawn: impl FnMut(ObjectKind, Option<PeerId>) -> Option<Box<dyn SimulatedObject>>,
    ) {
        if self.context.is_authoritative() {
            log::warn!(
                "authoritative peer ignoring snapshot batch for frame {}",
                batch.server_frame
            );
            return;
        }

        self.context.clock_mut().receive_server_frame(batch.server_frame);
        let local_time = self.context.local_time();
        let role = self.context.role();

        for snapshot in &batch.objects {
            let id = ObjectId(snapshot.object_id);
            let kind = match ObjectKind::try_from(snapshot.kind) {
                Ok(kind) => kind,
                Err(value) => {
                    log::warn!("object {} has unknown kind {}", id.0, value);
                    continue;
                }
            };

            if !self.objects.contains_key(&id) {
                match spawn(kind, snapshot.owner) {
                    Some(object) => self.insert(id, object),
                    None => continue,
                }
            }

            let Some(object) = self.objects.get_mut(&id) else {
                continue;
            };
            if object.kind() != kind {
                log::warn!(
                    "object {} is a {:?} but snapshot is for a {:?}",
                    id.0,
                    object.kind(),
                    kind
                );
                continue;
            }
            object.receive_snapshot(&snapshot.payload, local_time, batch.server_frame, role);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::config::SimulationConfig;
    use crate::simulation::PeerRole;
    use crate::time::Frame;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: &'static str,
        active: bool,
        log: Log,
    }

    impl Probe {
        fn boxed(name: &'static str, active: bool, log: &Log) -> Box<dyn SimulatedObject> {
            Box::new(Self {
                name,
                active,
                log: Rc::clone(log),
            })
        }

        fn record(&self, stage: &str) {
            self.log.borrow_mut().push(format!("{} {}", stage, self.name));
        }
    }

    impl SimulatedObject for Probe {
        fn kind(&self) -> ObjectKind {
            ObjectKind::Player
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn position(&self) -> Vec3 {
            Vec3::ZERO
        }

        fn begin_simulate(&mut self, _ctx: &FrameContext) {
            self.record("begin");
        }

        fn simulate(&mut self, _ctx: &FrameContext) {
            self.record("simulate");
        }

        fn interpolate_frame(&mut self, _ctx: &FrameContext) {
            self.record("interpolate");
        }

        fn simulate_frame(&mut self, _ctx: &FrameContext, commands: &[InputCommand]) {
            self.record(&format!("commands({})", commands.len()));
        }

        fn finish_simulate(&mut self, _ctx: &FrameContext) {
            self.record("finish");
        }

        fn write_snapshot(&self, writer: &mut MessageWriter) {
            writer.write_u32(7);
        }

        fn receive_snapshot(&mut self, payload: &[u8], _local_time: f64, frame: Frame, _role: PeerRole) {
            self.record(&format!("receive {} {}", frame, payload.len()));
        }
    }

    fn server() -> SimulationDriver {
        SimulationDriver::new(SimulationContext::server(SimulationConfig::default()))
    }

    #[test]
    fn stages_run_as_barriers_in_id_order() {
        let log = Log::default();
        let mut driver = server();
        driver.spawn(Probe::boxed("a", true, &log));
        driver.spawn(Probe::boxed("b", true, &log));
        driver.step();

        let expected = [
            "begin a",
            "begin b",
            "simulate a",
            "simulate b",
            "interpolate a",
            "interpolate b",
            "commands(0) a",
            "commands(0) b",
            "finish a",
            "finish b",
        ];
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn inactive_objects_are_skipped_everywhere() {
        let log = Log::default();
        let mut driver = server();
        driver.spawn(Probe::boxed("idle", false, &log));
        driver.step();

        assert!(log.borrow().is_empty());
        let batches = driver.take_outbox();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].objects.is_empty());
    }

    #[test]
    fn commands_reach_their_object() {
        let log = Log::default();
        let mut driver = server();
        let a = driver.spawn(Probe::boxed("a", true, &log));
        driver.spawn(Probe::boxed("b", true, &log));

        driver.queue_command(a, InputCommand::new(1, 1));
        driver.queue_command(a, InputCommand::new(1, 2));
        driver.queue_command(a, InputCommand::new(5, 3));
        driver.step();

        let log = log.borrow();
        assert!(log.contains(&"commands(2) a".to_string()));
        assert!(log.contains(&"commands(0) b".to_string()));
        assert_eq!(driver.pending_commands(), 1);
    }

    #[test]
    fn broadcast_follows_send_rate() {
        let config = SimulationConfig {
            send_rate: 3,
            ..Default::default()
        };
        let log = Log::default();
        let mut driver = SimulationDriver::new(SimulationContext::server(config));
        driver.spawn(Probe::boxed("a", true, &log));

        for _ in 0..7 {
            driver.step();
        }

        let batches = driver.take_outbox();
        let frames: Vec<u32> = batches.iter().map(|b| b.server_frame).collect();
        assert_eq!(frames, vec![3, 6]);
        assert_eq!(batches[0].objects[0].payload, 7u32.to_le_bytes().to_vec());
        assert!(driver.take_outbox().is_empty());
    }

    #[test]
    fn clients_never_broadcast_and_replicate_batches() {
        let log = Log::default();
        let mut client =
            SimulationDriver::new(SimulationContext::client(SimulationConfig::default(), 1));
        client.step();
        assert!(client.take_outbox().is_empty());

        let mut batch = SnapshotBatch::new(40);
        batch.objects.push(ObjectSnapshot {
            object_id: 9,
            kind: ObjectKind::Player.into(),
            owner: None,
            payload: vec![0; 4],
        });
        batch.objects.push(ObjectSnapshot {
            object_id: 10,
            kind: 200,
            owner: None,
            payload: Vec::new(),
        });

        client.receive_batch(&batch, |_, _| Some(Probe::boxed("replica", true, &log)));
        assert_eq!(client.len(), 1);
        assert!(client.object(ObjectId(9)).is_some());
        assert_eq!(*log.borrow(), ["receive 40 4"]);

        client.step();
        assert_eq!(client.context().frame(), 40);
    }

    #[test]
    fn tick_runs_due_passes() {
        let mut driver = server();
        assert_eq!(driver.tick(1.0 / 120.0), 0);
        assert_eq!(driver.tick(1.0 / 30.0), 2);
        assert_eq!(driver.context().frame(), 2);
    }

    #[test]
    fn despawn_drops_object_and_commands() {
        let log = Log::default();
        let mut driver = server();
        let id = driver.spawn(Probe::boxed("a", true, &log));
        driver.queue_command(id, InputCommand::new(10, 1));

        assert!(driver.despawn(id).is_some());
        assert!(driver.is_empty());
        assert_eq!(driver.pending_commands(), 0);
        assert!(driver.despawn(id).is_none());
    }
}
