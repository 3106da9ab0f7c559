use std::collections::VecDeque;

use crate::net::InputCommand;
use crate::time::Frame;

use super::object::ObjectId;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommand {
    pub object: ObjectId,
    pub command: InputCommand,
}

/// Bounded queue of input commands awaiting their frame.
#[derive(Debug, Clone)]
pub struct CommandBuffer {
    commands: VecDeque<PendingCommand>,
    max_size: usize,
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new(256)
    }
}

impl CommandBuffer {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            commands: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    pub fn push(&mut self, object: ObjectId, command: InputCommand) {
        if self.commands.len() >= self.max_size {
            self.commands.pop_front();
        }

        let at = self
            .commands
            .iter()
            .rposition(|pending| pending.command.frame <= command.frame)
            .map_or(0, |i| i + 1);
        self.commands.insert(at, PendingCommand { object, command });
    }

    /// Removes every command due at or before `frame`, oldest first.
    pub fn drain_for_frame(&mut self, frame: Frame) -> Vec<PendingCommand> {
        let due = self
            .commands
            .iter()
            .take_while(|pending| pending.command.frame <= frame)
            .count();
        self.commands.drain(..due).collect()
    }

    pub fn remove_object(&mut self, object: ObjectId) {
        self.commands.retain(|pending| pending.object != object);
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_buffer_ordering() {
        let mut buffer = CommandBuffer::new(64);

        buffer.push(ObjectId(1), InputCommand::new(5, 1));
        buffer.push(ObjectId(1), InputCommand::new(3, 2));
        buffer.push(ObjectId(1), InputCommand::new(10, 3));

        let drained = buffer.drain_for_frame(5);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].command.frame, 3);
        assert_eq!(drained[1].command.frame, 5);

        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut buffer = CommandBuffer::new(2);
        for frame in 0..4 {
            buffer.push(ObjectId(1), InputCommand::new(frame, frame));
        }

        let drained = buffer.drain_for_frame(10);
        let frames: Vec<Frame> = drained.iter().map(|p| p.command.frame).collect();
        assert_eq!(frames, vec![2, 3]);
    }

    #[test]
    fn despawned_objects_lose_their_commands() {
        let mut buffer = CommandBuffer::new(8);
        buffer.push(ObjectId(1), InputCommand::new(1, 1));
        buffer.push(ObjectId(2), InputCommand::new(1, 1));
        buffer.remove_object(ObjectId(1));

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.drain_for_frame(1)[0].object, ObjectId(2));
    }
}
