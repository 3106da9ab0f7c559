mod link;
mod message;
mod protocol;

pub use link::{LinkConditions, LinkSimulator, LinkStats};
pub use message::{MessageReader, MessageWriter};
pub use protocol::{
    HitRequest, InputCommand, InputFlags, MAX_PACKET_SIZE, ObjectSnapshot, PROTOCOL_MAGIC,
    PROTOCOL_VERSION, Packet, PacketError, PacketHeader, PacketType, SnapshotBatch,
    sequence_greater_than,
};
