pub mod config;
pub mod error;
pub mod interpolation;
pub mod lerp;
pub mod net;
pub mod objects;
pub mod simulation;
pub mod snapshot;
pub mod time;

pub use config::SimulationConfig;
pub use error::{HitboxError, MessageError};
pub use interpolation::{
    AgentState, InterpolationResult, InterpolationSettings, InterpolationState,
    InterpolationTarget, NavAgentSnapshot, NetworkSnapshot, SmoothedTransform, StateInterpolator,
    TransformSnapshot,
};
pub use lerp::Lerp;
pub use net::{
    HitRequest, InputCommand, InputFlags, LinkConditions, LinkSimulator, LinkStats, MessageReader,
    MessageWriter, ObjectSnapshot, Packet, PacketError, PacketHeader, PacketType, SnapshotBatch,
    sequence_greater_than,
};
pub use objects::{MovementSettings, NavAgentObject, NavAgentView, PlayerObject, spawn_replica};
pub use simulation::{
    CommandBuffer, FrameContext, ObjectAuthority, ObjectId, ObjectKind, PeerId, PeerRole,
    RemoteView, SimulatedObject, SimulationContext, SimulationDriver,
};
pub use snapshot::{
    ColliderHitbox, Hitbox, HitboxBody, HitboxId, HitboxPose, HitboxShape, HitboxSnapshot,
    LagCompensation, RewindHit, RewindOutcome, SnapshotRing,
};
pub use time::{FixedTimestep, Frame, FrameStep, SimulationClock, TickRate};
