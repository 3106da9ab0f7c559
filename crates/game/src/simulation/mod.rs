mod authority;
mod command;
mod context;
mod driver;
mod object;

pub use authority::{ObjectAuthority, PeerId, PeerRole};
pub use command::{CommandBuffer, PendingCommand};
pub use context::SimulationContext;
pub use driver::SimulationDriver;
pub use object::{FrameContext, ObjectId, ObjectKind, RemoteView, SimulatedObject};
