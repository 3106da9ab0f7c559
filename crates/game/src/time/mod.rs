mod clock;
mod tick_rate;
mod timestep;

pub use clock::{FrameStep, SimulationClock};
pub use tick_rate::{Frame, MAX_TICK_RATE, MIN_TICK_RATE, TickRate};
pub use timestep::FixedTimestep;
