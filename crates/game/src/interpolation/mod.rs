mod interpolator;
mod nav_agent;
mod state;
mod transform;

pub use interpolator::{InterpolationSettings, StateInterpolator};
pub use nav_agent::{AgentState, NavAgentSnapshot};
pub use state::{InterpolationResult, InterpolationState, InterpolationTarget, NetworkSnapshot};
pub use transform::{SmoothedTransform, TransformSnapshot};
