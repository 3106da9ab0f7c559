use serde::{Deserialize, Serialize};

/// Discrete simulation tick counter.
pub type Frame = u32;

pub const MIN_TICK_RATE: u32 = 30;
pub const MAX_TICK_RATE: u32 = 144;

/// Fixed simulation rate, always within `[MIN_TICK_RATE, MAX_TICK_RATE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct TickRate(u32);

impl TickRate {
    pub fn new(rate: u32) -> Self {
        Self(rate.clamp(MIN_TICK_RATE, MAX_TICK_RATE))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Seconds per frame.
    pub fn tick_step(self) -> f64 {
        1.0 / self.0 as f64
    }

    pub fn frame_to_time(self, frame: Frame) -> f64 {
        frame as f64 / self.0 as f64
    }

    pub fn time_to_frame(self, time: f64) -> Frame {
        self.time_to_fframe(time).round().max(0.0) as Frame
    }

    /// Unrounded frame position of `time`, for sub-tick math.
    pub fn time_to_fframe(self, time: f64) -> f64 {
        time * self.0 as f64
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TICK_RATE)
    }
}

impl From<u32> for TickRate {
    fn from(rate: u32) -> Self {
        Self::new(rate)
    }
}

impl From<TickRate> for u32 {
    fn from(rate: TickRate) -> Self {
        rate.0
    }
}
