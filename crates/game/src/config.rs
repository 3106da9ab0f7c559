use serde::{Deserialize, Serialize};

use crate::time::TickRate;

pub const DEFAULT_TICK_RATE: u32 = 60;
pub const DEFAULT_INTERPOLATION_DELAY_MS: f64 = 100.0;
pub const DEFAULT_EXTRAPOLATION_MS: f64 = 100.0;
pub const DEFAULT_TIME_ERROR_THRESHOLD: f64 = 0.001;
pub const DEFAULT_MAX_HITBOXES: usize = 32;
pub const FRAME_STEP_WARNING: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_rate: u32,
    pub send_rate: u32,
    pub interpolation_delay_ms: f64,
    pub extrapolation_ms: f64,
    pub time_error_threshold: f64,
    pub max_hitboxes: usize,
    pub smoothing_enabled: bool,
    pub smoothing_rate: f32,
    pub frame_step_warning: u32,
    pub min_interpolation_delta: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            send_rate: 1,
            interpolation_delay_ms: DEFAULT_INTERPOLATION_DELAY_MS,
            extrapolation_ms: DEFAULT_EXTRAPOLATION_MS,
            time_error_threshold: DEFAULT_TIME_ERROR_THRESHOLD,
            max_hitboxes: DEFAULT_MAX_HITBOXES,
            smoothing_enabled: true,
            smoothing_rate: 20.0,
            frame_step_warning: FRAME_STEP_WARNING,
            min_interpolation_delta: 0.0001,
        }
    }
}

impl SimulationConfig {
    pub fn validated(&self) -> Self {
        Self {
            tick_rate: TickRate::new(self.tick_rate).get(),
            send_rate: self.send_rate.max(1),
            interpolation_delay_ms: self.interpolation_delay_ms.max(0.0),
            extrapolation_ms: self.extrapolation_ms.max(0.0),
            time_error_threshold: self.time_error_threshold.clamp(0.0, 0.5),
            max_hitboxes: self.max_hitboxes.max(1),
            smoothing_enabled: self.smoothing_enabled,
            smoothing_rate: self.smoothing_rate.max(0.0),
            frame_step_warning: self.frame_step_warning.max(1),
            min_interpolation_delta: self.min_interpolation_delta.max(f64::EPSILON),
        }
    }

    pub fn tick_rate(&self) -> TickRate {
        TickRate::new(self.tick_rate)
    }

    /// Per-object interpolation buffers hold one second of states.
    pub fn state_buffer_size(&self) -> usize {
        self.tick_rate().get() as usize
    }
}
