use super::TickRate;

const MAX_FRAME_TIME: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct FixedTimestep {
    dt: f64,
    accumulator: f64,
}

impl FixedTimestep {
    pub fn new(tick_rate: TickRate) -> Self {
        Self {
            dt: tick_rate.tick_step(),
            accumulator: 0.0,
        }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn accumulate(&mut self, delta: f64) {
        self.accumulator += delta.clamp(0.0, MAX_FRAME_TIME);
    }

    pub fn should_tick(&self) -> bool {
        self.accumulator >= self.dt
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }

    /// Progress towards the next tick, in `[0, 1)`.
    pub fn alpha(&self) -> f64 {
        self.accumulator / self.dt
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
