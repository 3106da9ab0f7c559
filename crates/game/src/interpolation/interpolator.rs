use crate::config::SimulationConfig;
use crate::lerp::lerp_frame;
use crate::net::MessageReader;
use crate::time::Frame;

use super::state::{InterpolationResult, InterpolationState, InterpolationTarget, NetworkSnapshot};

const AMOUNT_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationSettings {
    pub delay_ms: f64,
    pub extrapolation_ms: f64,
    pub min_delta: f64,
    pub smoothing_enabled: bool,
    pub smoothing_rate: f32,
}

impl Default for InterpolationSettings {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

impl From<&SimulationConfig> for InterpolationSettings {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            delay_ms: config.interpolation_delay_ms,
            extrapolation_ms: config.extrapolation_ms,
            min_delta: config.min_interpolation_delta,
            smoothing_enabled: config.smoothing_enabled,
            smoothing_rate: config.smoothing_rate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateInterpolator<S> {
    states: Vec<InterpolationState<S>>,
    capacity: usize,
    received: u64,
    valid_received: u64,
    pending_reset: Option<(S, bool)>,
    settings: InterpolationSettings,
}

impl<S: NetworkSnapshot> StateInterpolator<S> {
    pub fn new(capacity: usize, settings: InterpolationSettings) -> Self {
        let capacity = capacity.max(2);
        Self {
            states: Vec::with_capacity(capacity + 1),
            capacity,
            received: 0,
            valid_received: 0,
            pending_reset: None,
            settings,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.state_buffer_size(), InterpolationSettings::from(config))
    }

    pub fn settings(&self) -> &InterpolationSettings {
        &self.settings
    }

    pub fn states(&self) -> &[InterpolationState<S>] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn received_count(&self) -> u64 {
        self.received
    }

    pub fn latest(&self) -> Option<&InterpolationState<S>> {
        self.states.last()
    }

    pub fn add_state(&mut self, snapshot: S, local_time: f64, frame: Frame) {
        self.push_state(InterpolationState::new(snapshot, local_time, frame));
    }

    /// Decodes a snapshot payload; undecodable payloads are kept as invalid
    /// states so blends touching them are marked invalid too.
    pub fn add_raw_state(&mut self, payload: &[u8], local_time: f64, frame: Frame) {
        let mut reader = MessageReader::from_slice(payload);
        match S::read(&mut reader) {
            Ok(snapshot) => self.add_state(snapshot, local_time, frame),
            Err(e) => {
                log::warn!("dropping malformed snapshot for frame {}: {}", frame, e);
                self.push_state(InterpolationState::invalid(S::default(), local_time, frame));
            }
        }
    }

    fn push_state(&mut self, state: InterpolationState<S>) {
        self.received += 1;
        if state.valid {
            self.valid_received += 1;
        }

        if state.valid && self.valid_received <= 2 {
            let first = self.valid_received == 1
                || self.pending_reset.as_ref().is_some_and(|(_, first)| *first);
            self.pending_reset = Some((state.snapshot.clone(), first));
        }

        if let Some(existing) = self.states.iter_mut().find(|s| s.frame == state.frame) {
            *existing = state;
            return;
        }

        self.states.push(state);
        self.states.sort_by_key(|s| s.frame);
        while self.states.len() > self.capacity {
            self.states.remove(0);
        }
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.pending_reset = None;
    }

    pub fn interpolate(
        &self,
        current_time: f64,
        interpolation_delay_ms: f64,
        extrapolation_ms: f64,
    ) -> Option<InterpolationResult<S>> {
        let latest = self.states.last()?;
        let render_time = current_time - interpolation_delay_ms / 1000.0;

        if latest.time <= render_time {
            return Some(self.extrapolate(render_time, extrapolation_ms));
        }

        let prev = self.states.iter().filter(|s| s.time < render_time).last();
        let next = self.states.iter().find(|s| s.time >= render_time);

        match (prev, next) {
            (Some(prev), Some(next)) => {
                let delta = next.time - prev.time;
                if delta < self.settings.min_delta {
                    log::warn!(
                        "interpolation window between frames {} and {} is only {:.6}s, using newer state",
                        prev.frame,
                        next.frame,
                        delta
                    );
                    return Some(InterpolationResult {
                        prev: Some(prev.clone()),
                        next: Some(next.clone()),
                        interpolated: next.clone(),
                        amount: 1.0,
                    });
                }

                let amount = ((render_time - prev.time) / delta) as f32;
                Some(InterpolationResult {
                    prev: Some(prev.clone()),
                    next: Some(next.clone()),
                    interpolated: Self::interpolate_state(amount, prev, next),
                    amount,
                })
            }
            (None, Some(next)) => Some(InterpolationResult {
                prev: None,
                next: Some(next.clone()),
                interpolated: next.clone(),
                amount: 0.0,
            }),
            (_, None) => Some(self.extrapolate(render_time, extrapolation_ms)),
        }
    }

    /// Dead-reckons past the newest state along the line through the two
    /// newest states, for at most `extrapolation_ms`.
    fn extrapolate(&self, render_time: f64, extrapolation_ms: f64) -> InterpolationResult<S> {
        let len = self.states.len();
        let latest = &self.states[len - 1];
        let hold = InterpolationResult {
            prev: Some(latest.clone()),
            next: None,
            interpolated: latest.clone(),
            amount: 0.0,
        };

        if extrapolation_ms <= 0.0 || len < 2 {
            return hold;
        }

        let before = &self.states[len - 2];
        let delta = latest.time - before.time;
        if !before.valid || !latest.valid || delta < self.settings.min_delta {
            return hold;
        }

        let target = render_time.min(latest.time + extrapolation_ms / 1000.0);
        let amount = ((target - before.time) / delta) as f32;
        let mut interpolated = Self::interpolate_state(amount, before, latest);
        interpolated.time = target;

        InterpolationResult {
            prev: Some(before.clone()),
            next: Some(latest.clone()),
            interpolated,
            amount,
        }
    }

    pub fn interpolate_state(
        amount: f32,
        from: &InterpolationState<S>,
        to: &InterpolationState<S>,
    ) -> InterpolationState<S> {
        let valid = from.valid && to.valid;

        if amount.abs() < AMOUNT_EPSILON {
            return InterpolationState {
                valid,
                ..from.clone()
            };
        }

        InterpolationState {
            snapshot: from.snapshot.lerp(&to.snapshot, amount),
            time: from.time + (to.time - from.time) * amount as f64,
            frame: lerp_frame(from.frame, to.frame, amount).round().max(0.0) as Frame,
            valid,
        }
    }

    /// Pushes the state for `current_time` into `target`. A pending reset from
    /// the first arrivals takes precedence over interpolation.
    pub fn apply(
        &mut self,
        current_time: f64,
        delta_time: f32,
        target: &mut impl InterpolationTarget<S>,
    ) -> Option<InterpolationResult<S>> {
        if let Some((snapshot, first)) = self.pending_reset.take() {
            target.state_reset(&snapshot, first);
            return None;
        }

        let result = self.interpolate(
            current_time,
            self.settings.delay_ms,
            self.settings.extrapolation_ms,
        )?;

        if !result.interpolated.valid {
            return Some(result);
        }

        if self.settings.smoothing_enabled && self.settings.smoothing_rate > 0.0 {
            let smoothing = 1.0 - (-self.settings.smoothing_rate * delta_time.max(0.0)).exp();
            target.final_interpolation(&result.interpolated.snapshot, smoothing);
        } else {
            target.state_reset(&result.interpolated.snapshot, false);
        }

        Some(result)
    }
}
