use crate::config::SimulationConfig;

use super::{FixedTimestep, Frame, TickRate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStep {
    pub frame: Frame,
    pub stepped: u32,
    pub warped: bool,
}

/// Frame bookkeeping for one peer.
///
/// On the authoritative peer the server frame is the local frame. On a pure
/// client it is a locally projected estimate, warped forward whenever a newer
/// frame is received from the server.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    tick_rate: TickRate,
    timestep: FixedTimestep,
    authoritative: bool,
    frame: Frame,
    estimated_server_frame: Frame,
    received_server_frame: Frame,
    adjust_server_frames: bool,
    local_time: f64,
    frame_step_warning: u32,
}

impl SimulationClock {
    pub fn new(tick_rate: TickRate, authoritative: bool) -> Self {
        Self {
            tick_rate,
            timestep: FixedTimestep::new(tick_rate),
            authoritative,
            frame: 0,
            estimated_server_frame: 0,
            received_server_frame: 0,
            adjust_server_frames: false,
            local_time: 0.0,
            frame_step_warning: crate::config::FRAME_STEP_WARNING,
        }
    }

    pub fn from_config(config: &SimulationConfig, authoritative: bool) -> Self {
        let mut clock = Self::new(config.tick_rate(), authoritative);
        clock.frame_step_warning = config.frame_step_warning;
        clock
    }

    pub fn tick_rate(&self) -> TickRate {
        self.tick_rate
    }

    pub fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn server_frame(&self) -> Frame {
        if self.authoritative {
            self.frame
        } else {
            self.estimated_server_frame
        }
    }

    pub fn estimated_server_frame(&self) -> Frame {
        self.estimated_server_frame
    }

    pub fn received_server_frame(&self) -> Frame {
        self.received_server_frame
    }

    pub fn adjust_server_frames(&self) -> bool {
        self.adjust_server_frames
    }

    pub fn local_time(&self) -> f64 {
        self.local_time
    }

    pub fn alpha(&self) -> f64 {
        self.timestep.alpha()
    }

    /// Records a server frame carried by an incoming message. The correction is
    /// deferred to the next pass.
    pub fn receive_server_frame(&mut self, frame: Frame) {
        if self.authoritative {
            return;
        }

        if frame > self.received_server_frame {
            self.received_server_frame = frame;
        }

        if self.received_server_frame > self.estimated_server_frame {
            self.adjust_server_frames = true;
        }
    }

    /// Warps the local frame forward by the whole drift in one step and
    /// returns the number of frames skipped.
    pub fn adjust_frames(&mut self) -> u32 {
        if !self.adjust_server_frames {
            return 0;
        }
        self.adjust_server_frames = false;

        if self.received_server_frame <= self.estimated_server_frame {
            return 0;
        }

        let drift = self.received_server_frame - self.estimated_server_frame;
        self.frame = self.frame.wrapping_add(drift);
        self.estimated_server_frame = self.received_server_frame;

        log::debug!(
            "server frame drift of {} frames corrected (estimated server frame {})",
            drift,
            self.estimated_server_frame
        );

        drift
    }

    pub fn step(&mut self) -> FrameStep {
        let mut warped = false;

        let stepped = if self.authoritative {
            self.frame = self.frame.wrapping_add(1);
            1
        } else {
            let drift = if self.adjust_server_frames {
                self.adjust_frames()
            } else {
                0
            };

            if drift > 0 {
                warped = true;
                drift
            } else {
                self.frame = self.frame.wrapping_add(1);
                self.estimated_server_frame = self.estimated_server_frame.wrapping_add(1);
                1
            }
        };

        if stepped > self.frame_step_warning {
            log::warn!(
                "stepped {} frames in a single pass (frame {}), simulation is lagging behind",
                stepped,
                self.frame
            );
        }

        FrameStep {
            frame: self.frame,
            stepped,
            warped,
        }
    }

    pub fn advance(&mut self, delta: f64) {
        self.local_time += delta.max(0.0);
        self.timestep.accumulate(delta);
    }

    pub fn next_pass(&mut self) -> Option<FrameStep> {
        if self.timestep.consume_tick() {
            Some(self.step())
        } else {
            None
        }
    }
}
