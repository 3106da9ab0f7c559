use std::fmt;

use crate::error::MessageError;
use crate::lerp::{Lerp, lerp_frame};
use crate::net::{MessageReader, MessageWriter};
use crate::time::Frame;

pub trait NetworkSnapshot: Lerp + Clone + Default + fmt::Debug {
    fn write(&self, writer: &mut MessageWriter);
    fn read(reader: &mut MessageReader) -> Result<Self, MessageError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationState<S> {
    pub snapshot: S,
    pub time: f64,
    pub frame: Frame,
    pub valid: bool,
}

impl<S> InterpolationState<S> {
    pub fn new(snapshot: S, time: f64, frame: Frame) -> Self {
        Self {
            snapshot,
            time,
            frame,
            valid: true,
        }
    }

    pub fn invalid(snapshot: S, time: f64, frame: Frame) -> Self {
        Self {
            snapshot,
            time,
            frame,
            valid: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterpolationResult<S> {
    pub prev: Option<InterpolationState<S>>,
    pub next: Option<InterpolationState<S>>,
    pub interpolated: InterpolationState<S>,
    pub amount: f32,
}

impl<S> InterpolationResult<S> {
    /// Fractional server frame being displayed. Sent along with hit requests
    /// so the server can rewind to the same moment.
    pub fn view_frame(&self) -> f64 {
        match (&self.prev, &self.next) {
            (Some(prev), Some(next)) => lerp_frame(prev.frame, next.frame, self.amount),
            _ => self.interpolated.frame as f64,
        }
    }
}

/// Receives interpolated snapshots for presentation.
pub trait InterpolationTarget<S> {
    fn final_interpolation(&mut self, snapshot: &S, smoothing: f32);

    fn state_reset(&mut self, snapshot: &S, first: bool);
}
