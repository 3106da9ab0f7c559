use crate::config::SimulationConfig;
use crate::error::HitboxError;
use crate::time::{Frame, TickRate};

use super::hitbox::{Hitbox, HitboxId, HitboxSnapshot};
use super::ring::SnapshotRing;

#[derive(Debug)]
pub struct HitboxBody<H: Hitbox> {
    proximity: Option<H>,
    hitboxes: Vec<H>,
    history: Option<SnapshotRing<HitboxSnapshot<H::Sample>>>,
    max_hitboxes: usize,
    time_error_threshold: f64,
}

impl<H: Hitbox> HitboxBody<H> {
    pub fn new(max_hitboxes: usize, time_error_threshold: f64) -> Self {
        Self {
            proximity: None,
            hitboxes: Vec::new(),
            history: None,
            max_hitboxes,
            time_error_threshold,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.max_hitboxes, config.time_error_threshold)
    }

    /// Takes ownership of the hitboxes, numbers them sequentially and disables
    /// their colliders. History slots are only reserved on the authoritative peer.
    pub fn register_hitboxes(
        &mut self,
        mut proximity: H,
        mut hitboxes: Vec<H>,
        authoritative: bool,
        tick_rate: TickRate,
    ) -> Result<(), HitboxError> {
        if hitboxes.is_empty() {
            return Err(HitboxError::EmptyHitboxes);
        }
        if hitboxes.len() > self.max_hitboxes {
            return Err(HitboxError::TooManyHitboxes {
                count: hitboxes.len(),
                max: self.max_hitboxes,
            });
        }

        for (index, hitbox) in hitboxes.iter_mut().enumerate() {
            hitbox.assign_id(HitboxId(index as u32));
            hitbox.set_collider_enabled(false);
        }
        proximity.assign_id(HitboxId(hitboxes.len() as u32));
        proximity.set_collider_enabled(false);

        self.history = authoritative.then(|| SnapshotRing::new(tick_rate.get() as usize));

        log::debug!(
            "registered {} hitboxes (history: {})",
            hitboxes.len(),
            self.history.as_ref().map_or(0, SnapshotRing::capacity)
        );

        self.proximity = Some(proximity);
        self.hitboxes = hitboxes;
        Ok(())
    }

    pub fn hitboxes_registered(&self) -> bool {
        self.proximity.is_some() && !self.hitboxes.is_empty()
    }

    pub fn hitboxes(&self) -> &[H] {
        &self.hitboxes
    }

    pub fn hitboxes_mut(&mut self) -> &mut [H] {
        &mut self.hitboxes
    }

    pub fn hitbox(&self, id: HitboxId) -> Option<&H> {
        self.hitboxes.get(id.0 as usize)
    }

    pub fn proximity(&self) -> Option<&H> {
        self.proximity.as_ref()
    }

    pub fn proximity_mut(&mut self) -> Option<&mut H> {
        self.proximity.as_mut()
    }

    pub fn history_len(&self) -> usize {
        self.history.as_ref().map_or(0, SnapshotRing::len)
    }

    pub fn history_capacity(&self) -> usize {
        self.history.as_ref().map_or(0, SnapshotRing::capacity)
    }

    pub fn oldest_frame(&self) -> Option<Frame> {
        self.history.as_ref()?.first().map(|s| s.frame)
    }

    pub fn newest_frame(&self) -> Option<Frame> {
        self.history.as_ref()?.last().map(|s| s.frame)
    }

    pub fn perform_snapshot(&mut self, frame: Frame, active: bool) -> Result<(), HitboxError> {
        let Some(proximity) = &self.proximity else {
            return Err(HitboxError::NotRegistered);
        };
        let history = self.history.as_mut().ok_or(HitboxError::NotAuthoritative)?;

        let slot = history.recycle();
        slot.frame = frame;
        slot.active = active;

        if active {
            slot.proximity = proximity.capture();
            slot.samples.clear();
            slot.samples.extend(self.hitboxes.iter().map(H::capture));
        } else if slot.samples.len() != self.hitboxes.len() {
            slot.samples.resize_with(self.hitboxes.len(), Default::default);
        }

        Ok(())
    }

    pub fn snapshot(&self, frame: Frame) -> Option<&HitboxSnapshot<H::Sample>> {
        self.history.as_ref()?.find(|s| s.frame == frame)
    }

    /// Fractional-frame lookup.
    ///
    /// Frames within `time_error_threshold` of an integer resolve to that exact
    /// frame; otherwise the two surrounding frames are blended. When only one of
    /// them is recorded it is returned as is, favouring some data over none.
    pub fn snapshot_at(
        &self,
        frame: f64,
        proximity_only: bool,
    ) -> Option<HitboxSnapshot<H::Sample>> {
        let history = self.history.as_ref()?;
        let oldest = history.first()?.frame as f64;
        let newest = history.last()?.frame as f64;

        if !frame.is_finite() || frame < oldest || frame >= newest {
            return None;
        }

        let error = (frame.round() - frame).abs();
        if error <= self.time_error_threshold || history.len() < 2 {
            return self
                .snapshot(frame.round() as Frame)
                .map(|s| s.to_owned_view(proximity_only));
        }

        let first_frame = frame.floor() as Frame;
        let second_frame = first_frame + 1;

        match (self.snapshot(first_frame), self.snapshot(second_frame)) {
            (Some(first), Some(second)) => {
                let t = (frame - frame.floor()) as f32;
                Some(first.lerp(second, t, proximity_only))
            }
            (Some(only), None) | (None, Some(only)) => {
                log::warn!(
                    "missing hitbox snapshot around frame {:.3}, using frame {}",
                    frame,
                    only.frame
                );
                Some(only.to_owned_view(proximity_only))
            }
            (None, None) => {
                log::warn!("no hitbox snapshots around frame {:.3}", frame);
                None
            }
        }
    }

    pub fn capture_live(&self) -> Option<HitboxSnapshot<H::Sample>> {
        let proximity = self.proximity.as_ref()?;
        Some(HitboxSnapshot {
            frame: 0,
            active: true,
            proximity: proximity.capture(),
            samples: self.hitboxes.iter().map(H::capture).collect(),
        })
    }

    pub fn apply_snapshot(&mut self, snapshot: &HitboxSnapshot<H::Sample>, proximity_only: bool) {
        if let Some(proximity) = self.proximity.as_mut() {
            proximity.apply(&snapshot.proximity);
        }
        if proximity_only {
            return;
        }
        for (hitbox, sample) in self.hitboxes.iter_mut().zip(snapshot.samples.iter()) {
            hitbox.apply(sample);
        }
    }

    pub fn set_colliders_enabled(&mut self, enabled: bool, proximity_only: bool) {
        if let Some(proximity) = self.proximity.as_mut() {
            proximity.set_collider_enabled(enabled);
        }
        if proximity_only {
            return;
        }
        for hitbox in &mut self.hitboxes {
            hitbox.set_collider_enabled(enabled);
        }
    }

    pub fn clear_history(&mut self) {
        if let Some(history) = self.history.as_mut() {
            history.clear();
        }
    }
}
