use glam::Vec3;

use crate::error::HitboxError;

use super::body::HitboxBody;
use super::hitbox::{ColliderHitbox, Hitbox, HitboxId};

#[derive(Debug, Clone, PartialEq)]
pub struct RewindHit<R> {
    pub hitbox: HitboxId,
    pub result: R,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RewindOutcome<R> {
    Unavailable,
    Inactive,
    ProximityMiss,
    Tested(Vec<RewindHit<R>>),
}

impl<R> RewindOutcome<R> {
    pub fn hits(&self) -> &[RewindHit<R>] {
        match self {
            RewindOutcome::Tested(hits) => hits,
            _ => &[],
        }
    }

    pub fn is_hit(&self) -> bool {
        !self.hits().is_empty()
    }
}

pub struct LagCompensation;

impl LagCompensation {
    /// Runs `test` against the body as it stood at `frame`.
    ///
    /// The proximity volume is tested first; only if `test` reports a hit on
    /// it are the individual hitboxes rewound and tested. Live poses and
    /// collider states are restored before returning.
    pub fn rewind_test<H, R>(
        body: &mut HitboxBody<H>,
        frame: f64,
        mut test: impl FnMut(&H) -> Option<R>,
    ) -> Result<RewindOutcome<R>, HitboxError>
    where
        H: Hitbox,
    {
        if !body.hitboxes_registered() {
            return Err(HitboxError::NotRegistered);
        }
        if body.history_capacity() == 0 {
            return Err(HitboxError::NotAuthoritative);
        }

        let Some(proximity) = body.snapshot_at(frame, true) else {
            log::debug!("no hitbox history for frame {:.3}", frame);
            return Ok(RewindOutcome::Unavailable);
        };
        if !proximity.active {
            return Ok(RewindOutcome::Inactive);
        }

        let Some(live) = body.capture_live() else {
            return Err(HitboxError::NotRegistered);
        };

        body.apply_snapshot(&proximity, true);
        body.set_colliders_enabled(true, true);
        let near = body.proximity().and_then(&mut test).is_some();
        body.apply_snapshot(&live, true);
        body.set_colliders_enabled(false, true);

        if !near {
            return Ok(RewindOutcome::ProximityMiss);
        }

        let Some(rewound) = body.snapshot_at(frame, false) else {
            return Ok(RewindOutcome::Unavailable);
        };

        body.apply_snapshot(&rewound, false);
        body.set_colliders_enabled(true, false);

        let hits = body
            .hitboxes()
            .iter()
            .filter_map(|hitbox| {
                test(hitbox).map(|result| RewindHit {
                    hitbox: hitbox.id(),
                    result,
                })
            })
            .collect();

        body.apply_snapshot(&live, false);
        body.set_colliders_enabled(false, false);

        Ok(RewindOutcome::Tested(hits))
    }

    pub fn raycast(
        body: &mut HitboxBody<ColliderHitbox>,
        frame: f64,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Result<RewindOutcome<f32>, HitboxError> {
        let direction = direction.normalize_or_zero();
        Self::rewind_test(body, frame, |hitbox: &ColliderHitbox| {
            hitbox.raycast(origin, direction, max_distance)
        })
    }
}
