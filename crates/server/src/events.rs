use qnet::{HitboxId, ObjectId, ObjectKind};

#[derive(Debug, Clone)]
pub enum SessionEvent {
    ObjectSpawned {
        object: ObjectId,
        kind: ObjectKind,
    },
    ShotFired {
        target: ObjectId,
        view_frame: f64,
    },
    ShotResolved {
        target: ObjectId,
        view_frame: f64,
        outcome: ShotOutcome,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotOutcome {
    Hit {
        hitbox: HitboxId,
        distance: f32,
        damage: f32,
    },
    Miss,
    ProximityMiss,
    Inactive,
    Unavailable,
    UnknownTarget,
}

impl ShotOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotOutcome::Hit { .. } => "hit",
            ShotOutcome::Miss => "missed every hitbox",
            ShotOutcome::ProximityMiss => "missed the proximity volume",
            ShotOutcome::Inactive => "target was not hittable",
            ShotOutcome::Unavailable => "no history for that frame",
            ShotOutcome::UnknownTarget => "unknown target",
        }
    }
}
