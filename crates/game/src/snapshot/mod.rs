mod body;
mod hitbox;
mod lag_compensation;
mod ring;

pub use body::HitboxBody;
pub use hitbox::{ColliderHitbox, Hitbox, HitboxId, HitboxPose, HitboxShape, HitboxSnapshot};
pub use lag_compensation::{LagCompensation, RewindHit, RewindOutcome};
pub use ring::SnapshotRing;
