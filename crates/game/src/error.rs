#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HitboxError {
    #[error("hitbox list is empty")]
    EmptyHitboxes,
    #[error("too many hitboxes: {count} (max {max})")]
    TooManyHitboxes { count: usize, max: usize },
    #[error("hitboxes have not been registered")]
    NotRegistered,
    #[error("operation is only valid on the authoritative peer")]
    NotAuthoritative,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("unexpected end of message: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },
    #[error("invalid {name} value: {value}")]
    InvalidEnum { name: &'static str, value: u8 },
    #[error("rotation is degenerate or not finite")]
    InvalidRotation,
}
