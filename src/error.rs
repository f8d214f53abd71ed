//! Crate error type

use thiserror::Error;

use crate::sim::EntityId;

/// Errors raised by the input graph and the simulation
#[derive(Debug, Error)]
pub enum GameError {
    /// A broken invariant. The offending call is aborted.
    #[error("illegal operation: {0}")]
    IllegalOperation(String),

    /// Collision pair disqualified by the identity filter. Expected and recoverable.
    #[error("entity {a:?} cannot hit entity {b:?}")]
    CannotHit { a: EntityId, b: EntityId },

    /// Touch/pointer slot past what the platform supports
    #[error("pointer index {index} is too big to be a pointer (capacity {capacity})")]
    PointerOutOfRange { index: usize, capacity: usize },

    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GameError {
    pub fn illegal(msg: impl Into<String>) -> Self {
        GameError::IllegalOperation(msg.into())
    }

    /// True for conditions the frame loop silently skips
    pub fn is_cannot_hit(&self) -> bool {
        matches!(self, GameError::CannotHit { .. })
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
