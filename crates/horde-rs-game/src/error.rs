//! Error types for the spawning core.

use thiserror::Error;

use crate::mob_registry::MobKind;

/// Failure reported by an [`EntityLifecycle`](crate::hooks::EntityLifecycle) implementation.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("entity world rejected spawn of {kind:?}: {reason}")]
    SpawnRejected { kind: MobKind, reason: String },

    #[error("entity limit reached ({limit})")]
    LimitReached { limit: usize },

    #[error("no definition registered for {0:?}")]
    UnknownKind(MobKind),
}

/// Failure loading or validating spawning data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid affix JSON: {0}")]
    AffixJson(#[from] serde_json::Error),

    #[error("duplicate affix id: {0}")]
    DuplicateAffix(String),

    #[error("zone {id}: {reason}")]
    InvalidZone { id: u32, reason: String },

    #[error("zone table has no zone 1 to fall back to")]
    MissingFallbackZone,
}
