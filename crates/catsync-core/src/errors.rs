//! Cross-cutting error types for catsync.
//!
//! Domain-specific errors (`DbfError`, `DatabaseError`, `SyncError`) live in
//! their respective crates and wrap this one where a core rule is broken.
//! All of them converge into `anyhow` in `catsync-cli`.

use thiserror::Error;

/// Violations of rules owned by the core types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// A stored value could not be mapped back to a known variant.
    #[error("Unknown {kind} value: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}
