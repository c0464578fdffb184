//! Error types for the core data model.

use thiserror::Error;

use crate::id::StringHash;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by core state mutations.
///
/// Everything here is an authoring or configuration error, not a player
/// error: player-facing numeric inputs are clamped rather than rejected.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A stat id does not exist in the catalog.
    #[error("unknown stat: {0}")]
    UnknownStat(StringHash),

    /// A stat adjustment token is not of the form `Name(=|+|-)Integer`.
    /// Fatal: indicates a broken script build, not a runtime condition.
    #[error("malformed stat adjustment token: {0:?}")]
    MalformedStatAdjustment(String),

    /// A `table:key` string could not be parsed.
    #[error("malformed table key: {0:?}")]
    MalformedTableKey(String),

    /// A fragment slot index is outside the current level's slot array.
    #[error("fragment slot {slot} out of range (level has {len} slots)")]
    SlotOutOfRange {
        /// The requested slot index.
        slot: usize,
        /// The slot array length for the current level.
        len: usize,
    },

    /// A fragment was placed into a slot without ever being collected.
    #[error("fragment {0} was never collected")]
    FragmentNotCollected(StringHash),
}
