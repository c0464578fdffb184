//! Error types for the execution engine.

use skein_core::{CoreError, StringHash};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while loading or executing a script graph.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A node id is not present in the graph.
    #[error("node not found: {0}")]
    NodeNotFound(StringHash),

    /// Two nodes share the same name.
    #[error("duplicate node: {0:?}")]
    DuplicateNode(String),

    /// Two distinct names hash to the same id. A configuration error in
    /// the script build, fixed by renaming.
    #[error("hash collision between {existing:?} and {incoming:?}")]
    HashCollision {
        /// The name that claimed the hash first.
        existing: String,
        /// The name that collided with it.
        incoming: String,
    },

    /// A goto, choice, or checkpoint target names a missing node.
    #[error("node {node:?} references missing target {target:?}")]
    DanglingTarget {
        /// The node carrying the reference.
        node: String,
        /// The missing target name.
        target: String,
    },

    /// A script calls a host binding that was never registered.
    #[error("unresolved host binding: {0:?}")]
    UnknownBinding(String),

    /// A binding hash had no registered function at call time.
    #[error("no host function registered for {0}")]
    UnknownBindingHash(StringHash),

    /// An operation needs a live thread but none is running.
    #[error("no active thread")]
    NoActiveThread,

    /// `choose` was called outside a choice suspension.
    #[error("thread is not awaiting a choice")]
    NotAwaitingChoice,

    /// The chosen index is outside the presented option list.
    #[error("invalid choice index: {0}")]
    InvalidChoice(usize),

    /// Every option at a decision point was filtered out while running
    /// headless. Interactive play surfaces the empty list instead; an
    /// automated run cannot recover by waiting for different input.
    #[error("no available choices at node {node} in headless mode")]
    NoAvailableChoices {
        /// The node the decision point belongs to.
        node: StringHash,
    },

    /// A resume was requested with no checkpoint saved.
    #[error("no checkpoint to resume from")]
    NoCheckpoint,

    /// A level index is not declared by the script asset.
    #[error("level not found: {0}")]
    LevelNotFound(u32),

    /// The harness exceeded its step budget, which means the script
    /// loops without reaching an end node.
    #[error("script did not end within {limit} steps")]
    RunawayScript {
        /// The configured step budget.
        limit: usize,
    },

    /// An error from the core data model.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The script asset is not valid JSON.
    #[error("malformed script asset: {0}")]
    Asset(#[from] serde_json::Error),

    /// The script asset could not be read.
    #[error("script asset unreadable: {0}")]
    Io(#[from] std::io::Error),
}
