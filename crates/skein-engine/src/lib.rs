//! The Skein execution engine.
//!
//! Walks a pre-compiled script node graph one cooperative "thread" at a
//! time: entering nodes, running their bodies, filtering and resolving
//! choices, and yielding to the caller at defined suspension points
//! (lines, choices). The thread is logical, not an OS thread — the
//! caller drives it one [`Signal`] at a time, and starting a new thread
//! unconditionally discards the old one.

/// Host-function registry for script-to-host calls.
pub mod bindings;
/// Choice availability filtering and cost application.
pub mod choice;
/// Engine configuration.
pub mod config;
/// The session context passed to every engine operation.
pub mod context;
/// Error types for the engine.
pub mod error;
/// The script node graph and its asset loader.
pub mod graph;
/// Headless auto-advance harness for regression runs.
pub mod harness;
/// Session orchestration: loading, starting, resuming, checkpoints.
pub mod session;
/// Node-body instructions and choice definitions.
pub mod step;
/// The cooperative thread execution engine.
pub mod thread;

/// Re-export the binding registry.
pub use bindings::BindingRegistry;
/// Re-export the engine configuration.
pub use config::EngineConfig;
/// Re-export the session context.
pub use context::SessionContext;
/// Re-export error types.
pub use error::{EngineError, EngineResult};
/// Re-export graph types.
pub use graph::{GraphAsset, NodeFlags, ScriptGraph, ScriptNode};
/// Re-export the auto-advance harness.
pub use harness::{AutoPlayer, Playthrough};
/// Re-export session types.
pub use session::{
    CheckpointStore, JsonCheckpointStore, JsonFileSource, MemoryCheckpointStore, ScriptSource,
    Session,
};
/// Re-export step and choice types.
pub use step::{ChoiceDef, Step};
/// Re-export the execution engine.
pub use thread::{Engine, NoHooks, Signal, ThreadHandle, ThreadHooks};
