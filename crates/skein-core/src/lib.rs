//! Core types for Skein: the data model a narrative script runs against.
//!
//! This crate is the leaf of the workspace. It defines stable hashed
//! identifiers, the tagged [`Variant`] value, the variable store, the
//! clamped stat and time-budget models, and the mutable [`PlayerState`]
//! save record. It knows nothing about script graphs or execution — the
//! engine crate drives these types and observes their change
//! notifications through an [`EventQueue`].

/// Error types used throughout the crate.
pub mod error;
/// Change notifications emitted by state mutations.
pub mod event;
/// Stable 32-bit string hashes and composite table keys.
pub mod id;
/// Per-level definitions carried by the script asset.
pub mod level;
/// The mutable player save record.
pub mod player;
/// Stat catalogs, clamped stat blocks, and batch adjustments.
pub mod stats;
/// The minute-granular time budget.
pub mod time;
/// Named variable tables with lenient key resolution.
pub mod variable;
/// The tagged runtime value.
pub mod variant;

/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export the notification queue and event enum.
pub use event::{Event, EventQueue};
/// Re-export id types.
pub use id::{StringHash, TableKey};
/// Re-export level definitions.
pub use level::LevelDef;
/// Re-export the player save record.
pub use player::PlayerState;
/// Re-export stat types.
pub use stats::StatCatalog;
/// Re-export the time budget.
pub use time::TimeBudget;
/// Re-export the variable store.
pub use variable::VariableStore;
/// Re-export the runtime value.
pub use variant::Variant;
