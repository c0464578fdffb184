//! Per-level definitions.

use serde::{Deserialize, Serialize};

use crate::id::StringHash;

/// The per-level parameters a script asset declares.
///
/// Fragments are scoped to the `story_group`, not strictly to the level:
/// two levels sharing a group keep the collected-fragment inventory
/// across the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    /// Position of the level in the script.
    pub level_index: u32,
    /// The story group this level belongs to.
    pub story_group: StringHash,
    /// Number of fragment slots the level exposes.
    pub slot_count: usize,
    /// Time budget granted when the level starts, in hours.
    pub start_time_hours: f32,
    /// The node a fresh run of this level begins at.
    pub start_node: StringHash,
    /// The player's starting location.
    pub start_location: StringHash,
}

impl LevelDef {
    /// A minimal definition for the given index, mostly useful in tests.
    pub fn bare(level_index: u32) -> Self {
        Self {
            level_index,
            story_group: StringHash::EMPTY,
            slot_count: 0,
            start_time_hours: 0.0,
            start_node: StringHash::EMPTY,
            start_location: StringHash::EMPTY,
        }
    }
}
