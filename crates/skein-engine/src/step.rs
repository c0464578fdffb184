//! Node-body instructions.
//!
//! A node's body is an ordered sequence of [`Step`]s the engine executes
//! between suspension points. Lines and choices suspend; everything else
//! runs to completion in order.

use std::collections::HashMap;

use skein_core::{StringHash, TableKey, Variant};

/// Custom-data key for an option's time cost in hours.
pub const KEY_TIME_COST: StringHash = StringHash::hash("time_cost");
/// Custom-data key for the once-only flag.
pub const KEY_ONCE: StringHash = StringHash::hash("once");
/// Custom-data key for the location an option moves the player to.
pub const KEY_LOCATION: StringHash = StringHash::hash("location");

/// One instruction inside a node body.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Display a line and suspend until the caller acknowledges it.
    Line {
        /// The line text (or localization key) to display.
        text: String,
        /// Free-form presentation tags for the display layer.
        tags: Vec<String>,
    },
    /// Present a decision point and suspend until a choice is made.
    Choices(Vec<ChoiceDef>),
    /// Apply a batch stat adjustment spec like `"Nerve+2 Grit-1"`.
    AdjustStats(String),
    /// Write a variable.
    SetVar {
        /// The variable slot.
        key: TableKey,
        /// The value to store.
        value: Variant,
    },
    /// Collect a story fragment.
    AddFragment(StringHash),
    /// Place a collected fragment into a story slot.
    AllocateFragment {
        /// The slot index.
        slot: usize,
        /// The fragment to place; the empty hash clears the slot.
        fragment: StringHash,
    },
    /// Move the player to a location.
    SetLocation(StringHash),
    /// Grant time to the budget, in hours.
    GrantTime(f32),
    /// Spend time from the budget, in hours.
    SpendTime(f32),
    /// Invoke a registered host function.
    Call {
        /// The hashed binding name.
        binding: StringHash,
        /// Arguments passed through to the host.
        args: Vec<Variant>,
    },
    /// Jump to another node, bypassing choice traversal.
    Goto(StringHash),
    /// End the thread at this node.
    End,
}

/// One candidate branch at a decision point.
///
/// Choices are transient: created when the decision point is reached,
/// discarded once resolved. The custom-data map carries at minimum the
/// optional time cost, once-only flag, and location id under the
/// well-known keys above.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceDef {
    /// The text shown for the option.
    pub text: String,
    /// The node this option transitions to.
    pub target: StringHash,
    /// Free-form authored metadata.
    pub custom: HashMap<StringHash, Variant>,
}

impl ChoiceDef {
    /// A choice with empty custom data.
    pub fn new(text: impl Into<String>, target: StringHash) -> Self {
        Self {
            text: text.into(),
            target,
            custom: HashMap::new(),
        }
    }

    /// Attach a custom-data entry.
    pub fn with_custom(mut self, key: StringHash, value: Variant) -> Self {
        self.custom.insert(key, value);
        self
    }

    /// Attach a time cost in hours.
    pub fn with_time_cost(self, hours: f32) -> Self {
        self.with_custom(KEY_TIME_COST, Variant::Float(f64::from(hours)))
    }

    /// Mark the option once-only.
    pub fn once_only(self) -> Self {
        self.with_custom(KEY_ONCE, Variant::Bool(true))
    }

    /// The option's time cost in hours; absent or non-numeric reads as
    /// zero.
    pub fn time_cost(&self) -> f32 {
        self.custom
            .get(&KEY_TIME_COST)
            .and_then(|v| v.as_float())
            .unwrap_or(0.0) as f32
    }

    /// Whether the option disappears after its target has been visited.
    pub fn once(&self) -> bool {
        self.custom.get(&KEY_ONCE).is_some_and(|v| v.truthy())
    }

    /// The location the option moves the player to, if any.
    pub fn location(&self) -> Option<StringHash> {
        self.custom
            .get(&KEY_LOCATION)
            .and_then(|v| v.as_str_hash())
            .filter(|h| !h.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_data_accessors() {
        let choice = ChoiceDef::new("Ask around the docks", StringHash::hash("docks_gossip"))
            .with_time_cost(1.5)
            .once_only()
            .with_custom(KEY_LOCATION, Variant::Str(StringHash::hash("docks")));

        assert!((choice.time_cost() - 1.5).abs() < f32::EPSILON);
        assert!(choice.once());
        assert_eq!(choice.location(), Some(StringHash::hash("docks")));
    }

    #[test]
    fn absent_custom_data_defaults() {
        let choice = ChoiceDef::new("Leave", StringHash::hash("leave"));
        assert_eq!(choice.time_cost(), 0.0);
        assert!(!choice.once());
        assert_eq!(choice.location(), None);
    }

    #[test]
    fn non_numeric_cost_reads_as_zero() {
        let choice = ChoiceDef::new("Odd", StringHash::hash("odd"))
            .with_custom(KEY_TIME_COST, Variant::Bool(true));
        assert_eq!(choice.time_cost(), 0.0);
    }
}
