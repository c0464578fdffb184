//! Named variable tables with lenient key resolution.
//!
//! Two tables exist per save: `global` (the default) and `ui`. Lookups
//! against any other table name fall back to the global table. Failed
//! lookups and unparseable keys are reported, never fatal — the script
//! sees a null [`Variant`] and execution continues.

use std::collections::HashMap;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::event::{Event, EventQueue};
use crate::id::{StringHash, TableKey};
use crate::variant::Variant;

/// One named table of hashed keys to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableTable {
    entries: HashMap<StringHash, Variant>,
}

impl VariableTable {
    /// Look up a value; absent keys read as null.
    pub fn get(&self, key: StringHash) -> Option<Variant> {
        self.entries.get(&key).copied()
    }

    /// Store a value, returning the previous one.
    pub fn insert(&mut self, key: StringHash, value: Variant) -> Option<Variant> {
        self.entries.insert(key, value)
    }

    /// The number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Hashed map keys do not survive JSON serialization, so tables persist
// as ordered (key, value) pairs.
impl Serialize for VariableTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pairs: Vec<(StringHash, Variant)> =
            self.entries.iter().map(|(k, v)| (*k, *v)).collect();
        pairs.sort_by_key(|(k, _)| k.value());
        pairs.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VariableTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<(StringHash, Variant)>::deserialize(deserializer)?;
        Ok(Self {
            entries: pairs.into_iter().collect(),
        })
    }
}

/// The resolver over the save's named variable tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableStore {
    global: VariableTable,
    ui: VariableTable,
}

impl VariableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a key to its current value. Unknown table names fall back
    /// to the global table; a missing key reads as null and is logged.
    pub fn resolve(&self, key: TableKey) -> Variant {
        match self.table(key.table).get(key.key) {
            Some(value) => value,
            None => {
                tracing::debug!(%key, "variable not found, resolving to null");
                Variant::Null
            }
        }
    }

    /// Write a value. Returns true iff the stored value changed; on
    /// change, emits [`Event::VariableUpdated`] exactly once.
    pub fn write(&mut self, key: TableKey, value: Variant, events: &mut EventQueue) -> bool {
        let previous = self
            .table_mut(key.table)
            .insert(key.key, value)
            .unwrap_or(Variant::Null);
        let changed = previous != value;
        if changed {
            events.push(Event::VariableUpdated { key });
        }
        changed
    }

    /// Resolve a `table:key` string. Parse failures are reported and
    /// read as null.
    pub fn resolve_str(&self, key: &str) -> Variant {
        match TableKey::parse(key) {
            Ok(parsed) => self.resolve(parsed),
            Err(err) => {
                tracing::warn!(key, %err, "unparseable variable key");
                Variant::Null
            }
        }
    }

    /// Write through a `table:key` string. Parse failures are reported
    /// and write nothing.
    pub fn write_str(&mut self, key: &str, value: Variant, events: &mut EventQueue) -> bool {
        match TableKey::parse(key) {
            Ok(parsed) => self.write(parsed, value, events),
            Err(err) => {
                tracing::warn!(key, %err, "unparseable variable key");
                false
            }
        }
    }

    fn table(&self, id: StringHash) -> &VariableTable {
        if id == TableKey::UI {
            &self.ui
        } else {
            &self.global
        }
    }

    fn table_mut(&mut self, id: StringHash) -> &mut VariableTable {
        if id == TableKey::UI {
            &mut self.ui
        } else {
            &mut self.global
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_resolves_to_null() {
        let store = VariableStore::new();
        let key = TableKey::global(StringHash::hash("unset"));
        assert_eq!(store.resolve(key), Variant::Null);
    }

    #[test]
    fn write_then_resolve() {
        let mut store = VariableStore::new();
        let mut events = EventQueue::new();
        let key = TableKey::global(StringHash::hash("mood"));

        assert!(store.write(key, Variant::Int(2), &mut events));
        assert_eq!(store.resolve(key), Variant::Int(2));
    }

    #[test]
    fn write_notifies_only_on_change() {
        let mut store = VariableStore::new();
        let mut events = EventQueue::new();
        let key = TableKey::ui(StringHash::hash("volume"));

        assert!(store.write(key, Variant::Float(0.5), &mut events));
        assert_eq!(events.drain(), vec![Event::VariableUpdated { key }]);

        // Same value again: no change, no notification.
        assert!(!store.write(key, Variant::Float(0.5), &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn writing_null_over_missing_is_not_a_change() {
        let mut store = VariableStore::new();
        let mut events = EventQueue::new();
        let key = TableKey::global(StringHash::hash("ghost"));

        assert!(!store.write(key, Variant::Null, &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn unknown_table_falls_back_to_global() {
        let mut store = VariableStore::new();
        let mut events = EventQueue::new();
        let name = StringHash::hash("mood");
        store.write(TableKey::global(name), Variant::Int(7), &mut events);

        let odd = TableKey {
            table: StringHash::hash("quest"),
            key: name,
        };
        assert_eq!(store.resolve(odd), Variant::Int(7));
    }

    #[test]
    fn ui_table_is_distinct() {
        let mut store = VariableStore::new();
        let mut events = EventQueue::new();
        let name = StringHash::hash("mood");
        store.write(TableKey::global(name), Variant::Int(1), &mut events);
        store.write(TableKey::ui(name), Variant::Int(2), &mut events);

        assert_eq!(store.resolve(TableKey::global(name)), Variant::Int(1));
        assert_eq!(store.resolve(TableKey::ui(name)), Variant::Int(2));
    }

    #[test]
    fn string_keys_parse_leniently() {
        let mut store = VariableStore::new();
        let mut events = EventQueue::new();

        assert!(store.write_str("ui:volume", Variant::Float(0.8), &mut events));
        assert_eq!(store.resolve_str("ui:volume"), Variant::Float(0.8));

        // Bare key lands in the global table.
        assert!(store.write_str("mood", Variant::Int(3), &mut events));
        assert_eq!(
            store.resolve(TableKey::global(StringHash::hash("mood"))),
            Variant::Int(3)
        );
    }

    #[test]
    fn unparseable_key_is_soft() {
        let mut store = VariableStore::new();
        let mut events = EventQueue::new();

        assert_eq!(store.resolve_str("ui:"), Variant::Null);
        assert!(!store.write_str("", Variant::Int(1), &mut events));
        assert!(events.is_empty());
    }
}
