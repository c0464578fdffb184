//! Stable hashed identifiers.
//!
//! Node ids, variable keys, location ids, and fragment ids are all 32-bit
//! FNV-1a hashes of human-readable names. Hashing is `const`, so
//! well-known keys can be named constants. Collisions between distinct
//! names are a configuration error caught when a script graph is loaded,
//! never a runtime concern.

use std::fmt;

use serde::{Deserialize, Serialize};

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// A stable 32-bit hash of a human-readable string identifier.
///
/// The zero value is reserved as the "unset" sentinel: hashing the empty
/// string yields [`StringHash::EMPTY`], and empty entries in slot arrays
/// or an unwritten checkpoint pointer are represented the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringHash(u32);

impl StringHash {
    /// The unset sentinel.
    pub const EMPTY: StringHash = StringHash(0);

    /// Hash a name with 32-bit FNV-1a. The empty string maps to
    /// [`StringHash::EMPTY`].
    pub const fn hash(name: &str) -> Self {
        let bytes = name.as_bytes();
        if bytes.is_empty() {
            return Self::EMPTY;
        }
        let mut h = FNV_OFFSET;
        let mut i = 0;
        while i < bytes.len() {
            h ^= bytes[i] as u32;
            h = h.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        StringHash(h)
    }

    /// Construct from a raw hash value.
    pub const fn from_raw(value: u32) -> Self {
        StringHash(value)
    }

    /// The raw hash value.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Whether this is the unset sentinel.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for StringHash {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for StringHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

impl From<&str> for StringHash {
    fn from(name: &str) -> Self {
        Self::hash(name)
    }
}

/// A composite (table, key) identifier for one variable slot.
///
/// String forms like `"ui:volume"` parse leniently: a missing table part
/// selects the global table, while an empty key is a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableKey {
    /// Hash of the table name.
    pub table: StringHash,
    /// Hash of the key name within the table.
    pub key: StringHash,
}

impl TableKey {
    /// The default table for variables without an explicit table prefix.
    pub const GLOBAL: StringHash = StringHash::hash("global");
    /// The table for interface-scoped variables.
    pub const UI: StringHash = StringHash::hash("ui");

    /// A key in the global table.
    pub const fn global(key: StringHash) -> Self {
        TableKey {
            table: Self::GLOBAL,
            key,
        }
    }

    /// A key in the ui table.
    pub const fn ui(key: StringHash) -> Self {
        TableKey {
            table: Self::UI,
            key,
        }
    }

    /// Parse a `table:key` string. Without a colon the whole string is
    /// taken as a key in the global table.
    pub fn parse(s: &str) -> Result<Self, crate::error::CoreError> {
        let (table, key) = match s.split_once(':') {
            Some((t, k)) => (t.trim(), k.trim()),
            None => ("", s.trim()),
        };
        if key.is_empty() {
            return Err(crate::error::CoreError::MalformedTableKey(s.to_string()));
        }
        let table = if table.is_empty() {
            Self::GLOBAL
        } else {
            StringHash::hash(table)
        };
        Ok(TableKey {
            table,
            key: StringHash::hash(key),
        })
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table, self.key)
    }
}
