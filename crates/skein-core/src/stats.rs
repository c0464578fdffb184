//! Stat catalogs and batch adjustments.
//!
//! A level's script declares an ordered catalog of stat names; the
//! player holds one clamped `u16` value per catalog entry. Scripts
//! mutate stats through compact batch specs like `"Nerve+2 Grit-1"`,
//! which are validated in full before any value changes.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::id::StringHash;

/// An ordered list of stat names with a shared value ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCatalog {
    names: Vec<String>,
    max_value: u16,
}

impl StatCatalog {
    /// Build a catalog from ordered stat names and a value ceiling.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>, max_value: u16) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            max_value,
        }
    }

    /// The number of stats.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The value ceiling shared by every stat.
    pub fn max_value(&self) -> u16 {
        self.max_value
    }

    /// The catalog index for a hashed stat name.
    pub fn index_of(&self, id: StringHash) -> Option<usize> {
        self.names
            .iter()
            .position(|name| StringHash::hash(name) == id)
    }

    /// The stat name at a catalog index.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Clamp a nominal value into the valid stat range.
    pub fn clamp(&self, value: i64) -> u16 {
        value.clamp(0, i64::from(self.max_value)) as u16
    }
}

/// How a single adjustment token mutates its stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatOp {
    /// Replace the value.
    Set,
    /// Add to the value.
    Add,
    /// Subtract from the value.
    Sub,
}

/// One parsed stat adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatAdjustment {
    /// Catalog index of the target stat.
    pub index: usize,
    /// The operation.
    pub op: StatOp,
    /// The operand.
    pub amount: i64,
}

impl StatAdjustment {
    /// The value this adjustment produces from a current value, before
    /// clamping.
    pub fn apply_to(self, current: u16) -> i64 {
        let current = i64::from(current);
        match self.op {
            StatOp::Set => self.amount,
            StatOp::Add => current + self.amount,
            StatOp::Sub => current - self.amount,
        }
    }
}

/// Parse a whitespace-separated batch of `Name(=|+|-)Integer` tokens.
///
/// The entire batch is validated before the caller mutates anything: a
/// malformed token or unknown stat name fails the whole spec. This is a
/// fatal authoring error, not a recoverable runtime condition.
pub fn parse_adjustments(catalog: &StatCatalog, spec: &str) -> CoreResult<Vec<StatAdjustment>> {
    let mut adjustments = Vec::new();
    for token in spec.split_whitespace() {
        let (pos, op) = token
            .char_indices()
            .find_map(|(i, c)| match c {
                '=' => Some((i, StatOp::Set)),
                '+' => Some((i, StatOp::Add)),
                '-' => Some((i, StatOp::Sub)),
                _ => None,
            })
            .ok_or_else(|| CoreError::MalformedStatAdjustment(token.to_string()))?;
        if pos == 0 {
            return Err(CoreError::MalformedStatAdjustment(token.to_string()));
        }
        let name = &token[..pos];
        let amount: i64 = token[pos + 1..]
            .parse()
            .map_err(|_| CoreError::MalformedStatAdjustment(token.to_string()))?;
        let id = StringHash::hash(name);
        let index = catalog.index_of(id).ok_or(CoreError::UnknownStat(id))?;
        adjustments.push(StatAdjustment { index, op, amount });
    }
    Ok(adjustments)
}
