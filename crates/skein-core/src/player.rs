//! The mutable player save record.
//!
//! One `PlayerState` lives for the duration of one active save; new-game
//! and load replace it wholesale. Mutators clamp numeric input rather
//! than rejecting it and push change notifications onto the caller's
//! [`EventQueue`]. Node visitation is recorded here but driven by the
//! execution engine.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::event::{Event, EventQueue};
use crate::id::StringHash;
use crate::level::LevelDef;
use crate::stats::{StatCatalog, parse_adjustments};
use crate::time::{TimeBudget, TimeShift};
use crate::variable::VariableStore;

/// The player's full mutable state: stats, time budget, visitation,
/// fragment inventory, and variable tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    catalog: StatCatalog,
    stats: Vec<u16>,
    time: TimeBudget,
    visited: HashSet<StringHash>,
    checkpoint_node: StringHash,
    location: StringHash,
    fragments: Vec<StringHash>,
    fragment_slots: Vec<StringHash>,
    level_index: u32,
    story_group: StringHash,
    level_active: bool,
    vars: VariableStore,
    city_score: i32,
}

impl PlayerState {
    /// A fresh save with every stat at zero and no level set up.
    pub fn new(catalog: StatCatalog) -> Self {
        let stats = vec![0; catalog.len()];
        Self {
            catalog,
            stats,
            time: TimeBudget::default(),
            visited: HashSet::new(),
            checkpoint_node: StringHash::EMPTY,
            location: StringHash::EMPTY,
            fragments: Vec::new(),
            fragment_slots: Vec::new(),
            level_index: 0,
            story_group: StringHash::EMPTY,
            level_active: false,
            vars: VariableStore::new(),
            city_score: 0,
        }
    }

    /// The stat catalog this save was created against.
    pub fn catalog(&self) -> &StatCatalog {
        &self.catalog
    }

    /// Current stat values in catalog order.
    pub fn stat_values(&self) -> &[u16] {
        &self.stats
    }

    /// The current value of a stat. Unknown ids are an authoring error.
    pub fn stat(&self, id: StringHash) -> CoreResult<u16> {
        let index = self
            .catalog
            .index_of(id)
            .ok_or(CoreError::UnknownStat(id))?;
        Ok(self.stats[index])
    }

    /// Set a stat, clamping into `[0, max]`. Returns whether the clamped
    /// value differs from the prior one; a change emits a one-entry
    /// stats notification.
    pub fn set_stat(
        &mut self,
        id: StringHash,
        value: i64,
        events: &mut EventQueue,
    ) -> CoreResult<bool> {
        let index = self
            .catalog
            .index_of(id)
            .ok_or(CoreError::UnknownStat(id))?;
        let clamped = self.catalog.clamp(value);
        let previous = self.stats[index];
        if clamped == previous {
            return Ok(false);
        }
        self.stats[index] = clamped;
        let mut deltas = vec![0i32; self.stats.len()];
        deltas[index] = i32::from(clamped) - i32::from(previous);
        events.push(Event::StatsUpdated { deltas });
        Ok(true)
    }

    /// Apply a batch adjustment spec like `"Nerve+2 Grit-1"`.
    ///
    /// The whole spec is validated before any stat changes, so a
    /// malformed token never leaves a half-applied batch. Adjustments
    /// apply sequentially with clamping at each step; the returned delta
    /// vector holds the net clamped change per stat. If `notify` and any
    /// delta is non-zero, a single batched [`Event::StatsUpdated`] is
    /// emitted after all deltas are computed.
    pub fn adjust_stats(
        &mut self,
        spec: &str,
        notify: bool,
        events: &mut EventQueue,
    ) -> CoreResult<Vec<i32>> {
        let adjustments = parse_adjustments(&self.catalog, spec)?;
        let mut deltas = vec![0i32; self.stats.len()];
        for adjustment in adjustments {
            let current = self.stats[adjustment.index];
            let next = self.catalog.clamp(adjustment.apply_to(current));
            deltas[adjustment.index] += i32::from(next) - i32::from(current);
            self.stats[adjustment.index] = next;
        }
        if notify && deltas.iter().any(|d| *d != 0) {
            events.push(Event::StatsUpdated {
                deltas: deltas.clone(),
            });
        }
        Ok(deltas)
    }

    /// The remaining time budget.
    pub fn time(&self) -> TimeBudget {
        self.time
    }

    /// Remaining time in hours.
    pub fn time_remaining_hours(&self) -> f32 {
        self.time.hours()
    }

    /// Whether the budget covers a cost of the given hours.
    pub fn has_time(&self, hours: f32) -> bool {
        self.time.has(hours)
    }

    /// Replace the time budget.
    pub fn set_time_remaining(&mut self, hours: f32, events: &mut EventQueue) {
        let shift = self.time.set_hours(hours);
        self.push_time_events(shift, events);
    }

    /// Spend time, clamping at zero. Reaching exactly zero emits
    /// [`Event::TimeExpired`] after the generic change notification.
    pub fn decrease_time(&mut self, hours: f32, events: &mut EventQueue) {
        let shift = self.time.subtract(hours);
        self.push_time_events(shift, events);
    }

    /// Grant additional time.
    pub fn increase_time(&mut self, hours: f32, events: &mut EventQueue) {
        let shift = self.time.add(hours);
        self.push_time_events(shift, events);
    }

    fn push_time_events(&self, shift: TimeShift, events: &mut EventQueue) {
        if shift.changed() {
            events.push(Event::TimeChanged {
                hours: self.time.hours(),
                delta: shift.delta_hours(),
            });
        }
        if shift.crossed_zero {
            events.push(Event::TimeExpired);
        }
    }

    /// Whether a node has been visited in the current level.
    pub fn visited(&self, node: StringHash) -> bool {
        self.visited.contains(&node)
    }

    /// Record a node visit. Returns true on the first visit.
    pub fn mark_visited(&mut self, node: StringHash) -> bool {
        self.visited.insert(node)
    }

    /// The last checkpointed node, or the empty hash before the first
    /// checkpoint.
    pub fn checkpoint_node(&self) -> StringHash {
        self.checkpoint_node
    }

    /// Point the checkpoint at a node.
    pub fn set_checkpoint(&mut self, node: StringHash) {
        self.checkpoint_node = node;
    }

    /// The player's current location.
    pub fn location(&self) -> StringHash {
        self.location
    }

    /// Move the player. Notifies only when the location actually differs.
    pub fn set_location(&mut self, location: StringHash, events: &mut EventQueue) -> bool {
        if self.location == location {
            return false;
        }
        self.location = location;
        events.push(Event::LocationUpdated { location });
        true
    }

    /// Collected fragments in collection order.
    pub fn fragments(&self) -> &[StringHash] {
        &self.fragments
    }

    /// Whether a fragment has been collected.
    pub fn has_story_fragment(&self, id: StringHash) -> bool {
        self.fragments.contains(&id)
    }

    /// Collect a fragment. Returns false without notifying if it was
    /// already collected.
    pub fn add_story_fragment(&mut self, id: StringHash, events: &mut EventQueue) -> bool {
        if self.fragments.contains(&id) {
            return false;
        }
        self.fragments.push(id);
        events.push(Event::InventoryUpdated { fragment: id });
        true
    }

    /// Whether a fragment is placed in one of the level's slots.
    pub fn included_story_fragment(&self, id: StringHash) -> bool {
        !id.is_empty() && self.fragment_slots.contains(&id)
    }

    /// The level's fragment slots; empty hashes mean unfilled.
    pub fn fragment_slots(&self) -> &[StringHash] {
        &self.fragment_slots
    }

    /// Place a collected fragment into a slot. Placing a fragment that
    /// was never collected is an authoring error.
    pub fn allocate_fragment(&mut self, slot: usize, id: StringHash) -> CoreResult<()> {
        if slot >= self.fragment_slots.len() {
            return Err(CoreError::SlotOutOfRange {
                slot,
                len: self.fragment_slots.len(),
            });
        }
        if !id.is_empty() && !self.has_story_fragment(id) {
            return Err(CoreError::FragmentNotCollected(id));
        }
        self.fragment_slots[slot] = id;
        Ok(())
    }

    /// The current level index.
    pub fn level_index(&self) -> u32 {
        self.level_index
    }

    /// The current story group.
    pub fn story_group(&self) -> StringHash {
        self.story_group
    }

    /// The variable tables.
    pub fn vars(&self) -> &VariableStore {
        &self.vars
    }

    /// Mutable access to the variable tables.
    pub fn vars_mut(&mut self) -> &mut VariableStore {
        &mut self.vars
    }

    /// The city score.
    pub fn city_score(&self) -> i32 {
        self.city_score
    }

    /// Adjust the city score by a signed delta.
    pub fn add_city_score(&mut self, delta: i32) {
        self.city_score = self.city_score.saturating_add(delta);
    }

    /// Switch the save to a level.
    ///
    /// On a level-identity change this resets checkpoint, location,
    /// visited nodes, time, fragments, and slots to the level's
    /// defaults; if a level was already active, a snapshot of the state
    /// *before* the switch is returned so the caller can checkpoint it.
    /// A story-group change clears the fragment inventory even when the
    /// level index is unchanged — fragments are scoped to the group, not
    /// the level.
    pub fn setup_level(&mut self, def: &LevelDef, events: &mut EventQueue) -> Option<PlayerState> {
        let level_changed = !self.level_active || self.level_index != def.level_index;
        let group_changed = self.story_group != def.story_group;

        let mut prior = None;
        if level_changed {
            if self.level_active {
                prior = Some(self.clone());
            }
            self.fragments.clear();
            self.visited.clear();
            self.checkpoint_node = StringHash::EMPTY;
            self.location = def.start_location;
            self.time = TimeBudget::from_hours(def.start_time_hours);
            self.level_index = def.level_index;
            self.fragment_slots = vec![StringHash::EMPTY; def.slot_count];
        }
        if group_changed {
            // Slots go with the inventory: a placement can never
            // outlive the collection that backed it.
            self.fragments.clear();
            self.fragment_slots = vec![StringHash::EMPTY; def.slot_count];
            self.story_group = def.story_group;
        }
        self.level_active = true;

        events.push(Event::LevelStarted {
            level_index: def.level_index,
        });
        prior
    }
}
