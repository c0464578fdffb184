//! Change notifications emitted by core state mutations.
//!
//! Mutators push onto an [`EventQueue`] passed in by the caller; the
//! session orchestrator drains the queue and relays to collaborators
//! (renderers, audio, analytics). Nothing in the core reacts to its own
//! events.

use crate::id::{StringHash, TableKey};

/// A notification emitted by the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A variable changed value.
    VariableUpdated {
        /// The affected variable slot.
        key: TableKey,
    },
    /// A batch stat adjustment landed. Emitted at most once per batch,
    /// after all deltas are computed.
    StatsUpdated {
        /// Net clamped change per stat, in catalog order.
        deltas: Vec<i32>,
    },
    /// The time budget changed.
    TimeChanged {
        /// Remaining budget in hours.
        hours: f32,
        /// Signed change in hours.
        delta: f32,
    },
    /// The time budget reached exactly zero. Always preceded by the
    /// matching [`Event::TimeChanged`] within the same step.
    TimeExpired,
    /// The player's location changed.
    LocationUpdated {
        /// The new location id.
        location: StringHash,
    },
    /// A story fragment was collected.
    InventoryUpdated {
        /// The collected fragment id.
        fragment: StringHash,
    },
    /// A level was set up and is ready to run.
    LevelStarted {
        /// The level index.
        level_index: u32,
    },
    /// The engine asks the collaborator layer to persist the current
    /// player state as the checkpoint.
    CheckpointRequested {
        /// The node the checkpoint resumes at.
        node: StringHash,
    },
    /// A checkpoint save completed.
    CheckpointSaved,
    /// A choice was selected and its cost applied.
    ChoiceCompleted {
        /// The chosen option's target node.
        target: StringHash,
    },
    /// The execution cursor entered a node.
    NodeEntered {
        /// The node id.
        node: StringHash,
        /// Whether this is the first visit in the current level.
        first_visit: bool,
        /// Whether the node asks the display to clear on entry.
        clears_display: bool,
    },
    /// The execution cursor left a node.
    NodeExited {
        /// The node id.
        node: StringHash,
    },
    /// The active thread ran out of nodes to execute.
    ThreadStopped {
        /// The node the thread ended on.
        node: StringHash,
    },
}

/// A drainable queue of [`Event`]s.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<Event>,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Remove and return all queued events, oldest first.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// The queued events, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
