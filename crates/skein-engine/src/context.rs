//! The session context threaded through every engine operation.
//!
//! There is deliberately no global player state or static event
//! dispatcher: every operation takes this context, so independent
//! sessions (and tests) run in full isolation.

use skein_core::{EventQueue, PlayerState};

/// The mutable state one session operates on: the player record and the
/// notification queue mutations push onto.
#[derive(Debug)]
pub struct SessionContext {
    /// The active save.
    pub player: PlayerState,
    /// Notifications awaiting relay to collaborators.
    pub events: EventQueue,
}

impl SessionContext {
    /// Wrap a player state with an empty notification queue.
    pub fn new(player: PlayerState) -> Self {
        Self {
            player,
            events: EventQueue::new(),
        }
    }
}
