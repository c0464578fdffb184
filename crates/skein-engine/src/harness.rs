//! Automated playthroughs for soak-testing scripts.
//!
//! The auto-player drives a [`Session`] with uniformly random choices
//! from a seeded generator, so a reported failure replays exactly.
//! Scripts that never reach an end node trip the step budget instead of
//! hanging the run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skein_core::StringHash;

use crate::error::{EngineError, EngineResult};
use crate::session::Session;
use crate::thread::Signal;

/// Transcript of one automated run.
#[derive(Debug, Clone, PartialEq)]
pub struct Playthrough {
    /// Every line displayed, in order.
    pub lines: Vec<String>,
    /// The text of each choice taken, in order.
    pub choices_taken: Vec<String>,
    /// The node the thread ended on.
    pub ended_at: StringHash,
}

/// Drives a session to completion with seeded random choices.
#[derive(Debug)]
pub struct AutoPlayer {
    rng: StdRng,
    max_steps: usize,
}

impl AutoPlayer {
    /// An auto-player from a seed, with the default step budget.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_steps: 10_000,
        }
    }

    /// Override the step budget.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Play the session's live thread until it ends, collecting the
    /// transcript.
    ///
    /// The session should be run headless so an authoring dead end (a
    /// decision point with nothing available) fails the run instead of
    /// stalling it.
    pub fn play(&mut self, session: &mut Session) -> EngineResult<Playthrough> {
        let mut lines = Vec::new();
        let mut choices_taken = Vec::new();

        for _ in 0..self.max_steps {
            match session.advance()? {
                Signal::Line { text, .. } => lines.push(text),
                Signal::Choices(options) => {
                    if options.is_empty() {
                        // Non-headless sessions surface the empty list;
                        // the harness cannot wait for different input.
                        return Err(EngineError::NoAvailableChoices {
                            node: session.engine().last_node(),
                        });
                    }
                    let index = self.rng.random_range(0..options.len());
                    choices_taken.push(options[index].text.clone());
                    session.choose(index)?;
                }
                Signal::Ended { node } => {
                    return Ok(Playthrough {
                        lines,
                        choices_taken,
                        ended_at: node,
                    });
                }
            }
        }
        Err(EngineError::RunawayScript {
            limit: self.max_steps,
        })
    }
}
