//! Configuration for the execution engine.

/// Tunable engine behavior.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum options a decision point may present. Longer available
    /// lists are truncated from the tail with a warning.
    pub max_choices: usize,
    /// Headless mode: an empty available-option list becomes a hard
    /// error instead of being surfaced to the caller.
    pub headless: bool,
    /// Threads are expected to end on a node whose name ends with this
    /// suffix (case-insensitive); other endings log a soft warning.
    pub terminal_suffix: String,
    /// Maximum steps one `advance` may execute before the thread is
    /// declared runaway. Guards against goto cycles that never suspend.
    pub step_budget: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_choices: 4,
            headless: false,
            terminal_suffix: "feedback".to_string(),
            step_budget: 10_000,
        }
    }
}

impl EngineConfig {
    /// Set the maximum presented option count.
    pub fn with_max_choices(mut self, max_choices: usize) -> Self {
        self.max_choices = max_choices;
        self
    }

    /// Enable or disable headless mode.
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the terminal-node name suffix.
    pub fn with_terminal_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.terminal_suffix = suffix.into();
        self
    }

    /// Set the per-advance step budget.
    pub fn with_step_budget(mut self, step_budget: usize) -> Self {
        self.step_budget = step_budget;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_choices, 4);
        assert!(!cfg.headless);
        assert_eq!(cfg.terminal_suffix, "feedback");
        assert_eq!(cfg.step_budget, 10_000);
    }

    #[test]
    fn builder_methods() {
        let cfg = EngineConfig::default()
            .with_max_choices(6)
            .with_headless(true)
            .with_terminal_suffix("ending")
            .with_step_budget(500);
        assert_eq!(cfg.max_choices, 6);
        assert!(cfg.headless);
        assert_eq!(cfg.terminal_suffix, "ending");
        assert_eq!(cfg.step_budget, 500);
    }
}
