//! The player's remaining time budget.
//!
//! Stored as whole minutes in an unsigned integer, so the budget can
//! never go negative; the public API speaks fractional hours. Amounts
//! under one minute round to zero and are treated as free.

use serde::{Deserialize, Serialize};

const MINUTES_PER_HOUR: f32 = 60.0;

/// The outcome of a budget mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeShift {
    /// Signed change in minutes actually applied (after clamping).
    pub delta_minutes: i64,
    /// Whether this mutation took the budget from above zero to exactly
    /// zero.
    pub crossed_zero: bool,
}

impl TimeShift {
    /// Whether the budget value changed at all.
    pub fn changed(self) -> bool {
        self.delta_minutes != 0
    }

    /// The applied change in hours.
    pub fn delta_hours(self) -> f32 {
        self.delta_minutes as f32 / MINUTES_PER_HOUR
    }
}

/// A minute-granular, never-negative time budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBudget {
    minutes: u32,
}

impl TimeBudget {
    /// A budget of the given hours; negative input clamps to zero.
    pub fn from_hours(hours: f32) -> Self {
        Self {
            minutes: Self::to_minutes(hours),
        }
    }

    /// Remaining budget in hours.
    pub fn hours(self) -> f32 {
        self.minutes as f32 / MINUTES_PER_HOUR
    }

    /// Remaining budget in minutes.
    pub fn minutes(self) -> u32 {
        self.minutes
    }

    /// Whether the budget covers a cost of the given hours. Costs under
    /// one minute of granularity are always affordable.
    pub fn has(self, hours: f32) -> bool {
        Self::to_minutes(hours) <= self.minutes
    }

    /// Whether the budget is exhausted.
    pub fn is_exhausted(self) -> bool {
        self.minutes == 0
    }

    /// Replace the budget with the given hours.
    pub fn set_hours(&mut self, hours: f32) -> TimeShift {
        let before = self.minutes;
        self.minutes = Self::to_minutes(hours);
        self.shift_from(before)
    }

    /// Subtract a cost in hours, clamping at zero.
    pub fn subtract(&mut self, hours: f32) -> TimeShift {
        let before = self.minutes;
        self.minutes = before.saturating_sub(Self::to_minutes(hours));
        self.shift_from(before)
    }

    /// Grant additional hours.
    pub fn add(&mut self, hours: f32) -> TimeShift {
        let before = self.minutes;
        self.minutes = before.saturating_add(Self::to_minutes(hours));
        self.shift_from(before)
    }

    fn shift_from(self, before: u32) -> TimeShift {
        TimeShift {
            delta_minutes: i64::from(self.minutes) - i64::from(before),
            crossed_zero: before > 0 && self.minutes == 0,
        }
    }

    fn to_minutes(hours: f32) -> u32 {
        if hours <= 0.0 {
            return 0;
        }
        (hours * MINUTES_PER_HOUR).round() as u32
    }
}
