//! Combo tracking - time-windowed chain counter feeding the score formula.

use serde::{Deserialize, Serialize};

/// Combo counter with a single re-armable reset deadline.
///
/// Each elimination either extends the chain (inside the window) or restarts
/// it at 1, and moves the reset deadline to `now + window`. There is never
/// more than one live deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboTracker {
    window_ms: u64,
    combo: u32,
    last_elimination_ms: Option<u64>,
    reset_at_ms: Option<u64>,
}

impl ComboTracker {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            combo: 0,
            last_elimination_ms: None,
            reset_at_ms: None,
        }
    }

    /// Register an elimination at `now_ms` and return the resulting combo level.
    pub fn on_elimination(&mut self, now_ms: u64) -> u32 {
        let within_window = self
            .last_elimination_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < self.window_ms);

        if self.combo > 0 && within_window {
            self.combo += 1;
        } else {
            self.combo = 1;
        }

        self.last_elimination_ms = Some(now_ms);
        self.reset_at_ms = Some(now_ms.saturating_add(self.window_ms));
        self.combo
    }

    /// Fire the reset deadline if it has passed. Returns true if the combo was reset.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        match self.reset_at_ms {
            Some(deadline) if now_ms >= deadline => {
                self.combo = 0;
                self.reset_at_ms = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending reset deadline (level teardown).
    pub fn cancel(&mut self) {
        self.reset_at_ms = None;
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn last_elimination_ms(&self) -> Option<u64> {
        self.last_elimination_ms
    }

    pub fn reset_deadline_ms(&self) -> Option<u64> {
        self.reset_at_ms
    }
}
