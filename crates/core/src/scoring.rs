//! Scoring module - elimination points per game mode
//!
//! - Classic rules: `BASE_POINTS * combo`.
//! - Cascade rules: `CASCADE_POINTS * combo + CASCADE_BONUS * combo`, rewarding
//!   chain reactions with twice the classic rate.
//!
//! A combo level of 0 never scores.

use crate::types::{GameMode, BASE_POINTS, CASCADE_BONUS, CASCADE_POINTS};

/// Score calculation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    /// Points before any chain bonus.
    pub base: u32,
    /// Cascade chain bonus (zero outside cascade mode).
    pub chain_bonus: u32,
    pub total: u32,
}

/// Calculate the score delta of one elimination.
pub fn calculate_score(mode: GameMode, combo: u32) -> ScoreResult {
    if mode.has_gravity() {
        let base = CASCADE_POINTS.saturating_mul(combo);
        let chain_bonus = CASCADE_BONUS.saturating_mul(combo);
        ScoreResult {
            base,
            chain_bonus,
            total: base.saturating_add(chain_bonus),
        }
    } else {
        let base = BASE_POINTS.saturating_mul(combo);
        ScoreResult {
            base,
            chain_bonus: 0,
            total: base,
        }
    }
}
