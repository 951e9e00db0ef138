//! Snapshot module - read-only views for observers and opponents
//!
//! [`BoardSnapshot`] copies every cell's kinds and phase plus the session
//! counters. [`StatsSnapshot`] is the smaller view mirrored to an opponent.

use serde::{Deserialize, Serialize};

use crate::cell::CellPhase;
use crate::targets::EliminatedCounts;
use crate::types::{GameMode, ItemKind, LevelTarget, Outcome, SLOTS_PER_CELL};

/// Read-only view of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub slots: [Option<ItemKind>; SLOTS_PER_CELL],
    pub phase: CellPhase,
}

/// Read-only view of a session, for presentation collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub rows: usize,
    pub cols: usize,
    /// Row-major, `rows * cols` entries.
    pub cells: Vec<CellSnapshot>,
    pub mode: GameMode,
    pub now_ms: u64,
    pub score: u64,
    pub combo: u32,
    pub moves_used: u32,
    /// `None` when moves are unlimited.
    pub moves_left: Option<u32>,
    pub outcome: Option<Outcome>,
}

impl BoardSnapshot {
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellSnapshot> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }

    pub fn playable(&self) -> bool {
        self.outcome.is_none()
    }
}

/// Stats contract consumed by level-flow code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub eliminated_counts: EliminatedCounts,
    pub level_targets: [LevelTarget; 3],
}

impl StatsSnapshot {
    pub fn targets_met(&self) -> bool {
        self.eliminated_counts.all_met(&self.level_targets)
    }
}
