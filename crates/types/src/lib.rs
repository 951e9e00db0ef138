//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the engine.
//! All types are plain data with no behavior beyond parsing and formatting,
//! making them usable in any context (core logic, request layer, adapter
//! protocol, presentation collaborators).
//!
//! # Grid Model
//!
//! - A board is `rows x cols` cells, row 0 at the top.
//! - Each cell holds [`SLOTS_PER_CELL`] independent item slots.
//! - A cell whose three slots hold the same [`ItemKind`] is a match.
//!
//! # Timing Constants
//!
//! Timing values are in milliseconds of virtual session time:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `COMBO_WINDOW_MS` | 2000 | Idle window before the combo resets |
//! | `REFILL_DELAY_MS` | 800 | Elimination to refill |
//! | `ELIMINATION_GRACE_MS` | 300 | Cell stays locked after a clear |
//! | `MATCH_CHECK_DELAY_MS` | 100 | Placement to match check |
//! | `CASCADE_FALL_MS` | 200 | Fall animation window |
//! | `CONSISTENCY_INTERVAL_MS` | 3000 | Periodic full-board re-scan |
//! | `INITIAL_SCAN_DELAY_MS` | 500 | First re-scan after population |
//! | `STARVATION_INTERVAL_MS` | 5000 | Helper-drop check cadence |
//! | `SCAN_STAGGER_MS` | 100 | Spacing of scanner-driven eliminations |
//!
//! # Examples
//!
//! ```
//! use tile_match_types::{GameMode, ItemKind, ObstacleKind};
//!
//! let kind: ItemKind = "r3".parse().unwrap();
//! assert_eq!(kind, ItemKind::Regular(3));
//! assert_eq!(ItemKind::Obstacle(ObstacleKind::Ice).to_string(), "ice");
//!
//! assert_eq!(GameMode::from_str("time_attack"), Some(GameMode::TimeAttack));
//! assert!(GameMode::Cascade.has_gravity());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Item slots per cell.
pub const SLOTS_PER_CELL: usize = 3;

/// Default board rows.
pub const DEFAULT_ROWS: usize = 6;

/// Default board columns.
pub const DEFAULT_COLS: usize = 5;

/// Default number of regular item kinds.
pub const DEFAULT_REGULAR_KINDS: u8 = 8;

/// Base points per elimination at combo level 1 (classic rules).
pub const BASE_POINTS: u32 = 100;

/// Cascade-mode points per combo level.
pub const CASCADE_POINTS: u32 = 150;

/// Cascade-mode chain bonus per combo level.
pub const CASCADE_BONUS: u32 = 50;

pub const COMBO_WINDOW_MS: u64 = 2000;
pub const REFILL_DELAY_MS: u64 = 800;
pub const ELIMINATION_GRACE_MS: u64 = 300;
pub const MATCH_CHECK_DELAY_MS: u64 = 100;
pub const CASCADE_FALL_MS: u64 = 200;
pub const CONSISTENCY_INTERVAL_MS: u64 = 3000;
pub const INITIAL_SCAN_DELAY_MS: u64 = 500;
pub const STARVATION_INTERVAL_MS: u64 = 5000;
pub const SCAN_STAGGER_MS: u64 = 100;

/// Every Nth successful placement runs the deadlock check.
pub const DEADLOCK_CHECK_EVERY: u32 = 5;

/// Deadlock check is skipped above this empty-slot ratio.
pub const DEADLOCK_SKIP_EMPTY_RATIO: f64 = 0.30;

/// Reshuffle only happens below this empty-slot ratio.
pub const DEADLOCK_RESHUFFLE_EMPTY_RATIO: f64 = 0.20;

/// The three obstacle kinds.
///
/// Obstacles occupy slots but cannot be dragged; an elimination in any of the
/// eight neighbouring cells unlocks them into a regular kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    Stone,
    Ice,
    Vine,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 3] = [ObstacleKind::Stone, ObstacleKind::Ice, ObstacleKind::Vine];

    /// Parse obstacle kind from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stone" => Some(ObstacleKind::Stone),
            "ice" => Some(ObstacleKind::Ice),
            "vine" => Some(ObstacleKind::Vine),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleKind::Stone => "stone",
            ObstacleKind::Ice => "ice",
            ObstacleKind::Vine => "vine",
        }
    }
}

/// Kind of item occupying a slot.
///
/// Regular kinds are numbered `0..N` where `N` comes from configuration.
/// The string form is `r<N>` for regular kinds and the obstacle name
/// otherwise, which keeps kinds usable as JSON object keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Regular(u8),
    Obstacle(ObstacleKind),
}

impl ItemKind {
    pub fn is_obstacle(&self) -> bool {
        matches!(self, ItemKind::Obstacle(_))
    }

    pub fn is_regular(&self) -> bool {
        matches!(self, ItemKind::Regular(_))
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Regular(n) => write!(f, "r{}", n),
            ItemKind::Obstacle(o) => f.write_str(o.as_str()),
        }
    }
}

/// Error returned when an item kind string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid item kind")]
pub struct ParseItemKindError;

impl FromStr for ItemKind {
    type Err = ParseItemKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(obstacle) = ObstacleKind::from_str(s) {
            return Ok(ItemKind::Obstacle(obstacle));
        }
        let digits = s
            .strip_prefix('r')
            .or_else(|| s.strip_prefix('R'))
            .ok_or(ParseItemKindError)?;
        digits
            .parse::<u8>()
            .map(ItemKind::Regular)
            .map_err(|_| ParseItemKindError)
    }
}

impl Serialize for ItemKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid item kind: {}", s)))
    }
}

/// Stable identifier of a live item. Ids are never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

/// Cell coordinates. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Game mode rule sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Classic,
    TimeAttack,
    Endless,
    Zen,
    Cascade,
}

impl GameMode {
    /// Parse mode from string (case-insensitive, `-` and `_` accepted)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "classic" => Some(GameMode::Classic),
            "time_attack" => Some(GameMode::TimeAttack),
            "endless" => Some(GameMode::Endless),
            "zen" => Some(GameMode::Zen),
            "cascade" => Some(GameMode::Cascade),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::TimeAttack => "time_attack",
            GameMode::Endless => "endless",
            GameMode::Zen => "zen",
            GameMode::Cascade => "cascade",
        }
    }

    /// Only classic and time attack end with victory or defeat.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameMode::Classic | GameMode::TimeAttack)
    }

    /// Items fall into emptied cells below.
    pub fn has_gravity(&self) -> bool {
        matches!(self, GameMode::Cascade)
    }
}

/// One of the three (kind, count) objectives of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelTarget {
    pub kind: ItemKind,
    pub required: u32,
}

impl LevelTarget {
    pub const fn new(kind: ItemKind, required: u32) -> Self {
        Self { kind, required }
    }
}

/// Why a terminal session was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefeatReason {
    OutOfMoves,
    TimeUp,
}

/// Terminal result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Victory,
    Defeat(DefeatReason),
}

/// Payload of a single cell clear, for animation and stats observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EliminationEvent {
    pub row: usize,
    pub col: usize,
    pub kind: ItemKind,
    pub score_delta: u32,
    pub combo: u32,
}

/// Events emitted by a session for the presentation layer.
///
/// Drained with `GameSession::take_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    Eliminated(EliminationEvent),
    Refilled {
        row: usize,
        col: usize,
        kinds: Vec<ItemKind>,
    },
    ObstacleUnlocked {
        row: usize,
        col: usize,
        slot: u8,
        from: ObstacleKind,
        to: ItemKind,
    },
    ItemFell {
        item: ItemId,
        from: Position,
        to: Position,
        slot: u8,
    },
    HelperDrop {
        kind: ItemKind,
        positions: Vec<Position>,
    },
    Reshuffled {
        items: u32,
    },
    Desynced {
        row: usize,
        col: usize,
    },
    Victory {
        score: u64,
    },
    Defeat {
        reason: DefeatReason,
    },
}
