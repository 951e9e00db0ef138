//! Engine configuration
//!
//! Loaded once at level start. Every field has a default, so a JSON document
//! only needs the values it overrides:
//!
//! ```
//! use tile_match_core::EngineConfig;
//! use tile_match_core::types::GameMode;
//!
//! let config = EngineConfig::from_json_str(r#"{"mode":"cascade","rows":4,"timing":{"refill_delay_ms":500}}"#).unwrap();
//! assert_eq!(config.mode, GameMode::Cascade);
//! assert_eq!(config.rows, 4);
//! assert_eq!(config.timing.refill_delay_ms, 500);
//! assert_eq!(config.timing.combo_window_ms, 2000);
//! ```
//!
//! # Environment Variables
//!
//! [`EngineConfig::apply_env`] overrides a loaded config:
//!
//! - `TILE_MATCH_SEED`: RNG seed
//! - `TILE_MATCH_MODE`: game mode (`classic`, `time_attack`, `endless`, `zen`, `cascade`)
//! - `TILE_MATCH_ROWS` / `TILE_MATCH_COLS`: grid dimensions

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("board must have at least one row and one column (got {rows}x{cols})")]
    ZeroDimension { rows: usize, cols: usize },
    #[error("timing value `{0}` must be greater than zero")]
    ZeroDelay(&'static str),
    #[error("probability `{name}` must be within [0, 1] (got {value})")]
    Probability { name: &'static str, value: f64 },
    #[error("at least 3 regular item kinds are required (got {0})")]
    TooFewKinds(u8),
    #[error("level target {0} is not a regular kind below the configured kind count")]
    InvalidTarget(ItemKind),
    #[error("level targets must name three distinct kinds")]
    DuplicateTarget,
    #[error("time attack mode requires a non-zero time limit")]
    MissingTimeLimit,
}

/// Delays and periods, in milliseconds of session time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub combo_window_ms: u64,
    pub refill_delay_ms: u64,
    pub elimination_grace_ms: u64,
    pub match_check_delay_ms: u64,
    pub cascade_fall_ms: u64,
    pub consistency_interval_ms: u64,
    pub initial_scan_delay_ms: u64,
    pub starvation_interval_ms: u64,
    pub scan_stagger_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            combo_window_ms: COMBO_WINDOW_MS,
            refill_delay_ms: REFILL_DELAY_MS,
            elimination_grace_ms: ELIMINATION_GRACE_MS,
            match_check_delay_ms: MATCH_CHECK_DELAY_MS,
            cascade_fall_ms: CASCADE_FALL_MS,
            consistency_interval_ms: CONSISTENCY_INTERVAL_MS,
            initial_scan_delay_ms: INITIAL_SCAN_DELAY_MS,
            starvation_interval_ms: STARVATION_INTERVAL_MS,
            scan_stagger_ms: SCAN_STAGGER_MS,
        }
    }
}

/// Spawn odds for initial population and refills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Chance that each slot is filled when the board is first populated.
    pub initial_fill_ratio: f64,
    /// Chance to pick an incomplete target kind during initial population.
    pub initial_target_probability: f64,
    /// Chance to pick an incomplete target kind during a refill.
    pub refill_target_probability: f64,
    /// Chance that a random (non-target) pick becomes an obstacle.
    pub obstacle_probability: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            initial_fill_ratio: 0.6,
            initial_target_probability: 0.3,
            refill_target_probability: 0.4,
            obstacle_probability: 0.05,
        }
    }
}

/// Rule toggles and deadlock thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Three identical obstacles in one cell count as a match.
    pub obstacles_self_match: bool,
    /// Run the true-deadlock check every N successful placements (0 disables).
    pub deadlock_check_every: u32,
    pub deadlock_skip_empty_ratio: f64,
    pub deadlock_reshuffle_empty_ratio: f64,
    /// Periodic helper drop when no kind has three live items.
    pub starvation_check: bool,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            obstacles_self_match: true,
            deadlock_check_every: DEADLOCK_CHECK_EVERY,
            deadlock_skip_empty_ratio: DEADLOCK_SKIP_EMPTY_RATIO,
            deadlock_reshuffle_empty_ratio: DEADLOCK_RESHUFFLE_EMPTY_RATIO,
            starvation_check: true,
        }
    }
}

/// Complete per-level configuration surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rows: usize,
    pub cols: usize,
    pub mode: GameMode,
    pub seed: u32,
    /// Number of regular kinds (`r0` .. `r{N-1}`).
    pub regular_kinds: u8,
    /// Move budget in classic mode; 0 means unlimited.
    pub max_moves: u32,
    /// Time budget in time attack mode.
    pub time_limit_ms: u64,
    /// Fixed targets (e.g. mirrored from an opponent); chosen randomly when absent.
    pub targets: Option<[LevelTarget; 3]>,
    pub target_min_required: u32,
    pub target_max_required: u32,
    pub timing: TimingConfig,
    pub spawn: SpawnConfig,
    pub rules: RuleConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            mode: GameMode::Classic,
            seed: 1,
            regular_kinds: DEFAULT_REGULAR_KINDS,
            max_moves: 40,
            time_limit_ms: 120_000,
            targets: None,
            target_min_required: 6,
            target_max_required: 15,
            timing: TimingConfig::default(),
            spawn: SpawnConfig::default(),
            rules: RuleConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Apply `TILE_MATCH_*` environment overrides. Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        use std::env;

        if let Some(seed) = env::var("TILE_MATCH_SEED").ok().and_then(|s| s.parse().ok()) {
            self.seed = seed;
        }
        if let Some(mode) = env::var("TILE_MATCH_MODE")
            .ok()
            .and_then(|s| GameMode::from_str(s.trim()))
        {
            self.mode = mode;
        }
        if let Some(rows) = env::var("TILE_MATCH_ROWS").ok().and_then(|s| s.parse().ok()) {
            self.rows = rows;
        }
        if let Some(cols) = env::var("TILE_MATCH_COLS").ok().and_then(|s| s.parse().ok()) {
            self.cols = cols;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::ZeroDimension {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.regular_kinds < 3 {
            return Err(ConfigError::TooFewKinds(self.regular_kinds));
        }

        let t = &self.timing;
        for (name, value) in [
            ("combo_window_ms", t.combo_window_ms),
            ("refill_delay_ms", t.refill_delay_ms),
            ("elimination_grace_ms", t.elimination_grace_ms),
            ("match_check_delay_ms", t.match_check_delay_ms),
            ("cascade_fall_ms", t.cascade_fall_ms),
            ("consistency_interval_ms", t.consistency_interval_ms),
            ("initial_scan_delay_ms", t.initial_scan_delay_ms),
            ("starvation_interval_ms", t.starvation_interval_ms),
            ("scan_stagger_ms", t.scan_stagger_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDelay(name));
            }
        }

        let s = &self.spawn;
        let r = &self.rules;
        for (name, value) in [
            ("initial_fill_ratio", s.initial_fill_ratio),
            ("initial_target_probability", s.initial_target_probability),
            ("refill_target_probability", s.refill_target_probability),
            ("obstacle_probability", s.obstacle_probability),
            ("deadlock_skip_empty_ratio", r.deadlock_skip_empty_ratio),
            ("deadlock_reshuffle_empty_ratio", r.deadlock_reshuffle_empty_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }

        if let Some(targets) = &self.targets {
            for target in targets {
                match target.kind {
                    ItemKind::Regular(n) if n < self.regular_kinds => {}
                    other => return Err(ConfigError::InvalidTarget(other)),
                }
            }
            if targets[0].kind == targets[1].kind
                || targets[1].kind == targets[2].kind
                || targets[0].kind == targets[2].kind
            {
                return Err(ConfigError::DuplicateTarget);
            }
        }

        if self.mode == GameMode::TimeAttack && self.time_limit_ms == 0 {
            return Err(ConfigError::MissingTimeLimit);
        }

        Ok(())
    }
}
