//! Core engine module - pure, deterministic, and testable
//!
//! This crate contains the grid model, the elimination pipeline and every
//! safeguard around it. It has **no dependencies** on rendering, input,
//! networking or wall-clock time:
//!
//! - **Deterministic**: same config and seed produce the same session
//! - **Time-virtualized**: every delay is a task in a virtual-millisecond queue
//! - **Self-contained**: one [`GameSession`] per level, no global state
//!
//! # Module Structure
//!
//! - [`board`] / [`cell`] / [`item`]: R x C grid of three-slot cells
//! - [`matching`]: match detection (three identical kinds in one cell)
//! - [`combo`]: time-windowed combo counter
//! - [`scoring`]: elimination points per game mode
//! - [`refill`]: target-biased refill odds
//! - [`obstacle`]: unlocking obstacles next to eliminations
//! - [`cascade`]: gravity for cascade mode
//! - [`deadlock`]: starvation helper drops and deadlock reshuffles
//! - [`consistency`]: periodic self-repair and missed-match recovery
//! - [`scheduler`]: virtual-time task queue
//! - [`session`]: the per-level context tying it all together
//!
//! # Example
//!
//! ```
//! use tile_match_core::{EngineConfig, GameSession};
//! use tile_match_core::types::{ItemKind, Position};
//!
//! let mut config = EngineConfig::default();
//! config.spawn.initial_fill_ratio = 0.0;
//!
//! let mut session = GameSession::new(config).unwrap();
//! session.start();
//!
//! let pos = Position::new(0, 0);
//! let a = ItemKind::Regular(0);
//! session.seed_cell(pos, [Some(a), Some(a), None]);
//! session.place_item(pos, 2, a);
//!
//! // The match check runs 100ms after placement.
//! session.tick(100);
//! assert_eq!(session.eliminated_counts().get(a), 3);
//! assert_eq!(session.score(), 100);
//! ```

pub mod board;
pub mod cascade;
pub mod cell;
pub mod combo;
pub mod config;
pub mod consistency;
pub mod deadlock;
pub mod item;
pub mod matching;
pub mod obstacle;
pub mod refill;
pub mod rng;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod targets;

pub use tile_match_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use cell::{Cell, CellPhase};
pub use combo::ComboTracker;
pub use config::{ConfigError, EngineConfig, RuleConfig, SpawnConfig, TimingConfig};
pub use deadlock::DeadlockVerdict;
pub use item::{Item, ItemIdAlloc};
pub use refill::RefillPolicy;
pub use rng::SimpleRng;
pub use scheduler::Scheduler;
pub use scoring::{calculate_score, ScoreResult};
pub use session::{GameSession, Task};
pub use snapshot::{BoardSnapshot, CellSnapshot, StatsSnapshot};
pub use targets::EliminatedCounts;
