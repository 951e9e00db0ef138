//! Tile-match grid engine (workspace facade crate).
//!
//! This package exposes `tile_match::{core,engine,adapter,types}` while the
//! implementation lives in dedicated crates under `crates/`.

pub use tile_match_adapter as adapter;
pub use tile_match_core as core;
pub use tile_match_engine as engine;
pub use tile_match_types as types;
