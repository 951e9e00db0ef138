//! Adapter module - drives a session from async code with a JSON protocol
//!
//! The engine itself is synchronous and tick-driven. This crate runs a
//! [`GameSession`](tile_match_core::GameSession) inside a tokio task so that
//! presentation, audio, stats or multiplayer-sync collaborators can talk to
//! it over channels. It performs no network I/O; a collaborator that wants a
//! socket forwards the lines itself.
//!
//! # Message Types
//!
//! ## Collaborator → Engine
//!
//! - **place**: put a new item into a cell (optionally a preferred slot)
//! - **move**: drag a live item into another cell
//! - **drop_near**: re-check a cell and its neighbours after a drop
//! - **stats** / **snapshot**: request a read-only view
//! - **shutdown**: tear the level down
//!
//! ## Engine → Collaborator
//!
//! - **event**: an [`EngineEvent`](tile_match_types::EngineEvent) (elimination, refill, victory ...)
//! - **ack** / **error**: request result, echoing `seq`
//! - **stats** / **snapshot**: replies to the matching requests
//! - **closed**: the session is gone
//!
//! # Example Flow
//!
//! ```text
//! -> {"type":"place","seq":1,"kind":"r0","row":0,"col":0,"slot":2}
//! <- {"type":"ack","seq":1,"ts":0,"item":41,"slot":2}
//! <- {"type":"event","ts":112,"event":{"event":"eliminated","row":0,"col":0,"kind":"r0","score_delta":100,"combo":1}}
//! -> {"type":"shutdown"}
//! <- {"type":"closed","ts":300,"score":100}
//! ```

pub mod protocol;
pub mod runtime;

pub use tile_match_core as core;
pub use tile_match_engine as engine;
pub use tile_match_types as types;

// Re-export protocol types for convenience
pub use protocol::*;
pub use runtime::{DriverHandle, SessionDriver, DEFAULT_MAX_PENDING, DEFAULT_TICK_MS};
