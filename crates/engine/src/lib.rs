//! Request layer - validates inbound placement, move and drop requests
//! against a [`GameSession`](tile_match_core::GameSession) before committing them.

pub mod place;

pub use tile_match_core as core;
pub use tile_match_types as types;

pub use place::{apply_drop_near, apply_move, apply_place, PlaceError, PlaceOutcome};
