//! Obstacle lifecycle.
//!
//! Obstacles are inert until an elimination happens in one of the eight
//! surrounding cells; then they turn into a random regular kind in place
//! (same cell, same slot, same item id) and become draggable.

use crate::board::Board;
use crate::refill::random_regular;
use crate::rng::SimpleRng;
use crate::types::{ItemKind, ObstacleKind, Position};

/// One obstacle transformed by [`unlock_adjacent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unlock {
    pub pos: Position,
    pub slot: u8,
    pub from: ObstacleKind,
    pub to: ItemKind,
}

/// Unlock every obstacle in the neighbours of `center`.
///
/// The eliminated cell itself is read-only here.
pub fn unlock_adjacent(
    board: &mut Board,
    center: Position,
    rng: &mut SimpleRng,
    regular_kinds: u8,
) -> Vec<Unlock> {
    let mut unlocked = Vec::new();
    for pos in board.neighbors(center) {
        let Some(cell) = board.get_mut(pos) else {
            continue;
        };
        for item in cell.slots_mut().iter_mut().flatten() {
            if let ItemKind::Obstacle(from) = item.kind {
                let to = random_regular(rng, regular_kinds);
                item.kind = to;
                unlocked.push(Unlock {
                    pos,
                    slot: item.slot,
                    from,
                    to,
                });
            }
        }
    }
    unlocked
}
