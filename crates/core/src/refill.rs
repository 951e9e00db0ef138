//! Refill policy - which kinds to (re)introduce into a cell
//!
//! Refills are biased towards level targets that are still incomplete:
//!
//! 1. With probability `target_probability` (and only if some target is
//!    incomplete) pick uniformly among the incomplete target kinds.
//! 2. Otherwise pick a uniformly random regular kind, which itself becomes a
//!    random obstacle with probability `obstacle_probability`.

use arrayvec::ArrayVec;

use crate::cell::Cell;
use crate::item::{Item, ItemIdAlloc};
use crate::rng::SimpleRng;
use crate::types::{ItemKind, ObstacleKind, SLOTS_PER_CELL};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefillPolicy {
    pub regular_kinds: u8,
    pub target_probability: f64,
    pub obstacle_probability: f64,
}

impl RefillPolicy {
    pub fn new(regular_kinds: u8, target_probability: f64, obstacle_probability: f64) -> Self {
        Self {
            regular_kinds,
            target_probability,
            obstacle_probability,
        }
    }

    /// Pick one kind given the currently incomplete target kinds.
    pub fn pick_kind(&self, rng: &mut SimpleRng, incomplete_targets: &[ItemKind]) -> ItemKind {
        if !incomplete_targets.is_empty() && rng.chance(self.target_probability) {
            if let Some(kind) = rng.choose(incomplete_targets) {
                return *kind;
            }
        }

        if rng.chance(self.obstacle_probability) {
            if let Some(obstacle) = rng.choose(&ObstacleKind::ALL) {
                return ItemKind::Obstacle(*obstacle);
            }
        }

        random_regular(rng, self.regular_kinds)
    }

    /// Fill every empty slot of `cell`. Returns the kinds added, in slot order.
    pub fn fill_cell(
        &self,
        cell: &mut Cell,
        rng: &mut SimpleRng,
        ids: &mut ItemIdAlloc,
        incomplete_targets: &[ItemKind],
    ) -> ArrayVec<ItemKind, SLOTS_PER_CELL> {
        let mut added = ArrayVec::new();
        for slot in 0..SLOTS_PER_CELL as u8 {
            if cell.item_at(slot).is_some() {
                continue;
            }
            let kind = self.pick_kind(rng, incomplete_targets);
            if cell.put(slot, Item::new(ids.next_id(), kind, slot)) {
                added.push(kind);
            }
        }
        added
    }
}

/// Uniformly random regular kind.
pub fn random_regular(rng: &mut SimpleRng, regular_kinds: u8) -> ItemKind {
    ItemKind::Regular(rng.next_range(regular_kinds.max(1) as u32) as u8)
}
