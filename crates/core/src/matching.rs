//! Match detection.
//!
//! A cell matches iff all three slots are filled with the same kind.
//! Obstacle triples match too unless the rules turn that off.

use crate::cell::Cell;
use crate::types::ItemKind;

/// Decide whether `cell` is a match and return the matched kind.
pub fn detect(cell: &Cell, obstacles_self_match: bool) -> Option<ItemKind> {
    let [a, b, c] = cell.kinds();
    let kind = a?;
    if b != Some(kind) || c != Some(kind) {
        return None;
    }
    if kind.is_obstacle() && !obstacles_self_match {
        return None;
    }
    Some(kind)
}

/// Two slots share a kind and the third is free or different.
///
/// Returns the shared kind. Used by the deadlock heuristic.
pub fn pair_kind(cell: &Cell) -> Option<ItemKind> {
    let kinds = cell.kinds();
    kinds.iter().flatten().copied().find(|kind| {
        kinds.iter().filter(|k| **k == Some(*kind)).count() == 2
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::types::{ItemId, ObstacleKind};

    fn cell_of(kinds: [Option<ItemKind>; 3]) -> Cell {
        let mut cell = Cell::new();
        for (slot, kind) in kinds.iter().enumerate() {
            if let Some(kind) = kind {
                cell.put(slot as u8, Item::new(ItemId(slot as u32), *kind, 0));
            }
        }
        cell
    }

    const A: ItemKind = ItemKind::Regular(0);
    const B: ItemKind = ItemKind::Regular(1);
    const ROCK: ItemKind = ItemKind::Obstacle(ObstacleKind::Stone);

    #[test]
    fn full_identical_triple_matches() {
        assert_eq!(detect(&cell_of([Some(A), Some(A), Some(A)]), true), Some(A));
    }

    #[test]
    fn partial_or_mixed_does_not_match() {
        assert_eq!(detect(&cell_of([Some(A), Some(A), None]), true), None);
        assert_eq!(detect(&cell_of([Some(A), Some(B), Some(A)]), true), None);
        assert_eq!(detect(&cell_of([None, None, None]), true), None);
    }

    #[test]
    fn obstacle_triples_follow_rule_toggle() {
        let rocks = cell_of([Some(ROCK), Some(ROCK), Some(ROCK)]);
        assert_eq!(detect(&rocks, true), Some(ROCK));
        assert_eq!(detect(&rocks, false), None);
    }

    #[test]
    fn pair_kind_finds_two_of_a_kind() {
        assert_eq!(pair_kind(&cell_of([Some(A), None, Some(A)])), Some(A));
        assert_eq!(pair_kind(&cell_of([Some(B), Some(A), Some(A)])), Some(A));
        assert_eq!(pair_kind(&cell_of([Some(A), Some(A), Some(A)])), None);
        assert_eq!(pair_kind(&cell_of([Some(A), Some(B), None])), None);
    }
}
