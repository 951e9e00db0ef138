//! Deadlock guard - starvation helper drops and true-deadlock reshuffles
//!
//! Two independent heuristics, run at different cadences by the session:
//!
//! - **Starvation**: no regular kind has three live items anywhere, so no
//!   match can ever be assembled. Fixed by dropping three items of a target
//!   kind into random empty slots.
//! - **True deadlock**: the board is nearly full and the possible-move
//!   heuristic finds nothing. Fixed by a full reshuffle.
//!
//! The possible-move count is an approximation, not a solvability proof.
//! False negatives are picked up later by the periodic scans; false positives
//! only cost a harmless reshuffle or helper drop.

use std::collections::BTreeMap;

use crate::board::Board;
use crate::item::{Item, ItemIdAlloc};
use crate::matching::pair_kind;
use crate::rng::SimpleRng;
use crate::types::{ItemKind, Position};

/// Regular kinds reach three live items nowhere on the board.
pub fn is_starving(board: &Board) -> bool {
    !board
        .kind_counts()
        .iter()
        .any(|(kind, count)| kind.is_regular() && *count >= 3)
}

/// Drop three items of `kind` into random empty slots.
///
/// Returns the receiving positions (one entry per item), or an empty list if
/// fewer than three free slots exist outside cells that are mid-elimination.
pub fn helper_drop(
    board: &mut Board,
    kind: ItemKind,
    rng: &mut SimpleRng,
    ids: &mut ItemIdAlloc,
) -> Vec<Position> {
    let mut free: Vec<(Position, u8)> = board
        .empty_positions()
        .into_iter()
        .filter(|(pos, _)| board.get(*pos).is_some_and(|c| !c.is_eliminating()))
        .collect();
    if free.len() < 3 {
        return Vec::new();
    }

    rng.shuffle(&mut free);
    let mut placed = Vec::with_capacity(3);
    for (pos, slot) in free.into_iter().take(3) {
        if let Some(cell) = board.get_mut(pos) {
            if cell.put(slot, Item::new(ids.next_id(), kind, slot)) {
                placed.push(pos);
            }
        }
    }
    placed
}

/// Result of the possible-move heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadlockAnalysis {
    pub empty_ratio: f64,
    pub possible_matches: usize,
}

/// What the true-deadlock check decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlockVerdict {
    /// Plenty of free slots; analysis skipped.
    Roomy,
    /// Moves remain, or the board is not full enough to warrant a reshuffle.
    Playable,
    /// No possible match on a crowded board.
    Stuck,
}

/// Count possible matches.
///
/// A cell counts once if either
/// (a) it holds exactly two of one regular kind that also exists elsewhere, or
/// (b) it has a free slot and all its items share one regular kind that also
///     exists elsewhere.
///
/// Only regular (draggable) items count as "existing elsewhere". Entirely
/// empty cells are not counted.
pub fn count_possible_matches(board: &Board) -> usize {
    let mut regular_counts: BTreeMap<ItemKind, usize> = BTreeMap::new();
    for (_, cell) in board.iter() {
        for item in cell.items().filter(|i| i.is_draggable()) {
            *regular_counts.entry(item.kind).or_insert(0) += 1;
        }
    }
    let elsewhere = |kind: ItemKind, in_cell: usize| {
        regular_counts.get(&kind).copied().unwrap_or(0) > in_cell
    };

    let mut possible = 0;
    for (_, cell) in board.iter() {
        if cell.is_eliminating() || cell.is_empty() {
            continue;
        }

        if let Some(kind) = pair_kind(cell).filter(ItemKind::is_regular) {
            if elsewhere(kind, 2) {
                possible += 1;
                continue;
            }
        }

        if cell.first_empty().is_some() {
            let mut kinds = cell.items().map(|i| i.kind);
            let Some(first) = kinds.next() else { continue };
            if first.is_regular() && kinds.all(|k| k == first) && elsewhere(first, cell.filled_count()) {
                possible += 1;
            }
        }
    }
    possible
}

pub fn analyze(board: &Board) -> DeadlockAnalysis {
    DeadlockAnalysis {
        empty_ratio: board.empty_ratio(),
        possible_matches: count_possible_matches(board),
    }
}

/// Apply the thresholds: skip above `skip_ratio`, reshuffle only below `reshuffle_ratio`.
pub fn evaluate(board: &Board, skip_ratio: f64, reshuffle_ratio: f64) -> DeadlockVerdict {
    let empty_ratio = board.empty_ratio();
    if empty_ratio > skip_ratio {
        return DeadlockVerdict::Roomy;
    }
    let analysis = analyze(board);
    if analysis.possible_matches == 0 && analysis.empty_ratio < reshuffle_ratio {
        DeadlockVerdict::Stuck
    } else {
        DeadlockVerdict::Playable
    }
}

/// Randomly permute every live item and redistribute it in row-major order.
///
/// Items are packed into the leading slots of the board, so empty space ends
/// up at the bottom-right. The multiset of kinds and every item id survive.
/// Cells mid-elimination neither give nor receive items.
/// Returns the number of items redistributed.
pub fn reshuffle(board: &mut Board, rng: &mut SimpleRng) -> usize {
    let mut seats: Vec<(Position, u8)> = Vec::new();
    let mut items: Vec<Item> = Vec::new();

    let positions: Vec<Position> = board.positions().collect();
    for pos in positions {
        let Some(cell) = board.get_mut(pos) else { continue };
        if cell.is_eliminating() {
            continue;
        }
        for slot in 0..crate::types::SLOTS_PER_CELL as u8 {
            seats.push((pos, slot));
            if let Some(item) = cell.take(slot) {
                items.push(item);
            }
        }
    }

    rng.shuffle(&mut items);
    let moved = items.len();
    for ((pos, slot), item) in seats.into_iter().zip(items) {
        if let Some(cell) = board.get_mut(pos) {
            cell.put(slot, item);
        }
    }
    moved
}
