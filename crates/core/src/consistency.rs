//! Consistency scanner - periodic self-repair of the board
//!
//! The slot array is authoritative, so "desync" here means bookkeeping inside
//! it has gone wrong:
//!
//! - an item records a slot index different from the one it sits in, or
//! - the same item id is seated twice.
//!
//! [`repair`] fixes both. [`matched_cells`] then lists every cell that is a
//! match but is not already being eliminated, so the session can schedule
//! staggered eliminations.

use std::collections::BTreeSet;

use arrayvec::ArrayVec;

use crate::board::Board;
use crate::cell::Cell;
use crate::matching::detect;
use crate::types::{ItemId, ItemKind, Position, SLOTS_PER_CELL};

/// What a repair pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Cells whose slot bookkeeping was rewritten, row-major.
    pub resynced: Vec<Position>,
    /// Duplicate items dropped, with the cell they were removed from.
    pub duplicates: Vec<(Position, ItemId)>,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.resynced.is_empty() && self.duplicates.is_empty()
    }

    /// Every position touched, deduplicated, row-major.
    pub fn touched(&self) -> Vec<Position> {
        let set: BTreeSet<Position> = self
            .resynced
            .iter()
            .copied()
            .chain(self.duplicates.iter().map(|(pos, _)| *pos))
            .collect();
        set.into_iter().collect()
    }
}

/// Re-seat every item of `cell` at the slot it records.
///
/// An item whose recorded slot is out of range or already taken goes to the
/// first free slot. Returns true if anything moved.
pub fn resync_cell(cell: &mut Cell) -> bool {
    if cell.is_consistent() {
        return false;
    }

    let mut items = ArrayVec::<_, SLOTS_PER_CELL>::new();
    for slot in cell.slots_mut().iter_mut() {
        if let Some(item) = slot.take() {
            items.push(item);
        }
    }

    let mut homeless = ArrayVec::<_, SLOTS_PER_CELL>::new();
    for item in items {
        let wanted = item.slot;
        if !cell.put(wanted, item) {
            homeless.push(item);
        }
    }
    for item in homeless {
        if let Some(slot) = cell.first_empty() {
            cell.put(slot, item);
        }
    }
    true
}

/// Repair the whole board. Cells are visited row-major; when an id is seated
/// twice the first occurrence wins.
pub fn repair(board: &mut Board) -> RepairReport {
    let mut report = RepairReport::default();
    let mut seen: BTreeSet<ItemId> = BTreeSet::new();

    let positions: Vec<Position> = board.positions().collect();
    for pos in positions {
        let Some(cell) = board.get_mut(pos) else {
            continue;
        };

        for slot in cell.slots_mut().iter_mut() {
            let Some(item) = slot else { continue };
            if !seen.insert(item.id) {
                report.duplicates.push((pos, item.id));
                *slot = None;
            }
        }

        if resync_cell(cell) {
            report.resynced.push(pos);
        }
    }
    report
}

/// Cells that currently match and are not mid-elimination, row-major.
pub fn matched_cells(board: &Board, obstacles_self_match: bool) -> Vec<(Position, ItemKind)> {
    board
        .iter()
        .filter(|(_, cell)| !cell.is_eliminating())
        .filter_map(|(pos, cell)| detect(cell, obstacles_self_match).map(|kind| (pos, kind)))
        .collect()
}
