//! Cell module - one grid location with three item slots
//!
//! The slot array is the single source of truth for what a cell holds:
//! "kind at slot i", "is full" and "is matched" are read-only queries over it.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::item::Item;
use crate::types::{ItemId, ItemKind, SLOTS_PER_CELL};

/// Per-cell lifecycle state.
///
/// Transitions:
/// - `Idle` -> `Filling` on placement or move into the cell
/// - `Filling` / `Falling` / `CheckingMatch` -> `Eliminating` on a match, else `Idle`
/// - `Eliminating` -> `Refilling` when the grace window ends
/// - `Refilling` -> `CheckingMatch` once the refill lands
/// - `Idle` -> `Falling` when cascade gravity drops an item in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellPhase {
    #[default]
    Idle,
    Filling,
    CheckingMatch,
    Eliminating,
    Refilling,
    Falling,
}

impl CellPhase {
    /// Phases in which a pending match check may settle the cell back to idle.
    pub fn settles_on_check(&self) -> bool {
        matches!(
            self,
            CellPhase::Filling | CellPhase::CheckingMatch | CellPhase::Falling
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    slots: [Option<Item>; SLOTS_PER_CELL],
    phase: CellPhase,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[Option<Item>; SLOTS_PER_CELL] {
        &self.slots
    }

    /// Raw slot access for repair paths; bypasses slot bookkeeping.
    pub(crate) fn slots_mut(&mut self) -> &mut [Option<Item>; SLOTS_PER_CELL] {
        &mut self.slots
    }

    pub fn item_at(&self, slot: u8) -> Option<&Item> {
        self.slots.get(slot as usize).and_then(|s| s.as_ref())
    }

    pub fn kind_at(&self, slot: u8) -> Option<ItemKind> {
        self.item_at(slot).map(|item| item.kind)
    }

    pub fn kinds(&self) -> [Option<ItemKind>; SLOTS_PER_CELL] {
        let mut out = [None; SLOTS_PER_CELL];
        for (dst, src) in out.iter_mut().zip(self.slots.iter()) {
            *dst = src.map(|item| item.kind);
        }
        out
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.slots.iter().flatten()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items().any(|item| item.id == id)
    }

    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn empty_count(&self) -> usize {
        SLOTS_PER_CELL - self.filled_count()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| s.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    pub fn first_empty(&self) -> Option<u8> {
        self.slots.iter().position(|s| s.is_none()).map(|i| i as u8)
    }

    /// The preferred slot when it is free, otherwise the first free slot.
    pub fn resolve_slot(&self, preferred: Option<u8>) -> Option<u8> {
        if let Some(slot) = preferred {
            if (slot as usize) < SLOTS_PER_CELL && self.slots[slot as usize].is_none() {
                return Some(slot);
            }
        }
        self.first_empty()
    }

    /// Seat `item` in `slot`, rewriting its slot index.
    /// Returns false if the slot is out of range or occupied.
    pub fn put(&mut self, slot: u8, mut item: Item) -> bool {
        let Some(entry) = self.slots.get_mut(slot as usize) else {
            return false;
        };
        if entry.is_some() {
            return false;
        }
        item.slot = slot;
        *entry = Some(item);
        true
    }

    pub fn take(&mut self, slot: u8) -> Option<Item> {
        self.slots.get_mut(slot as usize).and_then(|s| s.take())
    }

    pub fn take_by_id(&mut self, id: ItemId) -> Option<Item> {
        let slot = self
            .slots
            .iter()
            .position(|s| s.map(|item| item.id) == Some(id))?;
        self.slots[slot].take()
    }

    /// Remove every item, returning them in slot order.
    pub fn clear(&mut self) -> ArrayVec<Item, SLOTS_PER_CELL> {
        let mut out = ArrayVec::new();
        for slot in &mut self.slots {
            if let Some(item) = slot.take() {
                out.push(item);
            }
        }
        out
    }

    pub fn phase(&self) -> CellPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: CellPhase) {
        self.phase = phase;
    }

    /// A clear is in flight; the cell must not be eliminated or filled again.
    pub fn is_eliminating(&self) -> bool {
        self.phase == CellPhase::Eliminating
    }

    /// Every item sits at the slot index it records.
    pub fn is_consistent(&self) -> bool {
        self.slots
            .iter()
            .enumerate()
            .all(|(i, s)| s.map_or(true, |item| item.slot as usize == i))
    }
}
