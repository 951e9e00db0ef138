//! Live items and id allocation.

use crate::types::{ItemId, ItemKind};

/// A live item occupying one slot of one cell.
///
/// `slot` is the slot index the item believes it occupies. The owning cell's
/// slot array is authoritative for *where* an item lives; `slot` is what the
/// consistency scanner uses to re-seat items after a desync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub slot: u8,
}

impl Item {
    pub fn new(id: ItemId, kind: ItemKind, slot: u8) -> Self {
        Self { id, kind, slot }
    }

    /// Obstacles cannot be dragged until unlocked.
    pub fn is_draggable(&self) -> bool {
        !self.kind.is_obstacle()
    }
}

/// Monotonic item id source. Ids are never reused within a session.
#[derive(Debug, Clone, Default)]
pub struct ItemIdAlloc {
    next: u32,
}

impl ItemIdAlloc {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn next_id(&mut self) -> ItemId {
        let id = ItemId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u32 {
        self.next
    }
}
