use thiserror::Error;
use tracing::debug;

use crate::core::GameSession;
use crate::types::{ItemId, ItemKind, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaceError {
    #[error("target cell has no free slot")]
    CellFull,
    #[error("target cell is outside the board")]
    OutOfBounds,
    #[error("target cell is being eliminated")]
    CellBusy,
    #[error("obstacles cannot be placed or dragged")]
    NotDraggable,
    #[error("no such item")]
    UnknownItem,
    #[error("no moves left")]
    MovesExhausted,
    #[error("session is not playable")]
    NotPlayable,
}

impl PlaceError {
    pub fn code(self) -> &'static str {
        match self {
            PlaceError::CellFull | PlaceError::CellBusy => "placement_rejected",
            PlaceError::OutOfBounds => "out_of_bounds",
            PlaceError::NotDraggable | PlaceError::UnknownItem => "invalid_item",
            PlaceError::MovesExhausted | PlaceError::NotPlayable => "not_playable",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            PlaceError::CellFull => "target slot occupied and no empty slot in target cell",
            PlaceError::OutOfBounds => "target cell is outside the board",
            PlaceError::CellBusy => "target cell is mid-elimination",
            PlaceError::NotDraggable => "obstacles cannot be placed or dragged",
            PlaceError::UnknownItem => "item is not on the board",
            PlaceError::MovesExhausted => "move budget exhausted",
            PlaceError::NotPlayable => "session is not playable",
        }
    }
}

/// Result of a successful placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceOutcome {
    pub item: ItemId,
    pub row: usize,
    pub col: usize,
    pub slot: u8,
    /// The placement filled the cell; a match check is pending.
    pub needs_match_check: bool,
}

fn ensure_playable(session: &GameSession) -> Result<(), PlaceError> {
    if !session.is_playable() {
        return Err(PlaceError::NotPlayable);
    }
    if session.moves_left() == Some(0) {
        return Err(PlaceError::MovesExhausted);
    }
    Ok(())
}

fn target_cell(session: &GameSession, row: usize, col: usize) -> Result<Position, PlaceError> {
    let pos = Position::new(row, col);
    let cell = session.board().get(pos).ok_or(PlaceError::OutOfBounds)?;
    if cell.is_eliminating() {
        return Err(PlaceError::CellBusy);
    }
    Ok(pos)
}

/// Place a new item of `kind` at `(row, col)`, in `preferred_slot` if free,
/// otherwise the first free slot of the cell.
pub fn apply_place(
    session: &mut GameSession,
    kind: ItemKind,
    row: usize,
    col: usize,
    preferred_slot: Option<u8>,
) -> Result<PlaceOutcome, PlaceError> {
    ensure_playable(session)?;

    match kind {
        ItemKind::Obstacle(_) => return Err(PlaceError::NotDraggable),
        ItemKind::Regular(n) if n >= session.config().regular_kinds => {
            return Err(PlaceError::UnknownItem)
        }
        ItemKind::Regular(_) => {}
    }

    let pos = target_cell(session, row, col)?;
    let slot = session
        .board()
        .get(pos)
        .and_then(|cell| cell.resolve_slot(preferred_slot))
        .ok_or(PlaceError::CellFull)?;

    let item = session
        .place_item(pos, slot, kind)
        .ok_or(PlaceError::CellFull)?;
    let needs_match_check = session.board().get(pos).is_some_and(|cell| cell.is_full());

    debug!(row, col, slot, %kind, needs_match_check, "item placed");
    Ok(PlaceOutcome {
        item,
        row,
        col,
        slot,
        needs_match_check,
    })
}

/// Transfer a live item to `(row, col)`. Returns the slot it landed in.
pub fn apply_move(
    session: &mut GameSession,
    item: ItemId,
    row: usize,
    col: usize,
    slot: Option<u8>,
) -> Result<u8, PlaceError> {
    ensure_playable(session)?;

    let (from, current) = session.board().find_item(item).ok_or(PlaceError::UnknownItem)?;
    if !current.is_draggable() {
        return Err(PlaceError::NotDraggable);
    }
    if session.board().get(from).is_some_and(|cell| cell.is_eliminating()) {
        return Err(PlaceError::CellBusy);
    }

    let to = target_cell(session, row, col)?;
    if to != from && session.board().get(to).is_some_and(|cell| cell.is_full()) {
        return Err(PlaceError::CellFull);
    }

    let landed = session
        .move_item(item, to, slot)
        .ok_or(PlaceError::CellFull)?;
    debug!(item = item.0, row, col, slot = landed, "item moved");
    Ok(landed)
}

/// A drop landed near `(row, col)`; re-check the cell and its neighbours.
pub fn apply_drop_near(session: &mut GameSession, row: usize, col: usize) -> Result<(), PlaceError> {
    if !session.is_playable() {
        return Err(PlaceError::NotPlayable);
    }
    let pos = Position::new(row, col);
    if !session.board().in_bounds(pos) {
        return Err(PlaceError::OutOfBounds);
    }
    session.check_near(pos);
    Ok(())
}
