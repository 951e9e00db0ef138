//! Cascade gravity (cascade mode only).
//!
//! Rows are scanned bottom-to-top, skipping the last row. Every item whose
//! cell below (same column, next row) has a free slot falls into the first
//! free slot of that cell. Passes repeat until one produces no fall.
//! Falls are item transfers: ids are preserved.

use crate::board::Board;
use crate::types::{ItemId, Position};

/// One item transfer performed by [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub item: ItemId,
    pub from: Position,
    pub to: Position,
    pub to_slot: u8,
}

/// Apply gravity until stable. Cells mid-elimination neither give nor receive items.
pub fn resolve(board: &mut Board) -> Vec<Fall> {
    let mut falls = Vec::new();
    if board.rows() < 2 {
        return falls;
    }

    // A productive pass lowers at least one item; this bounds the number of passes.
    let max_passes = board.rows() * board.cols() * crate::types::SLOTS_PER_CELL + 1;
    for _ in 0..max_passes {
        if resolve_pass(board, &mut falls) == 0 {
            break;
        }
    }
    falls
}

/// One bottom-to-top pass. Returns the number of falls.
fn resolve_pass(board: &mut Board, falls: &mut Vec<Fall>) -> usize {
    let mut count = 0;
    for row in (0..board.rows() - 1).rev() {
        for col in 0..board.cols() {
            let from = Position::new(row, col);
            let to = Position::new(row + 1, col);

            for slot in 0..crate::types::SLOTS_PER_CELL as u8 {
                let (Some(src), Some(dst)) = (board.get(from), board.get(to)) else {
                    continue;
                };
                if src.is_eliminating() || dst.is_eliminating() || src.item_at(slot).is_none() {
                    continue;
                }
                let Some(to_slot) = dst.first_empty() else {
                    break;
                };

                let Some(item) = board.get_mut(from).and_then(|c| c.take(slot)) else {
                    continue;
                };
                if let Some(dst) = board.get_mut(to) {
                    dst.put(to_slot, item);
                }
                falls.push(Fall {
                    item: item.id,
                    from,
                    to,
                    to_slot,
                });
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellPhase;
    use crate::item::Item;
    use crate::types::ItemKind;

    fn put(board: &mut Board, row: usize, col: usize, slot: u8, id: u32) {
        board
            .get_mut(Position::new(row, col))
            .unwrap()
            .put(slot, Item::new(ItemId(id), ItemKind::Regular(0), slot));
    }

    #[test]
    fn items_fall_to_bottom_row() {
        let mut board = Board::new(3, 1);
        put(&mut board, 0, 0, 0, 1);
        put(&mut board, 0, 0, 1, 2);

        let falls = resolve(&mut board);
        assert_eq!(board.get(Position::new(2, 0)).unwrap().filled_count(), 2);
        assert!(board.get(Position::new(0, 0)).unwrap().is_empty());
        assert!(board.get(Position::new(1, 0)).unwrap().is_empty());
        // two items, two rows each
        assert_eq!(falls.len(), 4);
        assert!(board.get(Position::new(2, 0)).unwrap().contains(ItemId(1)));
    }

    #[test]
    fn full_cell_below_blocks_fall() {
        let mut board = Board::new(2, 1);
        for slot in 0..3 {
            put(&mut board, 1, 0, slot, 10 + slot as u32);
        }
        put(&mut board, 0, 0, 2, 1);

        assert!(resolve(&mut board).is_empty());
        assert_eq!(
            board.get(Position::new(0, 0)).unwrap().kind_at(2),
            Some(ItemKind::Regular(0))
        );
    }

    #[test]
    fn fall_lands_in_first_empty_slot() {
        let mut board = Board::new(2, 1);
        put(&mut board, 1, 0, 0, 10);
        put(&mut board, 0, 0, 2, 1);

        let falls = resolve(&mut board);
        assert_eq!(
            falls,
            vec![Fall {
                item: ItemId(1),
                from: Position::new(0, 0),
                to: Position::new(1, 0),
                to_slot: 1,
            }]
        );
        let bottom = board.get(Position::new(1, 0)).unwrap();
        assert_eq!(bottom.item_at(1).map(|i| i.slot), Some(1));
    }

    #[test]
    fn eliminating_cells_are_skipped() {
        let mut board = Board::new(2, 1);
        put(&mut board, 0, 0, 0, 1);
        board
            .get_mut(Position::new(1, 0))
            .unwrap()
            .set_phase(CellPhase::Eliminating);

        assert!(resolve(&mut board).is_empty());
    }

    #[test]
    fn single_row_board_is_stable() {
        let mut board = Board::new(1, 3);
        put(&mut board, 0, 1, 0, 1);
        assert!(resolve(&mut board).is_empty());
    }

    #[test]
    fn conserves_items() {
        let mut board = Board::new(4, 2);
        let mut id = 0;
        for (row, col, slot) in [(0, 0, 0), (0, 0, 2), (1, 1, 1), (2, 0, 0), (0, 1, 0)] {
            put(&mut board, row, col, slot, id);
            id += 1;
        }
        let before = board.item_count();
        resolve(&mut board);
        assert_eq!(board.item_count(), before);
        for (_, cell) in board.iter() {
            assert!(cell.is_consistent());
        }
    }
}
