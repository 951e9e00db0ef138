//! Board module - manages the R x C grid of cells
//!
//! Cells are stored in a flat vector in row-major order (`row * cols + col`).
//! Row 0 is the top row; gravity in cascade mode pulls items towards the last row.

use std::collections::BTreeMap;

use arrayvec::ArrayVec;

use crate::cell::Cell;
use crate::item::Item;
use crate::types::{ItemId, ItemKind, Position, SLOTS_PER_CELL};

/// The level grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    rows: usize,
    cols: usize,
    /// Flat array of cells, row-major order (row * cols + col)
    cells: Vec<Cell>,
}

impl Board {
    /// Create a new empty board
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::new(); rows * cols],
        }
    }

    /// Calculate flat index from coordinates
    #[inline(always)]
    pub(crate) fn index(&self, pos: Position) -> Option<usize> {
        if pos.row >= self.rows || pos.col >= self.cols {
            return None;
        }
        Some(pos.row * self.cols + pos.col)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        self.index(pos).is_some()
    }

    /// Get cell at position, `None` if out of bounds
    pub fn get(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).map(|idx| &self.cells[idx])
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        match self.index(pos) {
            Some(idx) => Some(&mut self.cells[idx]),
            None => None,
        }
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Position::new(row, col)))
    }

    /// Cells paired with their positions, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.positions().zip(self.cells.iter())
    }

    /// The up-to-8 in-bounds neighbours of `pos`, diagonals included.
    pub fn neighbors(&self, pos: Position) -> ArrayVec<Position, 8> {
        let mut out = ArrayVec::new();
        for dr in -1i64..=1 {
            for dc in -1i64..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let row = pos.row as i64 + dr;
                let col = pos.col as i64 + dc;
                if row < 0 || col < 0 {
                    continue;
                }
                let n = Position::new(row as usize, col as usize);
                if self.in_bounds(n) {
                    out.push(n);
                }
            }
        }
        out
    }

    /// Locate a live item by id.
    pub fn find_item(&self, id: ItemId) -> Option<(Position, Item)> {
        self.iter().find_map(|(pos, cell)| {
            cell.items()
                .find(|item| item.id == id)
                .map(|item| (pos, *item))
        })
    }

    pub fn total_slots(&self) -> usize {
        self.cells.len() * SLOTS_PER_CELL
    }

    pub fn empty_slots(&self) -> usize {
        self.cells.iter().map(Cell::empty_count).sum()
    }

    pub fn item_count(&self) -> usize {
        self.cells.iter().map(Cell::filled_count).sum()
    }

    /// Fraction of slots that are empty, 0.0 for a zero-sized board.
    pub fn empty_ratio(&self) -> f64 {
        let total = self.total_slots();
        if total == 0 {
            return 0.0;
        }
        self.empty_slots() as f64 / total as f64
    }

    /// Live item count per kind.
    pub fn kind_counts(&self) -> BTreeMap<ItemKind, usize> {
        let mut counts = BTreeMap::new();
        for item in self.cells.iter().flat_map(Cell::items) {
            *counts.entry(item.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Every empty `(position, slot)` pair in row-major, slot order.
    pub fn empty_positions(&self) -> Vec<(Position, u8)> {
        self.iter()
            .flat_map(|(pos, cell)| {
                (0..SLOTS_PER_CELL as u8)
                    .filter(move |&slot| cell.item_at(slot).is_none())
                    .map(move |slot| (pos, slot))
            })
            .collect()
    }

    /// Remove every item from every cell.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }
}
