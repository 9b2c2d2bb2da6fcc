use std::collections::HashMap;

use gridtalk_core::{CellAddress, Range};
use serde::{Deserialize, Serialize};

use super::cell::Cell;

/// A named sparse grid with a recorded used range.
///
/// The used range only grows on writes; clearing a cell to an empty literal
/// keeps it inside the range. Row deletion shrinks it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    cells: HashMap<(usize, usize), Cell>,
    used: Option<Range>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: HashMap::new(),
            used: None,
        }
    }

    /// Build a sheet from rows of cells anchored at A1.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut sheet = Self::new(name);
        for (row, cells) in rows.into_iter().enumerate() {
            for (col, cell) in cells.into_iter().enumerate() {
                sheet.set(CellAddress::new(row, col), cell);
            }
        }
        sheet
    }

    pub fn get(&self, addr: CellAddress) -> Option<&Cell> {
        self.cells.get(&(addr.row, addr.col))
    }

    /// The cell at `addr`, or an empty cell.
    pub fn cell(&self, addr: CellAddress) -> Cell {
        self.get(addr).cloned().unwrap_or_default()
    }

    /// Store a cell and grow the used range to include it.
    pub fn set(&mut self, addr: CellAddress, cell: Cell) {
        self.cells.insert((addr.row, addr.col), cell);
        self.used = Some(match self.used {
            Some(range) => range.expand_to(addr),
            None => Range::cell(addr),
        });
    }

    pub fn set_used_range(&mut self, range: Option<Range>) {
        self.used = range.map(Range::normalize);
    }

    /// Recorded used range, if anything was ever written.
    pub fn used(&self) -> Option<Range> {
        self.used
    }

    /// Used range, falling back to A1 for an empty sheet.
    pub fn used_range(&self) -> Range {
        self.used.unwrap_or_else(|| Range::cell(CellAddress::default()))
    }

    /// Rows spanned by the used range.
    pub fn row_count(&self) -> usize {
        self.used_range().row_count()
    }

    pub fn col_count(&self) -> usize {
        self.used_range().col_count()
    }

    /// Number of physical rows from row 0 through the last used row. Zero for
    /// an empty sheet. Row indices for delete/insert are bounded by this.
    pub fn row_extent(&self) -> usize {
        self.used.map_or(0, |r| r.end.row + 1)
    }

    pub fn cells_iter(&self) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells
            .iter()
            .map(|(&(row, col), cell)| (CellAddress::new(row, col), cell))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cells of one row, left to right, through the last used column.
    pub fn row_cells(&self, row: usize) -> Vec<Cell> {
        let range = self.used_range();
        (range.start.col..=range.end.col)
            .map(|col| self.cell(CellAddress::new(row, col)))
            .collect()
    }

    /// Remove `row` and shift every later row up by one. The caller checks bounds.
    pub(crate) fn remove_row(&mut self, row: usize) {
        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .filter(|((r, _), _)| *r != row)
            .map(|((r, c), cell)| if r > row { ((r - 1, c), cell) } else { ((r, c), cell) })
            .collect();

        self.used = match self.used {
            Some(range) if range.start.row == row && range.end.row == row => self.bounds_of_cells(),
            Some(mut range) => {
                if range.start.row > row {
                    range.start.row -= 1;
                }
                if range.end.row >= row {
                    range.end.row -= 1;
                }
                Some(range)
            }
            None => None,
        };
    }

    /// Shift `row` and every later row down by one, leaving `row` empty.
    pub(crate) fn open_row(&mut self, row: usize) {
        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .map(|((r, c), cell)| if r >= row { ((r + 1, c), cell) } else { ((r, c), cell) })
            .collect();

        if let Some(range) = self.used.as_mut() {
            if range.start.row >= row {
                range.start.row += 1;
            }
            if range.end.row >= row {
                range.end.row += 1;
            }
        }
    }

    fn bounds_of_cells(&self) -> Option<Range> {
        self.cells_iter()
            .map(|(addr, _)| addr)
            .fold(None, |acc: Option<Range>, addr| {
                Some(acc.map_or(Range::cell(addr), |r| r.expand_to(addr)))
            })
    }
}
