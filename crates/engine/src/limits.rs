use gridtalk_core::{CellAddress, Range};
use serde::{Deserialize, Serialize};

use crate::error::{Axis, EngineError};

pub const DEFAULT_MAX_ROW: usize = 20_000;
pub const DEFAULT_MAX_COL: usize = 1_000;

/// Largest rectangle a single read may return.
pub const MAX_READ_CELLS: usize = 1_000_000;

/// Refuse reads whose rectangle holds more than [`MAX_READ_CELLS`] cells.
pub fn check_read(range: Range) -> Result<(), EngineError> {
    let range = range.normalize();
    let cells = (range.end.row - range.start.row)
        .checked_add(1)
        .zip((range.end.col - range.start.col).checked_add(1))
        .and_then(|(rows, cols)| rows.checked_mul(cols));
    match cells {
        Some(n) if n <= MAX_READ_CELLS => Ok(()),
        _ => Err(EngineError::RangeTooLarge {
            range: range.to_string(),
            limit: MAX_READ_CELLS,
        }),
    }
}

/// Ceilings on zero-based write coordinates. Writes past them are refused so
/// malformed agent input cannot grow the grid without bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteLimits {
    pub max_row: usize,
    pub max_col: usize,
}

impl Default for WriteLimits {
    fn default() -> Self {
        Self {
            max_row: DEFAULT_MAX_ROW,
            max_col: DEFAULT_MAX_COL,
        }
    }
}

impl WriteLimits {
    pub fn check_row(&self, row: usize) -> Result<(), EngineError> {
        if row > self.max_row {
            return Err(EngineError::LimitExceeded {
                axis: Axis::Row,
                index: row,
                limit: self.max_row,
            });
        }
        Ok(())
    }

    pub fn check_col(&self, col: usize) -> Result<(), EngineError> {
        if col > self.max_col {
            return Err(EngineError::LimitExceeded {
                axis: Axis::Column,
                index: col,
                limit: self.max_col,
            });
        }
        Ok(())
    }

    pub fn check(&self, addr: CellAddress) -> Result<(), EngineError> {
        self.check_row(addr.row)?;
        self.check_col(addr.col)
    }
}
