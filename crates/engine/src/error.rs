use std::fmt;

use gridtalk_core::AddressError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed cell or range text.
    #[error(transparent)]
    InvalidReference(#[from] AddressError),

    #[error("sheet not found: {sheet}. Available sheets: {}", .available.join(", "))]
    SheetNotFound { sheet: String, available: Vec<String> },

    #[error("row index {row} is out of bounds (sheet has {row_count} rows)")]
    RowOutOfBounds { row: usize, row_count: usize },

    /// Write target beyond the configured row/column ceiling.
    #[error("{axis} index {index} exceeds the write limit of {limit}")]
    LimitExceeded { axis: Axis, index: usize, limit: usize },

    /// Read rectangle too large to materialize.
    #[error("range {range} covers more than {limit} cells")]
    RangeTooLarge { range: String, limit: usize },

    #[error("duplicate sheet name: {0}")]
    DuplicateSheet(String),
}
