//! Rectangular cell ranges.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::address::{parse_cell_reference, AddressError, CellAddress};

/// A rectangle bounded by two corner addresses (inclusive).
///
/// Constructed ranges may have their corners in any order; call
/// [`Range::normalize`] to get the top-left/bottom-right form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: CellAddress,
    pub end: CellAddress,
}

/// A range serialized back to reference strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePair {
    pub from: String,
    pub to: String,
}

impl Range {
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self { start, end }
    }

    /// A single-cell range.
    pub fn cell(addr: CellAddress) -> Self {
        Self { start: addr, end: addr }
    }

    /// Swap corners per axis so `start <= end` on both rows and columns.
    pub fn normalize(self) -> Self {
        Self {
            start: CellAddress {
                row: self.start.row.min(self.end.row),
                col: self.start.col.min(self.end.col),
            },
            end: CellAddress {
                row: self.start.row.max(self.end.row),
                col: self.start.col.max(self.end.col),
            },
        }
    }

    /// Parse two references (in either order) into a normalized range.
    pub fn resolve_from_references(from: &str, to: &str) -> Result<Self, AddressError> {
        let start = parse_cell_reference(from)?;
        let end = parse_cell_reference(to)?;
        Ok(Self { start, end }.normalize())
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    pub fn row_count(&self) -> usize {
        let r = self.normalize();
        r.end.row - r.start.row + 1
    }

    pub fn col_count(&self) -> usize {
        let r = self.normalize();
        r.end.col - r.start.col + 1
    }

    pub fn contains(&self, addr: CellAddress) -> bool {
        let r = self.normalize();
        (r.start.row..=r.end.row).contains(&addr.row) && (r.start.col..=r.end.col).contains(&addr.col)
    }

    /// Smallest range covering both `self` and `addr`.
    pub fn expand_to(&self, addr: CellAddress) -> Self {
        let r = self.normalize();
        Self {
            start: CellAddress::new(r.start.row.min(addr.row), r.start.col.min(addr.col)),
            end: CellAddress::new(r.end.row.max(addr.row), r.end.col.max(addr.col)),
        }
    }

    /// Smallest range covering both ranges.
    pub fn union(&self, other: &Range) -> Self {
        let other = other.normalize();
        self.expand_to(other.start).expand_to(other.end)
    }

    /// Reference strings of the normalized corners.
    pub fn to_reference_pair(&self) -> ReferencePair {
        let r = self.normalize();
        ReferencePair {
            from: r.start.to_string(),
            to: r.end.to_string(),
        }
    }
}

impl fmt::Display for Range {
    /// "A1" for a single cell, "A1:C3" otherwise (normalized).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.normalize();
        if r.is_single_cell() {
            write!(f, "{}", r.start)
        } else {
            write!(f, "{}:{}", r.start, r.end)
        }
    }
}

impl FromStr for Range {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((from, to)) => Self::resolve_from_references(from, to),
            None => Ok(Self::cell(parse_cell_reference(s)?)),
        }
    }
}
