//! `gridtalk-engine` — the in-memory document model.
//!
//! A [`Workbook`] of named [`Sheet`]s holding typed cells with optional
//! formula text. Reads are plain queries; writes are bounded by
//! [`WriteLimits`] and never touch disk.

pub mod cell;
pub mod error;
pub mod identity;
pub mod limits;
pub mod mutation;
pub mod query;
pub mod sheet;
pub mod workbook;

pub use cell::{format_number, Cell, CellValue, InputValue};
pub use error::{Axis, EngineError};
pub use limits::{WriteLimits, DEFAULT_MAX_COL, DEFAULT_MAX_ROW, MAX_READ_CELLS};
pub use mutation::{AddedRow, DeletedRow};
pub use query::{CellResult, FormulaResult, RangeResult, SheetInfo};
pub use sheet::Sheet;
pub use workbook::Workbook;
