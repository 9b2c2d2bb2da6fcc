//! `gridtalk-core` — pure addressing types shared by every other crate.
//!
//! Converts between spreadsheet references ("A1", "C5:E9") and zero-based
//! coordinates, normalizes rectangular ranges, tracks drag selections and
//! parses inline `@Sheet!A1:B3` mentions. No I/O.

pub mod address;
pub mod mention;
pub mod range;
pub mod selection;

pub use address::{AddressError, CellAddress};
pub use mention::{Mention, Segment};
pub use range::{Range, ReferencePair};
pub use selection::RangeSelection;
