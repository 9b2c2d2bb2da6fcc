//! CLI Exit Code Registry
//!
//! Single source of truth for `gridtalk` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                           |
//! |------|---------------------------------------------------|
//! | 0    | Success                                           |
//! | 1    | General error                                     |
//! | 2    | Usage error (bad arguments, malformed reference)  |
//! | 3    | Sheet not found                                   |
//! | 4    | Row out of bounds, write limit or read too large  |
//! | 5    | Workbook or database could not be read or written |
//! | 10   | Action cancelled by the user                      |
//! | 11   | Confirmed action failed                           |

use gridtalk_engine::EngineError;
use gridtalk_io::StoreError;

pub const EXIT_SUCCESS: u8 = 0;

/// General error. Prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

pub const EXIT_USAGE: u8 = 2;

pub const EXIT_SHEET_NOT_FOUND: u8 = 3;

pub const EXIT_OUT_OF_BOUNDS: u8 = 4;

pub const EXIT_IO: u8 = 5;

/// The user rejected the proposed action; nothing was changed.
pub const EXIT_CANCELLED: u8 = 10;

/// The user confirmed but the action reported failure.
pub const EXIT_ACTION_FAILED: u8 = 11;

pub fn store_exit_code(err: &StoreError) -> u8 {
    match err {
        StoreError::Engine(e) => engine_exit_code(e),
        StoreError::Open { .. } | StoreError::Save { .. } | StoreError::Io(_) => EXIT_IO,
    }
}

pub fn engine_exit_code(err: &EngineError) -> u8 {
    match err {
        EngineError::InvalidReference(_) => EXIT_USAGE,
        EngineError::SheetNotFound { .. } => EXIT_SHEET_NOT_FOUND,
        EngineError::RowOutOfBounds { .. }
        | EngineError::LimitExceeded { .. }
        | EngineError::RangeTooLarge { .. } => EXIT_OUT_OF_BOUNDS,
        EngineError::DuplicateSheet(_) => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_SHEET_NOT_FOUND,
            EXIT_OUT_OF_BOUNDS,
            EXIT_IO,
            EXIT_CANCELLED,
            EXIT_ACTION_FAILED,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
