//! Cell address codec.
//!
//! Columns use bijective base-26 letters (A=1 … Z=26, AA=27, …) on the wire
//! and zero-based indices in memory: column 0 is "A", column 26 is "AA".
//! Rows are 1-based on the wire and zero-based in memory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed cell or range text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid cell reference: {0}")]
    InvalidReference(String),
}

/// Zero-based cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: usize,
    pub col: usize,
}

impl CellAddress {
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Parse a reference like "b5" or "AA12" (case-insensitive).
    pub fn parse(reference: &str) -> Result<Self, AddressError> {
        parse_cell_reference(reference)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_index_to_letters(self.col), self.row + 1)
    }
}

impl FromStr for CellAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_cell_reference(s)
    }
}

/// Convert a zero-based column index to letters (0 = A, 25 = Z, 26 = AA).
pub fn column_index_to_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index as u128 + 1;
    while n > 0 {
        let digit = (n - 1) % 26;
        letters.push(b'A' + digit as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    // Only ASCII uppercase bytes were pushed
    letters.into_iter().map(char::from).collect()
}

/// Convert column letters back to a zero-based index ("A" = 0, "AA" = 26).
///
/// Lowercase letters are accepted. Anything else, including an empty string,
/// is an `InvalidReference`.
pub fn letters_to_column_index(letters: &str) -> Result<usize, AddressError> {
    let invalid = || AddressError::InvalidReference(letters.to_string());

    if letters.is_empty() {
        return Err(invalid());
    }

    let mut n: usize = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(invalid());
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(invalid)?;
    }
    Ok(n - 1)
}

/// Parse "letters+digits" into a zero-based address.
pub fn parse_cell_reference(reference: &str) -> Result<CellAddress, AddressError> {
    let invalid = || AddressError::InvalidReference(reference.to_string());

    let split = reference
        .find(|c: char| !c.is_ascii_alphabetic())
        .ok_or_else(invalid)?;
    let (letters, digits) = reference.split_at(split);

    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let row: usize = digits.parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }

    Ok(CellAddress {
        row: row - 1,
        col: letters_to_column_index(letters)?,
    })
}

/// Format an address as an uppercase reference ("A1").
pub fn format_cell_address(addr: CellAddress) -> String {
    addr.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_columns() {
        let expected: Vec<String> = (b'A'..=b'Z')
            .map(|b| (b as char).to_string())
            .chain(["AA".to_string(), "AB".to_string()])
            .collect();
        let actual: Vec<String> = (0..28).map(column_index_to_letters).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_column_boundaries() {
        assert_eq!(column_index_to_letters(701), "ZZ");
        assert_eq!(column_index_to_letters(702), "AAA");
        assert_eq!(letters_to_column_index("ZZ").unwrap(), 701);
        assert_eq!(letters_to_column_index("aaa").unwrap(), 702);
    }

    #[test]
    fn test_letters_rejects_non_alpha() {
        assert!(letters_to_column_index("").is_err());
        assert!(letters_to_column_index("A1").is_err());
        assert!(letters_to_column_index("A-").is_err());
        assert!(letters_to_column_index(&"Z".repeat(40)).is_err());
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(parse_cell_reference("A1").unwrap(), CellAddress::new(0, 0));
        assert_eq!(parse_cell_reference("c5").unwrap(), CellAddress::new(4, 2));
        assert_eq!(parse_cell_reference("AA12").unwrap(), CellAddress::new(11, 26));
    }

    #[test]
    fn test_parse_reference_errors() {
        for bad in ["", "A", "12", "A0", "1A", "A1B", "A 1", "A-1", "$A$1", "Ä1"] {
            assert_eq!(
                parse_cell_reference(bad),
                Err(AddressError::InvalidReference(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_and_from_str() {
        let addr: CellAddress = "b5".parse().unwrap();
        assert_eq!(addr.to_string(), "B5");
        assert_eq!(format_cell_address(CellAddress::new(9, 26)), "AA10");
    }

    proptest! {
        #[test]
        fn letters_round_trip(n in 0usize..1_000_000) {
            prop_assert_eq!(letters_to_column_index(&column_index_to_letters(n)).unwrap(), n);
        }

        #[test]
        fn reference_round_trip(letters in "[A-Za-z]{1,3}", row in 1u32..1_000_000) {
            let reference = format!("{letters}{row}");
            let addr = parse_cell_reference(&reference).unwrap();
            prop_assert_eq!(format_cell_address(addr), reference.to_uppercase());
        }
    }
}
