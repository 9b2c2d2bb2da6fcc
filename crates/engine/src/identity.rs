//! Identifier auto-assignment for appended records.
//!
//! When a sheet's first header cell reads "ID", "No" or "№" (any case), new
//! rows get `max(existing ids) + 1` prepended unless the caller already
//! supplied a number in that position.

use gridtalk_core::CellAddress;

use crate::cell::InputValue;
use crate::sheet::Sheet;

const IDENTITY_HEADERS: [&str; 3] = ["id", "no", "№"];

pub fn is_identity_header(text: &str) -> bool {
    let key = text.trim().to_lowercase();
    IDENTITY_HEADERS.contains(&key.as_str())
}

/// Header cell and column scanned for ids: the top-left of the used range.
fn identity_column(sheet: &Sheet) -> Option<CellAddress> {
    let header = sheet.used()?.start;
    let text = sheet.get(header)?.value.as_text()?.to_string();
    is_identity_header(&text).then_some(header)
}

/// Next id for `sheet`, or `None` when its first column is not an id column.
pub fn next_identity(sheet: &Sheet) -> Option<f64> {
    let header = identity_column(sheet)?;
    let max = sheet
        .cells_iter()
        .filter(|(addr, _)| addr.col == header.col && addr.row > header.row)
        .filter_map(|(_, cell)| cell.value.as_number())
        .fold(0.0_f64, f64::max);
    Some(max + 1.0)
}

/// Prepend the next id to `values` when the policy applies. Returns the
/// assigned id.
pub fn assign_identity(sheet: &Sheet, values: &mut Vec<InputValue>) -> Option<f64> {
    if values.first().is_some_and(InputValue::is_number) {
        return None;
    }
    let id = next_identity(sheet)?;
    values.insert(0, InputValue::Number(id));
    Some(id)
}
