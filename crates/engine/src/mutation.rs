//! Bounded in-memory mutations. Persisting the result is the caller's job.

use gridtalk_core::CellAddress;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cell::{CellValue, InputValue};
use crate::error::EngineError;
use crate::identity::assign_identity;
use crate::limits::WriteLimits;
use crate::query::CellResult;
use crate::workbook::Workbook;

/// Outcome of [`Workbook::add_row`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedRow {
    pub sheet: String,
    /// Where the row actually landed after clamping.
    pub row_index: usize,
    pub values: Vec<CellValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_id: Option<f64>,
}

/// Outcome of [`Workbook::delete_row`]: the removed row's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRow {
    pub sheet: String,
    pub row_index: usize,
    pub values: Vec<CellValue>,
}

impl Workbook {
    /// Store `value` at `reference`. Text starting with '=' becomes a formula.
    pub fn write_cell(
        &mut self,
        sheet: &str,
        reference: &str,
        value: InputValue,
        limits: &WriteLimits,
    ) -> Result<CellResult, EngineError> {
        let addr = CellAddress::parse(reference)?;
        let sheet = self.sheet_mut(sheet)?;
        limits.check(addr)?;

        let cell = value.into_cell();
        sheet.set(addr, cell.clone());
        debug!(sheet = %sheet.name, cell = %addr, "cell written");

        Ok(CellResult {
            sheet: sheet.name.clone(),
            cell: addr.to_string(),
            value: cell.value,
            formula: cell.formula,
        })
    }

    /// Remove one row; later rows move up.
    pub fn delete_row(&mut self, sheet: &str, row: usize) -> Result<DeletedRow, EngineError> {
        let sheet = self.sheet_mut(sheet)?;
        let row_count = sheet.row_extent();
        if row >= row_count {
            return Err(EngineError::RowOutOfBounds { row, row_count });
        }

        let values = sheet.row_cells(row).into_iter().map(|c| c.value).collect();
        sheet.remove_row(row);
        debug!(sheet = %sheet.name, row, "row deleted");

        Ok(DeletedRow {
            sheet: sheet.name.clone(),
            row_index: row,
            values,
        })
    }

    /// Insert a row at `row_index`, clamped to the end of the sheet. Values
    /// fill from column A. An id is prepended for id-keyed sheets.
    pub fn add_row(
        &mut self,
        sheet: &str,
        row_index: usize,
        mut values: Vec<InputValue>,
        limits: &WriteLimits,
    ) -> Result<AddedRow, EngineError> {
        let sheet = self.sheet_mut(sheet)?;
        let extent = sheet.row_extent();
        let row = row_index.min(extent);

        let assigned_id = assign_identity(sheet, &mut values);

        // The last row after the shift sits at index `extent`.
        limits.check_row(extent)?;
        if let Some(last_col) = values.len().checked_sub(1) {
            limits.check_col(last_col)?;
        }

        sheet.open_row(row);
        let mut stored = Vec::with_capacity(values.len());
        for (col, value) in values.into_iter().enumerate() {
            let cell = value.into_cell();
            stored.push(cell.value.clone());
            sheet.set(CellAddress::new(row, col), cell);
        }
        debug!(sheet = %sheet.name, row, ?assigned_id, "row added");

        Ok(AddedRow {
            sheet: sheet.name.clone(),
            row_index: row,
            values: stored,
            assigned_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::sheet::Sheet;

    fn text(s: &str) -> Cell {
        Cell::literal(CellValue::String(s.into()))
    }

    fn num(n: f64) -> Cell {
        Cell::literal(CellValue::Number(n))
    }

    fn users() -> Workbook {
        let mut rows = vec![vec![text("ID"), text("Name"), text("Email"), text("Role"), text("Salary")]];
        for (i, name) in ["Ann", "Bob", "Cid", "Dee", "Eve"].iter().enumerate() {
            rows.push(vec![
                num(i as f64 + 1.0),
                text(name),
                text(&format!("{}@example.com", name.to_lowercase())),
                text("Staff"),
                num(4000.0 + i as f64 * 100.0),
            ]);
        }
        Workbook::from_sheets(vec![Sheet::from_rows("Users", rows)]).unwrap()
    }

    fn name_at(wb: &Workbook, row: usize) -> CellValue {
        wb.sheet("Users").unwrap().cell(CellAddress::new(row, 1)).value
    }

    #[test]
    fn test_write_cell_limits() {
        let mut wb = users();
        let limits = WriteLimits::default();

        let err = wb.write_cell("Users", "A20002", InputValue::from(1.0), &limits).unwrap_err();
        assert!(matches!(err, EngineError::LimitExceeded { index: 20_001, .. }));

        let ok = wb.write_cell("Users", "A20000", InputValue::from(1.0), &limits).unwrap();
        assert_eq!(ok.cell, "A20000");
        assert_eq!(wb.sheet("Users").unwrap().used_range().to_string(), "A1:E20000");
    }

    #[test]
    fn test_write_cell_custom_limits() {
        let mut wb = users();
        let limits = WriteLimits { max_row: 10, max_col: 2 };
        assert!(wb.write_cell("Users", "D1", InputValue::Null, &limits).is_err());
        assert!(wb.write_cell("Users", "C11", InputValue::Null, &limits).is_ok());
    }

    #[test]
    fn test_write_formula_and_null() {
        let mut wb = users();
        let limits = WriteLimits::default();

        let result = wb.write_cell("Users", "F2", InputValue::from("=E2*12"), &limits).unwrap();
        assert_eq!(result.formula.as_deref(), Some("E2*12"));
        assert_eq!(wb.read_formula("Users", "F2").unwrap().formula.as_deref(), Some("E2*12"));

        wb.write_cell("Users", "B2", InputValue::Null, &limits).unwrap();
        assert_eq!(name_at(&wb, 1), CellValue::String(String::new()));
        assert!(wb.sheet("Users").unwrap().get(CellAddress::new(1, 1)).is_some());
    }

    #[test]
    fn test_write_unknown_sheet() {
        let mut wb = users();
        let err = wb
            .write_cell("Sales", "A1", InputValue::from(1.0), &WriteLimits::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::SheetNotFound { .. }));
    }

    #[test]
    fn test_delete_row_shifts_up() {
        let mut wb = users();
        let before_row4 = name_at(&wb, 4);

        let deleted = wb.delete_row("Users", 2).unwrap();
        assert_eq!(deleted.values[1], CellValue::String("Bob".into()));

        let sheet = wb.sheet("Users").unwrap();
        assert_eq!(sheet.row_count() - 1, 4);
        assert_eq!(name_at(&wb, 3), before_row4);
    }

    #[test]
    fn test_delete_row_out_of_bounds() {
        let mut wb = users();
        assert_eq!(
            wb.delete_row("Users", 6).unwrap_err(),
            EngineError::RowOutOfBounds { row: 6, row_count: 6 }
        );
        assert!(wb.delete_row("Users", 5).is_ok());
    }

    #[test]
    fn test_add_row_assigns_identity() {
        let mut wb = users();
        let values = vec![
            InputValue::from("Alexsandr"),
            InputValue::from("alex@gmail.com"),
            InputValue::from("Developer"),
            InputValue::from(4760.0),
        ];
        let added = wb.add_row("Users", 6, values, &WriteLimits::default()).unwrap();

        assert_eq!(added.assigned_id, Some(6.0));
        assert_eq!(added.row_index, 6);
        assert_eq!(
            added.values,
            vec![
                CellValue::Number(6.0),
                CellValue::String("Alexsandr".into()),
                CellValue::String("alex@gmail.com".into()),
                CellValue::String("Developer".into()),
                CellValue::Number(4760.0),
            ]
        );
        let stored: Vec<_> = wb
            .sheet("Users")
            .unwrap()
            .row_cells(6)
            .into_iter()
            .map(|c| c.value)
            .collect();
        assert_eq!(stored, added.values);
    }

    #[test]
    fn test_add_row_clamps_and_inserts() {
        let mut wb = users();
        let added = wb
            .add_row("Users", 999, vec![InputValue::from(77.0)], &WriteLimits::default())
            .unwrap();
        assert_eq!(added.row_index, 6);
        assert_eq!(added.assigned_id, None);

        let added = wb
            .add_row("Users", 1, vec![InputValue::from("Zed")], &WriteLimits::default())
            .unwrap();
        assert_eq!(added.row_index, 1);
        assert_eq!(added.assigned_id, Some(78.0));
        assert_eq!(name_at(&wb, 2), CellValue::String("Ann".into()));
        assert_eq!(wb.sheet("Users").unwrap().row_extent(), 8);
    }

    #[test]
    fn test_add_row_respects_limits() {
        let mut wb = users();
        let limits = WriteLimits { max_row: 5, max_col: 1000 };
        let err = wb.add_row("Users", 6, vec![InputValue::from("x")], &limits).unwrap_err();
        assert!(matches!(err, EngineError::LimitExceeded { .. }));
        assert_eq!(wb.sheet("Users").unwrap().row_extent(), 6);
    }
}
