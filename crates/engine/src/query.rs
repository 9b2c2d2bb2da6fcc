//! Read-only queries over a workbook. Results are plain serializable data;
//! nothing here evaluates formulas.

use gridtalk_core::{CellAddress, Range};
use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::error::EngineError;
use crate::limits::check_read;
use crate::sheet::Sheet;
use crate::workbook::Workbook;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetInfo {
    pub name: String,
    pub row_count: usize,
    pub col_count: usize,
    pub used_range: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellResult {
    pub sheet: String,
    pub cell: String,
    pub value: CellValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaResult {
    pub sheet: String,
    pub cell: String,
    pub formula: Option<String>,
    pub has_formula: bool,
}

/// A rectangular snapshot, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeResult {
    pub sheet: String,
    pub range: String,
    pub data: Vec<Vec<CellValue>>,
    pub row_count: usize,
    pub col_count: usize,
}

impl SheetInfo {
    fn of(sheet: &Sheet) -> Self {
        Self {
            name: sheet.name.clone(),
            row_count: sheet.row_count(),
            col_count: sheet.col_count(),
            used_range: sheet.used_range().to_string(),
        }
    }
}

fn snapshot(sheet: &Sheet, range: Range) -> Result<RangeResult, EngineError> {
    let range = range.normalize();
    check_read(range)?;
    let data = (range.start.row..=range.end.row)
        .map(|row| {
            (range.start.col..=range.end.col)
                .map(|col| sheet.cell(CellAddress::new(row, col)).value)
                .collect()
        })
        .collect();
    Ok(RangeResult {
        sheet: sheet.name.clone(),
        range: range.to_string(),
        data,
        row_count: range.row_count(),
        col_count: range.col_count(),
    })
}

impl Workbook {
    pub fn list_sheets(&self) -> Vec<SheetInfo> {
        self.sheets().iter().map(SheetInfo::of).collect()
    }

    /// Value at `reference`. Addresses outside the used range read as empty.
    pub fn read_cell(&self, sheet: &str, reference: &str) -> Result<CellResult, EngineError> {
        let sheet = self.sheet(sheet)?;
        let addr = CellAddress::parse(reference)?;
        let cell = sheet.cell(addr);
        Ok(CellResult {
            sheet: sheet.name.clone(),
            cell: addr.to_string(),
            value: cell.value,
            formula: cell.formula,
        })
    }

    pub fn read_formula(&self, sheet: &str, reference: &str) -> Result<FormulaResult, EngineError> {
        let sheet = self.sheet(sheet)?;
        let addr = CellAddress::parse(reference)?;
        let formula = sheet.get(addr).and_then(|c| c.formula.clone());
        Ok(FormulaResult {
            sheet: sheet.name.clone(),
            cell: addr.to_string(),
            has_formula: formula.is_some(),
            formula,
        })
    }

    /// Corners may come in any order.
    pub fn read_range(&self, sheet: &str, from: &str, to: &str) -> Result<RangeResult, EngineError> {
        let sheet = self.sheet(sheet)?;
        let range = Range::resolve_from_references(from, to)?;
        snapshot(sheet, range)
    }

    /// The sheet's whole used range; an empty sheet yields a single empty A1.
    pub fn read_sheet(&self, sheet: &str) -> Result<RangeResult, EngineError> {
        let sheet = self.sheet(sheet)?;
        snapshot(sheet, sheet.used_range())
    }
}
