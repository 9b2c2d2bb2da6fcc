use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::sheet::Sheet;

/// Ordered collection of uniquely named sheets. The whole workbook is the
/// unit of load and save.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from sheets, rejecting duplicate names.
    pub fn from_sheets(sheets: Vec<Sheet>) -> Result<Self, EngineError> {
        let mut workbook = Self::new();
        for sheet in sheets {
            workbook.add_sheet(sheet)?;
        }
        Ok(workbook)
    }

    pub fn add_sheet(&mut self, sheet: Sheet) -> Result<usize, EngineError> {
        if self.sheets.iter().any(|s| s.name == sheet.name) {
            return Err(EngineError::DuplicateSheet(sheet.name));
        }
        self.sheets.push(sheet);
        Ok(self.sheets.len() - 1)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Exact-name lookup.
    pub fn sheet(&self, name: &str) -> Result<&Sheet, EngineError> {
        match self.sheets.iter().position(|s| s.name == name) {
            Some(idx) => Ok(&self.sheets[idx]),
            None => Err(self.not_found(name)),
        }
    }

    pub fn sheet_mut(&mut self, name: &str) -> Result<&mut Sheet, EngineError> {
        match self.sheets.iter().position(|s| s.name == name) {
            Some(idx) => Ok(&mut self.sheets[idx]),
            None => Err(self.not_found(name)),
        }
    }

    fn not_found(&self, name: &str) -> EngineError {
        EngineError::SheetNotFound {
            sheet: name.to_string(),
            available: self.sheets.iter().map(|s| s.name.clone()).collect(),
        }
    }
}
