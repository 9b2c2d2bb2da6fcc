use serde::{Deserialize, Serialize};

/// A typed cell value as last stored in the document.
///
/// Dates and errors keep only their display text; this engine never computes
/// formulas, so a formula cell's value is whatever result was cached on disk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    #[default]
    Empty,
    String(String),
    Number(f64),
    Boolean(bool),
    Date(String),
    Error(String),
}

impl CellValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::String(_) => "string",
            CellValue::Number(_) => "number",
            CellValue::Boolean(_) => "boolean",
            CellValue::Date(_) => "date",
            CellValue::Error(_) => "error",
        }
    }

    /// Empty, or a cleared (empty-string) literal.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::String(s) | CellValue::Date(s) | CellValue::Error(s) => Some(s),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) | CellValue::Date(s) | CellValue::Error(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }
}

/// Integers print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    /// Formula text without the leading '='.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl Cell {
    pub fn literal(value: CellValue) -> Self {
        Self { value, formula: None }
    }

    pub fn formula(text: impl Into<String>, cached: CellValue) -> Self {
        Self {
            value: cached,
            formula: Some(text.into()),
        }
    }

    pub fn has_formula(&self) -> bool {
        self.formula.is_some()
    }

    pub fn is_blank(&self) -> bool {
        self.formula.is_none() && self.value.is_blank()
    }
}

/// A value supplied by a caller for a write: JSON `null`, bool, number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl InputValue {
    pub fn is_number(&self) -> bool {
        matches!(self, InputValue::Number(_))
    }

    /// Strings starting with '=' become formulas (text after the '='), with no
    /// cached result. `Null` clears to an empty string literal.
    pub fn into_cell(self) -> Cell {
        match self {
            InputValue::Null => Cell::literal(CellValue::String(String::new())),
            InputValue::Bool(b) => Cell::literal(CellValue::Boolean(b)),
            InputValue::Number(n) => Cell::literal(CellValue::Number(n)),
            InputValue::Text(s) => match s.strip_prefix('=') {
                Some(formula) => Cell::formula(formula, CellValue::Empty),
                None => Cell::literal(CellValue::String(s)),
            },
        }
    }
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self {
        InputValue::Text(s.to_string())
    }
}

impl From<f64> for InputValue {
    fn from(n: f64) -> Self {
        InputValue::Number(n)
    }
}

impl From<bool> for InputValue {
    fn from(b: bool) -> Self {
        InputValue::Bool(b)
    }
}
