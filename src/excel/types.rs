use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Represents a cell value with type information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    Empty,
    String(String),
    Float(f64),
    Int(i64),
    Boolean(bool),
    /// Excel serial date (days since 1899-12-30) and its ISO 8601 rendering
    DateTime { serial: f64, iso: String },
    Error(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Text as a label or name cell would read it. Empty and error cells have none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty | CellValue::Error(_) => None,
            CellValue::String(s) if s.is_empty() => None,
            CellValue::String(s) => Some(s.clone()),
            CellValue::Float(f) => Some(format_number(*f)),
            CellValue::Int(i) => Some(i.to_string()),
            CellValue::Boolean(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::DateTime { iso, .. } => Some(iso.clone()),
        }
    }

    /// Round floating-point values to `places` decimals; every other type is returned unchanged.
    ///
    /// Rounds the exact binary value, so 2.675 (stored just below) becomes 2.67
    /// and an exact tie such as 0.125 goes to the even digit.
    pub fn rounded(&self, places: i32) -> CellValue {
        match self {
            CellValue::Float(f) if f.is_finite() => {
                let text = format!("{:.*}", places.max(0) as usize, f);
                match text.parse::<f64>() {
                    Ok(rounded) => CellValue::Float(rounded),
                    Err(_) => CellValue::Float(*f),
                }
            }
            other => other.clone(),
        }
    }
}

/// Integral floats print without a fractional part, like a spreadsheet shows them
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

/// Style applied to a cell the engine writes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CellMark {
    /// Thin border on all four sides
    Border,
    /// Bold font plus thin border, used for header cells
    BoldBorder,
}

/// A cell edit to be applied
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellEdit {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
    pub original_value: Option<CellValue>,
    pub mark: Option<CellMark>,
}

/// One worksheet held in memory. Rows and columns are 1-based.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<(u32, u32), CellValue>,
    marks: BTreeMap<(u32, u32), CellMark>,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Sheet {
            name: name.into(),
            cells: BTreeMap::new(),
            marks: BTreeMap::new(),
        }
    }

    pub fn get(&self, row: u32, col: u32) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&EMPTY_CELL)
    }

    pub fn set(&mut self, row: u32, col: u32, value: impl Into<CellValue>) {
        let value = value.into();
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    pub fn text(&self, row: u32, col: u32) -> Option<String> {
        self.get(row, col).as_text()
    }

    /// Cell text with surrounding whitespace removed; blank text counts as absent
    pub fn trimmed_text(&self, row: u32, col: u32) -> Option<String> {
        self.text(row, col)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    pub fn mark(&self, row: u32, col: u32) -> Option<CellMark> {
        self.marks.get(&(row, col)).copied()
    }

    /// Last row holding a non-empty cell, 0 for an empty sheet
    pub fn max_row(&self) -> u32 {
        self.cells.keys().map(|(row, _)| *row).max().unwrap_or(0)
    }

    /// Last column holding a non-empty cell, 0 for an empty sheet
    pub fn max_col(&self) -> u32 {
        self.cells.keys().map(|(_, col)| *col).max().unwrap_or(0)
    }

    pub fn apply(&mut self, edits: &[CellEdit]) {
        for edit in edits {
            self.set(edit.row, edit.col, edit.value.clone());
            if let Some(mark) = edit.mark {
                self.marks.insert((edit.row, edit.col), mark);
            }
        }
    }
}

/// An ordered set of sheets, one per equipment type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Workbook { sheets: Vec::new() }
    }

    /// Add a sheet, replacing any sheet already registered under the same name
    pub fn push(&mut self, sheet: Sheet) {
        match self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }
}

/// Excel-specific errors
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ExcelError {
    pub message: String,
    pub error_type: ExcelErrorType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExcelErrorType {
    FileNotFound,
    InvalidFormat,
    SheetNotFound,
    ReadError,
    WriteError,
    MappingError,
    ConfigError,
}

impl ExcelError {
    pub fn new(message: impl Into<String>, error_type: ExcelErrorType) -> Self {
        ExcelError {
            message: message.into(),
            error_type,
        }
    }

    pub fn file_not_found(path: &str) -> Self {
        ExcelError::new(format!("File not found: {}", path), ExcelErrorType::FileNotFound)
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::InvalidFormat)
    }

    pub fn sheet_not_found(sheet: &str) -> Self {
        ExcelError::new(format!("Sheet not found: {}", sheet), ExcelErrorType::SheetNotFound)
    }

    pub fn read_error(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::ReadError)
    }

    pub fn write_error(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::WriteError)
    }

    pub fn mapping_error(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::MappingError)
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::ConfigError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_only_touches_floats() {
        assert_eq!(CellValue::Float(12.345).rounded(2), CellValue::Float(12.35));
        assert_eq!(CellValue::Float(-0.004).rounded(2), CellValue::Float(-0.0));
        assert_eq!(CellValue::Int(7).rounded(2), CellValue::Int(7));
        assert_eq!(
            CellValue::String("1.23456".into()).rounded(2),
            CellValue::String("1.23456".into())
        );
    }

    #[test]
    fn test_rounding_follows_stored_value() {
        assert_eq!(CellValue::Float(2.675).rounded(2), CellValue::Float(2.67));
        assert_eq!(CellValue::Float(763.775).rounded(2), CellValue::Float(763.77));
        assert_eq!(CellValue::Float(0.125).rounded(2), CellValue::Float(0.12));
        assert_eq!(CellValue::Float(0.375).rounded(2), CellValue::Float(0.38));
        assert_eq!(CellValue::Float(-2.675).rounded(2), CellValue::Float(-2.67));
        assert_eq!(CellValue::Float(1234.5).rounded(0), CellValue::Float(1234.0));
    }

    #[test]
    fn test_rounding_leaves_dates_and_non_finite() {
        let date = CellValue::DateTime {
            serial: 45292.123456,
            iso: "2024-01-01T02:57:47".into(),
        };
        assert_eq!(date.rounded(2), date);
        assert!(matches!(CellValue::Float(f64::NAN).rounded(2), CellValue::Float(f) if f.is_nan()));
        assert_eq!(
            CellValue::Float(f64::INFINITY).rounded(2),
            CellValue::Float(f64::INFINITY)
        );
    }

    #[test]
    fn test_as_text() {
        assert_eq!(CellValue::Float(4.0).as_text().as_deref(), Some("4"));
        assert_eq!(CellValue::Float(4.5).as_text().as_deref(), Some("4.5"));
        assert_eq!(CellValue::String(String::new()).as_text(), None);
        assert_eq!(CellValue::Error("#REF!".into()).as_text(), None);
    }

    #[test]
    fn test_sheet_bounds_ignore_cleared_cells() {
        let mut sheet = Sheet::new("Pump-101");
        sheet.set(2, 5, "x");
        sheet.set(9, 1, 3.5);
        assert_eq!((sheet.max_row(), sheet.max_col()), (9, 5));

        sheet.set(9, 1, CellValue::Empty);
        assert_eq!((sheet.max_row(), sheet.max_col()), (2, 5));
        assert_eq!(sheet.get(9, 1), &CellValue::Empty);
    }

    #[test]
    fn test_apply_records_marks() {
        let mut sheet = Sheet::new("Pump-101");
        sheet.apply(&[CellEdit {
            row: 3,
            col: 4,
            value: "Train-A".into(),
            original_value: None,
            mark: Some(CellMark::BoldBorder),
        }]);
        assert_eq!(sheet.text(3, 4).as_deref(), Some("Train-A"));
        assert_eq!(sheet.mark(3, 4), Some(CellMark::BoldBorder));
        assert_eq!(sheet.mark(3, 5), None);
    }

    #[test]
    fn test_workbook_push_replaces_same_name() {
        let mut book = Workbook::new();
        book.push(Sheet::new("A"));
        book.push(Sheet::new("B"));
        let mut replacement = Sheet::new("A");
        replacement.set(1, 1, "new");
        book.push(replacement);

        assert_eq!(book.sheet_names(), vec!["A", "B"]);
        assert_eq!(book.sheet("A").and_then(|s| s.text(1, 1)).as_deref(), Some("new"));
    }
}
