//! Sheet layout conventions shared by the master datasheet and the streamtable.
//!
//! Every position is 1-based, matching what a user sees in Excel. The defaults
//! describe the layout the master datasheet generator produces; a JSON file may
//! override any subset of fields.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::datasheet::block::BlockLabels;
use crate::excel::ExcelError;

/// Canonical category blocks of a master datasheet, in sheet order
pub const DEFAULT_CATEGORIES: [&str; 5] = [
    "SysCAD Inputs",
    "Engineering Inputs",
    "Lab/Pilot Inputs",
    "Project Constants",
    "Vendor Inputs",
];

/// Category whose parameters are filled from the streamtable
pub const DEFAULT_TARGET_CATEGORY: &str = "SysCAD Inputs";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub master: MasterLayout,
    pub stream: StreamLayout,
    /// First column holding per-unit-tag values, in both documents
    pub first_value_col: u32,
    pub categories: Vec<String>,
    pub target_category: String,
    /// Decimal places floats are rounded to before being written
    pub decimal_places: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MasterLayout {
    pub header_row: u32,
    pub label_col: u32,
    pub name_col: u32,
    pub unit_col: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamLayout {
    pub header_row: u32,
    pub body_start_row: u32,
    pub unit_col: u32,
    pub tag_col: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            master: MasterLayout::default(),
            stream: StreamLayout::default(),
            first_value_col: 4,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            target_category: DEFAULT_TARGET_CATEGORY.to_string(),
            decimal_places: 2,
        }
    }
}

impl Default for MasterLayout {
    fn default() -> Self {
        MasterLayout {
            header_row: 3,
            label_col: 1,
            name_col: 2,
            unit_col: 3,
        }
    }
}

impl Default for StreamLayout {
    fn default() -> Self {
        StreamLayout {
            header_row: 1,
            body_start_row: 3,
            unit_col: 2,
            tag_col: 3,
        }
    }
}

impl LayoutConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ExcelError> {
        let layout: LayoutConfig = serde_json::from_str(json)
            .map_err(|e| ExcelError::config_error(format!("Invalid layout config: {}", e)))?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExcelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ExcelError::config_error(format!("Failed to read layout {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ExcelError> {
        let positions = [
            ("master.header_row", self.master.header_row),
            ("master.label_col", self.master.label_col),
            ("master.name_col", self.master.name_col),
            ("master.unit_col", self.master.unit_col),
            ("stream.header_row", self.stream.header_row),
            ("stream.body_start_row", self.stream.body_start_row),
            ("stream.unit_col", self.stream.unit_col),
            ("stream.tag_col", self.stream.tag_col),
            ("first_value_col", self.first_value_col),
        ];
        if let Some((field, _)) = positions.iter().find(|(_, value)| *value == 0) {
            return Err(ExcelError::config_error(format!(
                "{} is 1-based and cannot be 0",
                field
            )));
        }
        if !self.categories.iter().any(|c| c == &self.target_category) {
            return Err(ExcelError::config_error(format!(
                "Target category '{}' is not one of the configured categories",
                self.target_category
            )));
        }
        if self.decimal_places < 0 {
            return Err(ExcelError::config_error("decimal_places cannot be negative"));
        }
        Ok(())
    }

    /// Open/close labels of the target block: it ends where the next canonical category starts
    pub fn target_block(&self) -> BlockLabels<'_> {
        self.block_for(&self.target_category)
    }

    pub fn block_for<'a>(&'a self, category: &'a str) -> BlockLabels<'a> {
        let close = self
            .categories
            .iter()
            .position(|c| c == category)
            .and_then(|idx| self.categories.get(idx + 1))
            .map(String::as_str);
        BlockLabels {
            open: category,
            close,
        }
    }
}
