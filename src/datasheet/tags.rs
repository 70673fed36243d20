use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::types::{DuplicateEntry, TAG_DUPLICATE_POLICY};
use crate::config::StreamLayout;
use crate::excel::Sheet;

/// Read a unit-tag header row: cells from `first_col` rightwards, stopping at the first empty cell.
/// Position `i` in the result is column `first_col + i`.
pub fn read_unit_tags(sheet: &Sheet, header_row: u32, first_col: u32) -> Vec<String> {
    let mut tags = Vec::new();
    let mut col = first_col;
    while let Some(tag) = sheet.text(header_row, col) {
        tags.push(tag);
        col += 1;
    }
    tags
}

/// Streamtable tag rows keyed by tag name, plus the sheet's unit-tag header
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TagIndex {
    pub unit_tags: Vec<String>,
    pub rows: HashMap<String, u32>,
    pub duplicates: Vec<DuplicateEntry>,
}

impl TagIndex {
    pub fn row(&self, tag: &str) -> Option<u32> {
        self.rows.get(tag).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tag names sorted and deduplicated, as offered for mapping
    pub fn sorted_tags(&self) -> Vec<String> {
        self.rows.keys().cloned().collect::<BTreeSet<_>>().into_iter().collect()
    }
}

pub fn build_tag_index(sheet: &Sheet, layout: &StreamLayout, first_value_col: u32) -> TagIndex {
    let mut index = TagIndex {
        unit_tags: read_unit_tags(sheet, layout.header_row, first_value_col),
        ..TagIndex::default()
    };

    for row in layout.body_start_row..=sheet.max_row() {
        let Some(tag) = sheet.trimmed_text(row, layout.tag_col) else {
            continue;
        };
        if let Some(duplicate) = TAG_DUPLICATE_POLICY.insert(&mut index.rows, &tag, row) {
            log::debug!(
                "Sheet '{}': tag '{}' repeated, using row {} over row {}",
                sheet.name,
                duplicate.name,
                duplicate.kept_row,
                duplicate.dropped_row
            );
            index.duplicates.push(duplicate);
        }
    }

    index
}
