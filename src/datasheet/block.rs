//! Locating a named category block inside a master equipment sheet.
//!
//! The scan is a small state machine over `(row, column-1 label)` tokens. A
//! block opens on the first label containing the open label and closes on the
//! first later label containing the close label; rows in between whose name
//! cell is non-blank are the block's parameters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{DuplicateEntry, PARAMETER_DUPLICATE_POLICY};
use crate::config::MasterLayout;
use crate::excel::Sheet;

/// Label substrings that open and close one category block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLabels<'a> {
    pub open: &'a str,
    /// `None` runs the block to the end of the sheet
    pub close: Option<&'a str>,
}

/// Parameters found inside one category block
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParameterBlock {
    /// Parameter names in sheet order, each listed once
    pub names: Vec<String>,
    pub rows: HashMap<String, u32>,
    pub duplicates: Vec<DuplicateEntry>,
    /// Row carrying the open label, `None` when the block is absent
    pub opened_at: Option<u32>,
}

impl ParameterBlock {
    pub fn is_absent(&self) -> bool {
        self.opened_at.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn row(&self, name: &str) -> Option<u32> {
        self.rows.get(name).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    Inside,
    Closed,
}

/// What a single row contributes once the state machine has consumed its label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowRole {
    Ignored,
    Opening,
    Body,
}

fn step(state: ScanState, label: Option<&str>, labels: BlockLabels<'_>) -> (ScanState, RowRole) {
    match state {
        ScanState::Outside => match label {
            Some(text) if text.contains(labels.open) => (ScanState::Inside, RowRole::Opening),
            _ => (ScanState::Outside, RowRole::Ignored),
        },
        ScanState::Inside => match (label, labels.close) {
            (Some(text), Some(close)) if text.contains(close) => (ScanState::Closed, RowRole::Ignored),
            _ => (ScanState::Inside, RowRole::Body),
        },
        ScanState::Closed => (ScanState::Closed, RowRole::Ignored),
    }
}

/// Extract the parameter names of the block delimited by `labels`.
///
/// A block that never opens yields an empty result. A block still open at
/// the last row ends there.
pub fn extract_block(sheet: &Sheet, layout: &MasterLayout, labels: BlockLabels<'_>) -> ParameterBlock {
    let mut block = ParameterBlock::default();
    let mut state = ScanState::Outside;

    for row in 1..=sheet.max_row() {
        let label = sheet.text(row, layout.label_col);
        let (next, role) = step(state, label.as_deref(), labels);
        state = next;

        match role {
            RowRole::Opening => block.opened_at = Some(row),
            RowRole::Body => {
                let Some(name) = sheet.trimmed_text(row, layout.name_col) else {
                    continue;
                };
                match PARAMETER_DUPLICATE_POLICY.insert(&mut block.rows, &name, row) {
                    None => block.names.push(name),
                    Some(duplicate) => {
                        log::warn!(
                            "Sheet '{}': parameter '{}' defined again at row {} (keeping row {})",
                            sheet.name,
                            duplicate.name,
                            duplicate.dropped_row,
                            duplicate.kept_row
                        );
                        block.duplicates.push(duplicate);
                    }
                }
            }
            RowRole::Ignored => {}
        }

        if state == ScanState::Closed {
            break;
        }
    }

    block
}
