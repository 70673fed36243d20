//! Reconciling one master equipment sheet against its streamtable sheet.
//!
//! Planning is pure: [`plan_sheet`] reads both sheets and returns the cell
//! edits to make. [`reconcile_sheet`] applies the plan to the in-memory master
//! and hands it back so the same edits can be replayed onto the workbook file.

use serde::{Deserialize, Serialize};

use super::align::align_columns;
use super::block::extract_block;
use super::mapping::SheetMapping;
use super::tags::{build_tag_index, read_unit_tags};
use super::types::{SheetOutcome, UnitChange};
use crate::config::LayoutConfig;
use crate::excel::{CellEdit, CellMark, CellValue, Sheet};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Append streamtable unit tags the master header lacks, so their values align too
    pub append_missing_unit_tags: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetPlan {
    pub edits: Vec<CellEdit>,
    pub outcome: SheetOutcome,
    /// The master sheet has no target category block
    pub block_absent: bool,
}

impl SheetPlan {
    fn push(&mut self, master: &Sheet, row: u32, col: u32, value: CellValue, mark: CellMark) {
        self.edits.push(CellEdit {
            row,
            col,
            value,
            original_value: Some(master.get(row, col).clone()),
            mark: Some(mark),
        });
    }
}

pub fn plan_sheet(
    master: &Sheet,
    stream: &Sheet,
    pairs: &SheetMapping,
    layout: &LayoutConfig,
    options: ReconcileOptions,
) -> SheetPlan {
    let mut plan = SheetPlan {
        outcome: SheetOutcome {
            equipment: master.name.clone(),
            ..SheetOutcome::default()
        },
        ..SheetPlan::default()
    };
    if pairs.is_empty() {
        return plan;
    }

    let block = extract_block(master, &layout.master, layout.target_block());
    plan.outcome.duplicate_parameters = block.duplicates.clone();
    if block.is_absent() {
        plan.block_absent = true;
        plan.outcome.unmatched_pairs = pairs.len() as u32;
        return plan;
    }

    let tag_index = build_tag_index(stream, &layout.stream, layout.first_value_col);
    plan.outcome.duplicate_tags = tag_index.duplicates.clone();

    let mut master_tags = read_unit_tags(master, layout.master.header_row, layout.first_value_col);
    if options.append_missing_unit_tags {
        append_unit_tags(&mut plan, master, &mut master_tags, &tag_index.unit_tags, layout);
    }

    let alignment = align_columns(&master_tags, &tag_index.unit_tags, layout.first_value_col);
    plan.outcome.master_only_columns = alignment.master_only.clone();

    for (parameter, tag) in pairs {
        let (Some(param_row), Some(tag_row)) = (block.row(parameter), tag_index.row(tag)) else {
            log::debug!(
                "Sheet '{}': skipping '{}' -> '{}', parameter or tag not found",
                master.name,
                parameter,
                tag
            );
            plan.outcome.unmatched_pairs += 1;
            continue;
        };

        for column in &alignment.pairs {
            let source = stream.get(tag_row, column.stream_col);
            if source.is_empty() {
                continue;
            }
            let value = source.rounded(layout.decimal_places);
            plan.push(master, param_row, column.master_col, value, CellMark::Border);
            plan.outcome.values_written += 1;
        }

        // The streamtable's unit declaration replaces the master's whenever they differ
        let unit_cell = stream.get(tag_row, layout.stream.unit_col);
        let Some(unit) = unit_cell.as_text() else {
            continue;
        };
        let previous = master.text(param_row, layout.master.unit_col);
        if previous.as_deref() == Some(unit.as_str()) {
            continue;
        }
        log::info!(
            "Sheet '{}': unit of '{}' changed from {:?} to '{}'",
            master.name,
            parameter,
            previous,
            unit
        );
        plan.push(
            master,
            param_row,
            layout.master.unit_col,
            unit_cell.clone(),
            CellMark::Border,
        );
        plan.outcome.unit_changes.push(UnitChange {
            parameter: parameter.clone(),
            tag: tag.clone(),
            row: param_row,
            previous,
            unit,
        });
    }

    plan
}

/// Extend the master header with streamtable unit tags it does not carry yet
fn append_unit_tags(
    plan: &mut SheetPlan,
    master: &Sheet,
    master_tags: &mut Vec<String>,
    stream_tags: &[String],
    layout: &LayoutConfig,
) {
    let header_row = layout.master.header_row;
    let missing: Vec<&String> = stream_tags
        .iter()
        .filter(|tag| !master_tags.contains(tag))
        .collect();
    for (position, tag) in missing.iter().enumerate() {
        let col = layout.first_value_col + master_tags.len() as u32;
        if !master.get(header_row, col).is_empty() {
            log::warn!(
                "Sheet '{}': cannot append unit tag '{}', header cell at column {} is occupied",
                master.name,
                tag,
                col
            );
            plan.outcome.blocked_unit_tags =
                missing[position..].iter().map(|t| t.to_string()).collect();
            break;
        }
        plan.push(master, header_row, col, CellValue::String(tag.to_string()), CellMark::BoldBorder);
        plan.outcome.appended_unit_tags.push(tag.to_string());
        master_tags.push(tag.to_string());
    }
}

/// Plan the sheet, apply the edits to `master`, and return the plan
pub fn reconcile_sheet(
    master: &mut Sheet,
    stream: &Sheet,
    pairs: &SheetMapping,
    layout: &LayoutConfig,
    options: ReconcileOptions,
) -> SheetPlan {
    let plan = plan_sheet(master, stream, pairs, layout, options);
    master.apply(&plan.edits);
    plan
}
