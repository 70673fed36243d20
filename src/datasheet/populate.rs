use std::path::{Path, PathBuf};

use super::mapping::Mapping;
use super::reconcile::{reconcile_sheet, ReconcileOptions};
use super::types::{PopulateReport, SheetSkip, SkipReason};
use crate::config::LayoutConfig;
use crate::excel::{self, CellEdit, ExcelError, Workbook};

/// Edits made to one master sheet during a pass
#[derive(Debug, Clone, PartialEq)]
pub struct SheetEdits {
    pub equipment: String,
    pub edits: Vec<CellEdit>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulateResult {
    pub report: PopulateReport,
    pub edits: Vec<SheetEdits>,
}

/// Result of a file-level pass
#[derive(Debug, Clone)]
pub struct PopulateSummary {
    pub report: PopulateReport,
    pub output_path: PathBuf,
    pub checksum: String,
}

/// Result of an in-memory pass
#[derive(Debug, Clone)]
pub struct PopulatedDocument {
    pub bytes: Vec<u8>,
    pub report: PopulateReport,
    pub checksum: String,
}

/// Master sheet names with a streamtable counterpart, in master order
pub fn common_equipment(master: &Workbook, stream: &Workbook) -> Vec<String> {
    master
        .sheet_names()
        .into_iter()
        .filter(|name| stream.contains(name))
        .map(str::to_string)
        .collect()
}

/// Master sheet names with no streamtable counterpart, sorted
pub fn missing_equipment(master: &Workbook, stream: &Workbook) -> Vec<String> {
    let mut missing: Vec<String> = master
        .sheet_names()
        .into_iter()
        .filter(|name| !stream.contains(name))
        .map(str::to_string)
        .collect();
    missing.sort();
    missing
}

/// Run one reconciliation pass, mutating `master` in place.
///
/// Sheets only in the master are reported as missing and left alone; sheets
/// only in the streamtable are ignored.
pub fn populate(
    master: &mut Workbook,
    stream: &Workbook,
    mapping: &Mapping,
    layout: &LayoutConfig,
    options: ReconcileOptions,
) -> PopulateResult {
    let mut result = PopulateResult::default();
    result.report.missing = missing_equipment(master, stream);
    if !result.report.missing.is_empty() {
        log::info!(
            "Streamtable missing for: {}",
            result.report.missing.join(", ")
        );
    }

    for equipment in common_equipment(master, stream) {
        let Some(pairs) = mapping.for_equipment(&equipment) else {
            log::info!("Sheet '{}': no mapping entries, skipping", equipment);
            result.report.skipped.push(SheetSkip {
                equipment,
                reason: SkipReason::Unmapped,
            });
            continue;
        };
        let (Some(master_sheet), Some(stream_sheet)) =
            (master.sheet_mut(&equipment), stream.sheet(&equipment))
        else {
            continue;
        };

        let plan = reconcile_sheet(master_sheet, stream_sheet, pairs, layout, options);
        if plan.block_absent {
            log::info!(
                "Sheet '{}': '{}' block not found, skipping",
                equipment,
                layout.target_category
            );
            result.report.skipped.push(SheetSkip {
                equipment,
                reason: SkipReason::BlockAbsent,
            });
            continue;
        }

        result.report.sheets.push(plan.outcome);
        if !plan.edits.is_empty() {
            result.edits.push(SheetEdits {
                equipment,
                edits: plan.edits,
            });
        }
    }

    result
}

/// Populate the master workbook at `master_path` and write the result to `output_path`.
///
/// Both documents are fully loaded before anything is written, so an
/// unreadable input fails the pass without producing output.
pub fn populate_files(
    master_path: &Path,
    stream_path: &Path,
    mapping: &Mapping,
    output_path: &Path,
    layout: &LayoutConfig,
    options: ReconcileOptions,
) -> Result<PopulateSummary, ExcelError> {
    let mut master = excel::load_workbook(master_path)?;
    let stream = excel::load_workbook(stream_path)?;
    let mut book = excel::open_spreadsheet(master_path)?;

    let result = populate(&mut master, &stream, mapping, layout, options);
    for sheet in &result.edits {
        excel::apply_edits(&mut book, &sheet.equipment, &sheet.edits)?;
    }

    excel::save_spreadsheet(&book, output_path)?;
    let checksum = excel::compute_checksum(output_path)?;

    Ok(PopulateSummary {
        report: result.report,
        output_path: output_path.to_path_buf(),
        checksum,
    })
}

/// In-memory variant of [`populate_files`] for xlsx documents held as bytes
pub fn populate_bytes(
    master_bytes: &[u8],
    stream_bytes: &[u8],
    mapping: &Mapping,
    layout: &LayoutConfig,
    options: ReconcileOptions,
) -> Result<PopulatedDocument, ExcelError> {
    let mut master = excel::load_workbook_from_bytes(master_bytes)?;
    let stream = excel::load_workbook_from_bytes(stream_bytes)?;
    let mut book = excel::open_spreadsheet_from_bytes(master_bytes)?;

    let result = populate(&mut master, &stream, mapping, layout, options);
    for sheet in &result.edits {
        excel::apply_edits(&mut book, &sheet.equipment, &sheet.edits)?;
    }

    let bytes = excel::save_spreadsheet_to_bytes(&book)?;
    let checksum = excel::checksum_bytes(&bytes);

    Ok(PopulatedDocument {
        bytes,
        report: result.report,
        checksum,
    })
}
