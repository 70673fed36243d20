//! Reconciliation of master equipment datasheets against streamtable exports.
//!
//! This module provides:
//! - Category block extraction from master sheets
//! - Streamtable tag indexing and unit-tag column alignment
//! - Per-sheet value and unit reconciliation
//! - Workbook-level passes over in-memory models, files, or bytes
//! - A mapping survey listing what can be paired

pub mod types;
pub mod block;
pub mod tags;
pub mod mapping;
pub mod align;
pub mod reconcile;
pub mod populate;
pub mod survey;

// Re-export commonly used types and functions
pub use types::*;
pub use block::{extract_block, BlockLabels, ParameterBlock};
pub use tags::{build_tag_index, read_unit_tags, TagIndex};
pub use mapping::{Mapping, SheetMapping};
pub use align::{align_columns, ColumnAlignment, ColumnPair};
pub use reconcile::{plan_sheet, reconcile_sheet, ReconcileOptions, SheetPlan};
pub use populate::{
    populate, populate_bytes, populate_files, PopulateResult, PopulateSummary, PopulatedDocument,
    SheetEdits,
};
pub use survey::{survey, MappingSurvey, MappingTemplate, SheetSurvey, SurveySkip, SurveySkipReason};
