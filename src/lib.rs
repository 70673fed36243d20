//! Fills the "SysCAD Inputs" block of a master equipment datasheet from a
//! SysCAD streamtable export.
//!
//! A pass takes the master workbook, the streamtable workbook and a mapping of
//! master parameter names to streamtable tags per equipment sheet. Values are
//! copied column by column where both documents carry the same unit tag, and
//! the streamtable's unit declarations replace the master's. The master is
//! written back with everything else left as it was.

pub mod config;
pub mod datasheet;
pub mod excel;

pub use config::LayoutConfig;
pub use datasheet::{
    populate, populate_bytes, populate_files, survey, Mapping, MappingSurvey, PopulateReport,
    PopulateResult, PopulateSummary, PopulatedDocument, ReconcileOptions,
};
pub use excel::{ExcelError, ExcelErrorType, Sheet, Workbook};
