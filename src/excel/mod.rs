//! Excel module for loading workbooks and writing edits back.
//!
//! This module provides:
//! - Loading workbooks into an in-memory sheet model (cached values only)
//! - Writing cell edits while preserving formulas and formatting
//! - Checksums and backups of workbook files

pub mod types;
pub mod reader;
pub mod writer;

// Re-export commonly used types and functions
pub use types::*;
pub use reader::{
    cell_reference, checksum_bytes, column_index_to_letter, compute_checksum, load_workbook,
    load_workbook_from_bytes,
};
pub use writer::{
    apply_edits, create_backup, default_output_name, open_spreadsheet,
    open_spreadsheet_from_bytes, save_spreadsheet, save_spreadsheet_to_bytes,
};
