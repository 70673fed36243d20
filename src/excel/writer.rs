use std::io::Cursor;
use std::path::{Path, PathBuf};
use umya_spreadsheet::{reader, writer, Border, NumberingFormat, Spreadsheet, Worksheet};

use super::reader::cell_reference;
use super::types::{CellEdit, CellMark, CellValue, ExcelError};

/// Prefix of the default output file name
pub const OUTPUT_PREFIX: &str = "Master_DataSheet_SysCADPopulated";

const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Open a workbook for editing, keeping every style, formula and sheet intact
pub fn open_spreadsheet(path: &Path) -> Result<Spreadsheet, ExcelError> {
    if !path.exists() {
        return Err(ExcelError::file_not_found(&path.display().to_string()));
    }

    reader::xlsx::read(path)
        .map_err(|e| ExcelError::read_error(format!("Failed to open workbook: {}", e)))
}

pub fn open_spreadsheet_from_bytes(bytes: &[u8]) -> Result<Spreadsheet, ExcelError> {
    reader::xlsx::read_reader(Cursor::new(bytes), true)
        .map_err(|e| ExcelError::invalid_format(format!("Failed to open workbook: {}", e)))
}

/// Apply edits to one sheet of an open workbook. Returns how many were applied.
pub fn apply_edits(book: &mut Spreadsheet, sheet: &str, edits: &[CellEdit]) -> Result<u32, ExcelError> {
    let worksheet = book
        .get_sheet_by_name_mut(sheet)
        .ok_or_else(|| ExcelError::sheet_not_found(sheet))?;

    let mut edits_applied = 0;
    for edit in edits {
        if edit.row == 0 || edit.col == 0 {
            return Err(ExcelError::write_error(format!(
                "Sheet '{}': invalid cell position ({}, {})",
                sheet, edit.row, edit.col
            )));
        }
        apply_single_edit(worksheet, edit);
        log::debug!(
            "Sheet '{}': {} = {:?}",
            sheet,
            cell_reference(edit.row, edit.col),
            edit.value
        );
        edits_applied += 1;
    }

    Ok(edits_applied)
}

/// Apply a single cell edit
fn apply_single_edit(worksheet: &mut Worksheet, edit: &CellEdit) {
    // umya addresses cells as (column, row)
    let coordinate = (edit.col, edit.row);
    let cell = worksheet.get_cell_mut(coordinate);

    match &edit.value {
        CellValue::Empty => {
            cell.set_value_string("");
        }
        CellValue::String(s) => {
            cell.set_value_string(s.as_str());
        }
        CellValue::Float(n) => {
            cell.set_value_number(*n);
        }
        CellValue::Int(i) => {
            cell.set_value_number(*i as f64);
        }
        CellValue::Boolean(b) => {
            cell.set_value_bool(*b);
        }
        CellValue::DateTime { serial, .. } => {
            cell.set_value_number(*serial);
        }
        // umya only serializes the generic #VALUE! error, so the code is kept as text
        CellValue::Error(e) => {
            cell.set_value_string(e.as_str());
        }
    }

    if let CellValue::DateTime { serial, .. } = &edit.value {
        worksheet
            .get_style_mut(coordinate)
            .get_number_format_mut()
            .set_format_code(date_format(*serial));
    }

    if let Some(mark) = edit.mark {
        apply_mark(worksheet, coordinate, mark);
    }
}

/// Date-only serials get a date format, anything with a time of day a date-time one
fn date_format(serial: f64) -> &'static str {
    if serial.fract() == 0.0 {
        NumberingFormat::FORMAT_DATE_YYYYMMDD
    } else {
        DATETIME_FORMAT
    }
}

fn apply_mark(worksheet: &mut Worksheet, coordinate: (u32, u32), mark: CellMark) {
    let style = worksheet.get_style_mut(coordinate);

    let borders = style.get_borders_mut();
    borders.get_left_mut().set_border_style(Border::BORDER_THIN);
    borders.get_right_mut().set_border_style(Border::BORDER_THIN);
    borders.get_top_mut().set_border_style(Border::BORDER_THIN);
    borders.get_bottom_mut().set_border_style(Border::BORDER_THIN);

    if mark == CellMark::BoldBorder {
        style.get_font_mut().set_bold(true);
    }
}

pub fn save_spreadsheet(book: &Spreadsheet, path: &Path) -> Result<(), ExcelError> {
    writer::xlsx::write(book, path)
        .map_err(|e| ExcelError::write_error(format!("Failed to save workbook: {}", e)))
}

pub fn save_spreadsheet_to_bytes(book: &Spreadsheet) -> Result<Vec<u8>, ExcelError> {
    let mut buffer = Cursor::new(Vec::new());
    writer::xlsx::write_writer(book, &mut buffer)
        .map_err(|e| ExcelError::write_error(format!("Failed to serialize workbook: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Create a backup of the file before editing
pub fn create_backup(path: &Path) -> Result<PathBuf, ExcelError> {
    if !path.exists() {
        return Err(ExcelError::file_not_found(&path.display().to_string()));
    }

    let backup = PathBuf::from(format!(
        "{}.backup.{}",
        path.display(),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));

    std::fs::copy(path, &backup)
        .map_err(|e| ExcelError::write_error(format!("Failed to create backup: {}", e)))?;

    Ok(backup)
}

/// File name for a populated master, stamped with the time of the pass
pub fn default_output_name(now: chrono::NaiveDateTime) -> String {
    format!("{}_{}.xlsx", OUTPUT_PREFIX, now.format("%Y-%m-%d_%H-%M"))
}
