use calamine::{open_workbook_auto, Data, Range, Reader, Xlsx};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use super::types::*;

/// Load every sheet of a workbook as cached cell values (formulas are not evaluated)
pub fn load_workbook(path: &Path) -> Result<Workbook, ExcelError> {
    if !path.exists() {
        return Err(ExcelError::file_not_found(&path.display().to_string()));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| {
        ExcelError::read_error(format!("Failed to open workbook {}: {}", path.display(), e))
    })?;

    read_sheets(&mut workbook)
}

/// Load an xlsx workbook held in memory
pub fn load_workbook_from_bytes(bytes: &[u8]) -> Result<Workbook, ExcelError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| ExcelError::invalid_format(format!("Failed to open workbook: {}", e)))?;

    read_sheets(&mut workbook)
}

fn read_sheets<RS, R>(workbook: &mut R) -> Result<Workbook, ExcelError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_names = workbook.sheet_names().to_vec();
    let mut book = Workbook::new();

    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ExcelError::read_error(format!("Failed to read sheet '{}': {}", name, e)))?;
        book.push(convert_range(&name, &range));
    }

    Ok(book)
}

/// Copy a calamine range into a sheet, translating to absolute 1-based positions
fn convert_range(name: &str, range: &Range<Data>) -> Sheet {
    let mut sheet = Sheet::new(name);
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    for (row, col, data) in range.used_cells() {
        let value = convert_cell_value(Some(data));
        sheet.set(start_row + row as u32 + 1, start_col + col as u32 + 1, value);
    }

    sheet
}

/// Convert calamine Data to our CellValue
fn convert_cell_value(cell: Option<&Data>) -> CellValue {
    match cell {
        None => CellValue::Empty,
        Some(data) => match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::String(s.clone()),
            Data::Float(f) => CellValue::Float(*f),
            Data::Int(i) => CellValue::Int(*i),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::DateTime(dt) => CellValue::DateTime {
                serial: dt.as_f64(),
                iso: format_excel_datetime(dt.as_f64()),
            },
            Data::DateTimeIso(s) => match iso_to_serial(s) {
                Some(serial) => CellValue::DateTime {
                    serial,
                    iso: s.clone(),
                },
                None => CellValue::String(s.clone()),
            },
            Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        },
    }
}

fn excel_epoch() -> Option<chrono::NaiveDateTime> {
    chrono::NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format Excel datetime (days since 1899-12-30) to ISO 8601
fn format_excel_datetime(value: f64) -> String {
    let Some(epoch) = excel_epoch().map(|e| e.date()) else {
        return value.to_string();
    };
    let days = value.floor() as i64;
    let date = epoch + chrono::Duration::days(days);

    let total_seconds = (value.fract() * 86400.0).round() as u32;
    let time = chrono::NaiveTime::from_hms_opt(
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60,
    )
    .unwrap_or_default();

    chrono::NaiveDateTime::new(date, time)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

/// Excel serial for an ISO 8601 date or date-time stored as text
fn iso_to_serial(value: &str) -> Option<f64> {
    let datetime = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .ok()?;
    let elapsed = datetime - excel_epoch()?;
    Some(elapsed.num_milliseconds() as f64 / 86_400_000.0)
}

/// Convert column index (0-based) to Excel column letter (A, B, ..., Z, AA, AB, ...)
pub fn column_index_to_letter(index: u32) -> String {
    let mut result = String::new();
    let mut n = index + 1;

    while n > 0 {
        n -= 1;
        let c = (b'A' + (n % 26) as u8) as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// A1-style reference for a 1-based (row, col)
pub fn cell_reference(row: u32, col: u32) -> String {
    format!("{}{}", column_index_to_letter(col.saturating_sub(1)), row)
}

/// Compute SHA-256 checksum of a file
pub fn compute_checksum(path: &Path) -> Result<String, ExcelError> {
    let mut file = File::open(path)
        .map_err(|e| ExcelError::read_error(format!("Failed to open file for checksum: {}", e)))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| ExcelError::read_error(format!("Failed to read file for checksum: {}", e)))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA-256 of an in-memory document
pub fn checksum_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
