use std::path::Path;

use datasheet_recon::datasheet::SkipReason;
use datasheet_recon::excel::{compute_checksum, load_workbook, CellValue};
use datasheet_recon::{populate_bytes, populate_files, LayoutConfig, Mapping, ReconcileOptions};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use umya_spreadsheet::Worksheet;

fn set_text(sheet: &mut Worksheet, col: u32, row: u32, text: &str) {
    sheet.get_cell_mut((col, row)).set_value_string(text);
}

fn set_number(sheet: &mut Worksheet, col: u32, row: u32, value: f64) {
    sheet.get_cell_mut((col, row)).set_value_number(value);
}

fn write_master(path: &Path) {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    for name in ["Pump-101", "Tank-9"] {
        let sheet = book.new_sheet(name).unwrap();
        set_text(sheet, 1, 1, &format!("{} Datasheet", name));
        set_text(sheet, 4, 3, "Train-A");
        set_text(sheet, 5, 3, "Train-B");
        set_text(sheet, 1, 8, "SysCAD Inputs");
        set_text(sheet, 2, 10, "Flow Rate");
        set_text(sheet, 3, 10, "kg/h");
        set_text(sheet, 2, 11, "Pressure");
        set_text(sheet, 3, 11, "kPa");
        set_text(sheet, 2, 12, "Commissioned");
        set_text(sheet, 1, 14, "Engineering Inputs");
        set_text(sheet, 2, 15, "Design Pressure");
        set_number(sheet, 4, 15, 1500.0);
    }
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

fn write_stream(path: &Path) {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book.new_sheet("Pump-101").unwrap();
    set_text(sheet, 4, 1, "Train-B");
    set_text(sheet, 5, 1, "Train-A");
    set_text(sheet, 2, 3, "m3/h");
    set_text(sheet, 3, 3, "FT-101");
    set_number(sheet, 4, 3, 9.876);
    set_number(sheet, 5, 3, 12.345);
    set_text(sheet, 2, 4, "kPa");
    set_text(sheet, 3, 4, "PT-101");
    set_number(sheet, 5, 4, 250.0);
    set_text(sheet, 3, 5, "DT-101");
    set_number(sheet, 5, 5, 45292.5);
    sheet
        .get_style_mut((5u32, 5u32))
        .get_number_format_mut()
        .set_format_code("yyyy-mm-dd hh:mm:ss");
    sheet.get_cell_mut((4u32, 5u32)).set_error();

    let other = book.new_sheet("Compressor-1").unwrap();
    set_text(other, 3, 3, "FT-500");
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

fn mapping() -> Mapping {
    Mapping::from_json_str(
        r#"{
            "Pump-101": { "Flow Rate": "FT-101", "Pressure": "PT-101", "Design Pressure": "FT-101" },
            "Tank-9": { "Flow Rate": "FT-101" }
        }"#,
    )
    .unwrap()
}

#[test]
fn populates_master_file_and_keeps_other_content() {
    let dir = TempDir::new().unwrap();
    let master = dir.path().join("master.xlsx");
    let stream = dir.path().join("stream.xlsx");
    let output = dir.path().join("out.xlsx");
    write_master(&master);
    write_stream(&stream);

    let summary = populate_files(
        &master,
        &stream,
        &mapping(),
        &output,
        &LayoutConfig::default(),
        ReconcileOptions::default(),
    )
    .unwrap();

    assert_eq!(summary.report.missing, vec!["Tank-9"]);
    assert_eq!(summary.checksum.len(), 64);

    let book = load_workbook(&output).unwrap();
    let pump = book.sheet("Pump-101").unwrap();
    assert_eq!(pump.get(10, 4), &CellValue::Float(12.35));
    assert_eq!(pump.get(10, 5), &CellValue::Float(9.88));
    assert_eq!(pump.text(10, 3).as_deref(), Some("m3/h"));
    assert_eq!(pump.get(11, 4), &CellValue::Float(250.0));
    assert_eq!(pump.get(11, 5), &CellValue::Empty);
    assert_eq!(pump.text(11, 3).as_deref(), Some("kPa"));

    // outside the SysCAD block
    assert_eq!(pump.get(15, 4), &CellValue::Float(1500.0));
    assert_eq!(pump.text(1, 1).as_deref(), Some("Pump-101 Datasheet"));

    let original = load_workbook(&master).unwrap();
    assert_eq!(book.sheet("Tank-9"), original.sheet("Tank-9"));
    assert!(!book.contains("Compressor-1"));
}

#[test]
fn unreadable_input_fails_before_writing() {
    let dir = TempDir::new().unwrap();
    let master = dir.path().join("master.xlsx");
    let stream = dir.path().join("stream.xlsx");
    let output = dir.path().join("out.xlsx");
    write_master(&master);
    std::fs::write(&stream, b"not a workbook").unwrap();

    let result = populate_files(
        &master,
        &stream,
        &mapping(),
        &output,
        &LayoutConfig::default(),
        ReconcileOptions::default(),
    );
    assert!(result.is_err());
    assert!(!output.exists());
}

#[test]
fn bytes_pass_matches_file_pass() {
    let dir = TempDir::new().unwrap();
    let master = dir.path().join("master.xlsx");
    let stream = dir.path().join("stream.xlsx");
    write_master(&master);
    write_stream(&stream);

    let master_bytes = std::fs::read(&master).unwrap();
    let stream_bytes = std::fs::read(&stream).unwrap();
    let document = populate_bytes(
        &master_bytes,
        &stream_bytes,
        &mapping(),
        &LayoutConfig::default(),
        ReconcileOptions::default(),
    )
    .unwrap();

    assert_eq!(document.report.missing, vec!["Tank-9"]);
    assert_eq!(document.report.sheet("Pump-101").unwrap().values_written, 3);

    let out = dir.path().join("from-bytes.xlsx");
    std::fs::write(&out, &document.bytes).unwrap();
    assert_eq!(compute_checksum(&out).unwrap(), document.checksum);
    let book = load_workbook(&out).unwrap();
    assert_eq!(
        book.sheet("Pump-101").unwrap().get(10, 4),
        &CellValue::Float(12.35)
    );
}

#[test]
fn unmapped_common_sheet_is_reported() {
    let dir = TempDir::new().unwrap();
    let master = dir.path().join("master.xlsx");
    let stream = dir.path().join("stream.xlsx");
    let output = dir.path().join("out.xlsx");
    write_master(&master);
    write_stream(&stream);

    let mut mapping = Mapping::new();
    mapping.insert("Tank-9", "Flow Rate", "FT-101");

    let summary = populate_files(
        &master,
        &stream,
        &mapping,
        &output,
        &LayoutConfig::default(),
        ReconcileOptions::default(),
    )
    .unwrap();

    assert_eq!(summary.report.skipped.len(), 1);
    assert_eq!(summary.report.skipped[0].equipment, "Pump-101");
    assert_eq!(summary.report.skipped[0].reason, SkipReason::Unmapped);
    assert_eq!(summary.report.values_written(), 0);
}

#[test]
fn dates_and_error_cells_carried_into_master() {
    let dir = TempDir::new().unwrap();
    let master = dir.path().join("master.xlsx");
    let stream = dir.path().join("stream.xlsx");
    let output = dir.path().join("out.xlsx");
    write_master(&master);
    write_stream(&stream);

    let mut mapping = Mapping::new();
    mapping.insert("Pump-101", "Commissioned", "DT-101");

    let summary = populate_files(
        &master,
        &stream,
        &mapping,
        &output,
        &LayoutConfig::default(),
        ReconcileOptions::default(),
    )
    .unwrap();
    assert_eq!(summary.report.values_written(), 2);

    let book = load_workbook(&output).unwrap();
    let pump = book.sheet("Pump-101").unwrap();
    assert_eq!(
        pump.get(12, 4),
        &CellValue::DateTime {
            serial: 45292.5,
            iso: "2024-01-01T12:00:00".into(),
        }
    );
    assert_eq!(pump.get(12, 5), &CellValue::String("#VALUE!".into()));
    assert_eq!(pump.get(12, 3), &CellValue::Empty);
}
