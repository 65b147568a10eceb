//! Spreadsheet Writing Module
//!
//! Writes the merged, analysis-ready dataset to an Excel workbook. Numeric
//! cells are stored as numbers so downstream tools can use them directly;
//! blank cells stay blank.

use std::path::Path;

use rust_xlsxwriter::workbook::Workbook;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Worksheet};

use super::error::TableError;
use super::table::{Cell, MeasurementTable};

/// Default column width
const DEFAULT_COLUMN_WIDTH: f64 = 20.0;

/// Border color for cells
const BORDER_COLOR: u32 = 0xB0B0B0;

/// Header background color
const HEADER_BG_COLOR: u32 = 0xD9EAD3;

/// Maximum worksheet name length accepted by Excel
const MAX_SHEET_NAME: usize = 31;

/// Writes a table to a single-sheet Excel workbook.
///
/// # Arguments
///
/// * `table` - The table to write
/// * `path` - Destination `.xlsx` path
/// * `sheet_name` - Name of the worksheet
pub fn write_xlsx(
    table: &MeasurementTable,
    path: impl AsRef<Path>,
    sheet_name: &str,
) -> Result<(), TableError> {
    let mut workbook = Workbook::new();
    add_table_sheet(table, &mut workbook, sheet_name)?;
    workbook.save(path.as_ref())?;
    Ok(())
}

/// Adds a table as a worksheet to the workbook
fn add_table_sheet(
    table: &MeasurementTable,
    workbook: &mut Workbook,
    sheet_name: &str,
) -> Result<(), TableError> {
    let sheet = workbook.add_worksheet();
    let name: String = sheet_name.chars().take(MAX_SHEET_NAME).collect();
    sheet.set_name(&name)?;

    let header_format = get_header_format();
    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    let data_format = get_non_header_format();
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_pos = row_idx as u32 + 1;
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(sheet, row_pos, col_idx as u16, cell, &data_format)?;
        }
    }

    for col in 0..table.width() {
        sheet.set_column_width(col as u16, DEFAULT_COLUMN_WIDTH)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    Ok(())
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: &Format,
) -> Result<(), TableError> {
    match cell {
        Cell::Empty => sheet.write_blank(row, col, format)?,
        Cell::Number(value) => sheet.write_number_with_format(row, col, *value, format)?,
        Cell::Text(text) => sheet.write_string_with_format(row, col, text, format)?,
    };
    Ok(())
}

/// Returns a format for non-header cells
fn get_non_header_format() -> Format {
    Format::new()
        .set_align(FormatAlign::VerticalCenter)
        .set_align(FormatAlign::Center)
        .set_border_left(FormatBorder::Thin)
        .set_border_left_color(BORDER_COLOR)
        .set_border_right(FormatBorder::Thin)
        .set_border_right_color(BORDER_COLOR)
        .set_border_top(FormatBorder::Thin)
        .set_border_top_color(BORDER_COLOR)
        .set_border_bottom(FormatBorder::Thin)
        .set_border_bottom_color(BORDER_COLOR)
}

/// Returns a format for header cells
fn get_header_format() -> Format {
    Format::new()
        .set_background_color(HEADER_BG_COLOR)
        .set_bold()
        .set_border_left(FormatBorder::Thin)
        .set_border_left_color(BORDER_COLOR)
        .set_border_right(FormatBorder::Thin)
        .set_border_right_color(BORDER_COLOR)
        .set_border_top(FormatBorder::Thin)
        .set_border_top_color(BORDER_COLOR)
        .set_border_bottom(FormatBorder::Double)
        .set_border_bottom_color(BORDER_COLOR)
        .set_align(FormatAlign::VerticalCenter)
        .set_align(FormatAlign::Center)
}
