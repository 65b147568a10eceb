//! Reading measurement tables
//!
//! Delimited files (`.csv`, `.tsv`, `.txt`) are parsed with the Polars CSV
//! reader, spreadsheets (`.xlsx`, `.xls`, `.xlsm`, `.ods`) with calamine. In
//! both cases only the first sheet/table is used and the first row is the header.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;

use super::error::TableError;
use super::table::{Cell, MeasurementTable};

/// Supported input formats, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Spreadsheet,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") | Some("txt") => Ok(TableFormat::Csv),
            Some("tsv") | Some("tab") => Ok(TableFormat::Tsv),
            Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => Ok(TableFormat::Spreadsheet),
            _ => Err(TableError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Reads a measurement table from a delimited file or spreadsheet.
///
/// # Arguments
///
/// * `path` - Path to the measurement file
///
/// # Returns
///
/// Returns a `Result` containing the `MeasurementTable` or an error if reading fails.
pub fn read_table(path: impl AsRef<Path>) -> Result<MeasurementTable, TableError> {
    let path = path.as_ref();
    match TableFormat::from_path(path)? {
        TableFormat::Csv => read_delimited(path, b','),
        TableFormat::Tsv => read_delimited(path, b'\t'),
        TableFormat::Spreadsheet => read_spreadsheet(path),
    }
}

/// Reads a delimited text file through Polars.
pub fn read_delimited(path: &Path, separator: u8) -> Result<MeasurementTable, TableError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    dataframe_to_table(&df)
}

/// Converts a Polars `DataFrame` into a `MeasurementTable`.
pub fn dataframe_to_table(df: &DataFrame) -> Result<MeasurementTable, TableError> {
    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut rows = vec![Vec::with_capacity(headers.len()); df.height()];
    for series in df.get_columns() {
        for (i, row) in rows.iter_mut().enumerate() {
            row.push(any_value_to_cell(series.get(i)?));
        }
    }

    MeasurementTable::new(headers, rows)
}

fn any_value_to_cell(value: AnyValue) -> Cell {
    match value {
        AnyValue::Null => Cell::Empty,
        AnyValue::String(text) => Cell::parse(text),
        AnyValue::StringOwned(text) => Cell::parse(text.as_str()),
        AnyValue::Boolean(flag) => Cell::Text(flag.to_string()),
        other => match other.extract::<f64>() {
            Some(number) if number.is_finite() => Cell::Number(number),
            Some(_) => Cell::Empty,
            None => Cell::Text(other.to_string()),
        },
    }
}

/// Reads the first worksheet of a spreadsheet through calamine.
pub fn read_spreadsheet(path: &Path) -> Result<MeasurementTable, TableError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TableError::NoSheets(path.to_path_buf()))?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(TableError::NoHeaders)?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let rows = rows
        .map(|row| row.iter().map(data_to_cell).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    MeasurementTable::new(headers, rows)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(text) => Cell::parse(text),
        Data::Float(value) => Cell::Number(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Bool(flag) => Cell::Text(flag.to_string()),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            TableFormat::from_path(Path::new("data.CSV")).unwrap(),
            TableFormat::Csv
        );
        assert_eq!(
            TableFormat::from_path(Path::new("data.xlsx")).unwrap(),
            TableFormat::Spreadsheet
        );
        assert!(TableFormat::from_path(Path::new("data.json")).is_err());
    }

    #[test]
    fn test_read_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Metabolite,Time,Sample1").unwrap();
        writeln!(file, "glucose,0,1.5").unwrap();
        writeln!(file, "lactate,0,").unwrap();

        let table = read_table(file.path()).unwrap();
        assert_eq!(table.headers, vec!["Metabolite", "Time", "Sample1"]);
        assert_eq!(table.height(), 2);
        assert_eq!(table.rows[0][0], Cell::Text("glucose".to_string()));
        assert_eq!(table.rows[0][2], Cell::Number(1.5));
        assert_eq!(table.rows[1][2], Cell::Empty);
    }

    #[test]
    fn test_read_tsv() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "Name\tValue").unwrap();
        writeln!(file, "citrate\t2").unwrap();

        let table = read_table(file.path()).unwrap();
        assert_eq!(table.headers, vec!["Name", "Value"]);
        assert_eq!(table.rows[0][1], Cell::Number(2.0));
    }
}
