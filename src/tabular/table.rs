//! In-memory measurement table
//!
//! Measurement files mix a text name column with numeric intensity columns
//! and frequently contain blanks. Cells are kept loosely typed so that the
//! final dataset can be written back without losing either kind of value.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use variantly::Variantly;

use super::error::TableError;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Variantly)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Builds a cell from raw text, parsing numbers where possible.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number(value),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    /// Text form used when the cell is a metabolite name.
    pub fn as_name(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(_) => Some(self.to_string()),
            Cell::Text(text) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

/// Header plus rows, as read from a measurement file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl MeasurementTable {
    /// Creates a table, padding or truncating rows to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, TableError> {
        if headers.is_empty() {
            return Err(TableError::NoHeaders);
        }

        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        Ok(Self { headers, rows })
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Index of a column by header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of the metabolite name column: `name` if given, otherwise the first column.
    pub fn name_column(&self, name: Option<&str>) -> Result<usize, TableError> {
        match name {
            Some(name) => self
                .column_index(name)
                .ok_or_else(|| TableError::MissingColumn(name.to_string())),
            None => Ok(0),
        }
    }

    /// Metabolite names of all rows, `None` where the name cell is blank.
    pub fn names(&self, column: usize) -> Vec<Option<String>> {
        self.rows
            .iter()
            .map(|row| row.get(column).and_then(Cell::as_name))
            .collect()
    }
}
