//! Final merge of model positions and measurements
//!
//! The dataset written at the end of a run has one row per measurement row
//! that could be placed in the model. Its columns are the measured name,
//! the model index per compartment and the remaining measurement columns.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::names::QueryPlan;
use crate::positions::QueryPositions;
use crate::report::{Report, Stage};
use crate::tabular::{
    error::TableError,
    table::{Cell, MeasurementTable},
};

/// Header of the metabolite name column in the final dataset.
pub const METABOLITE_COLUMN: &str = "Metabolite";

/// Suffix appended to the output name when the input already is a workbook.
const MAPPED_SUFFIX: &str = "_mapped";

/// Builds the final dataset.
///
/// # Arguments
///
/// * `positions` - Compartment positions keyed by query term
/// * `table` - The measurement table
/// * `plan` - Resolves query terms back to measured names
/// * `config` - Provides the name column and the columns to drop
/// * `report` - Receives measured names without a model position
///
/// # Returns
///
/// A table with `Metabolite`, one column per compartment and the kept
/// measurement columns. Rows follow the order of `positions`; a measurement
/// row is emitted at most once.
pub fn construct_final_dataset(
    positions: &QueryPositions,
    table: &MeasurementTable,
    plan: &QueryPlan,
    config: &PipelineConfig,
    report: &mut Report,
) -> Result<MeasurementTable, TableError> {
    log::info!("Constructing final dataset");

    let name_column = table.name_column(config.name_column.as_deref())?;
    let names = table.names(name_column);

    let kept: Vec<usize> = (0..table.width())
        .filter(|&column| column != name_column)
        .filter(|&column| !config.drop_columns.contains(&table.headers[column]))
        .collect();

    let mut headers = vec![METABOLITE_COLUMN.to_string()];
    headers.extend(positions.compartments.iter().cloned());
    headers.extend(kept.iter().map(|&column| table.headers[column].clone()));

    let mut used = HashSet::new();
    let mut rows = Vec::new();

    for position in &positions.rows {
        let origins = plan.resolve(&position.query);
        let mut found = false;

        for (row_index, name) in names.iter().enumerate() {
            let Some(name) = name else { continue };
            if !origins.contains(name) {
                continue;
            }
            found = true;
            if !used.insert(row_index) {
                continue;
            }

            let mut row = vec![Cell::Text(name.clone())];
            row.extend(position.values.iter().map(|value| Cell::from(*value)));
            row.extend(kept.iter().map(|&column| table.rows[row_index][column].clone()));
            rows.push(row);
        }

        if !found {
            report.warn(
                Stage::Dataset,
                &position.query,
                "matched query has no row in the measurement table",
            );
        }
    }

    for (row_index, name) in names.iter().enumerate() {
        if let Some(name) = name {
            if !used.contains(&row_index) {
                report.info(Stage::Dataset, name, "no position in the model");
            }
        }
    }

    log::info!(
        "Final dataset has {} of {} measurement rows",
        rows.len(),
        table.height()
    );

    MeasurementTable::new(headers, rows)
}

/// Path of the final workbook for a measurement file.
///
/// The workbook is placed beside the input as `<stem>.xlsx`; if the input
/// itself is an `.xlsx` file, `<stem>_mapped.xlsx` is used so it is not
/// overwritten.
pub fn default_output_path(input: impl AsRef<Path>) -> PathBuf {
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());

    let is_workbook = input
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);

    let file_name = if is_workbook {
        format!("{stem}{MAPPED_SUFFIX}.xlsx")
    } else {
        format!("{stem}.xlsx")
    };

    input.with_file_name(file_name)
}
