//! End-to-end mapping pipeline
//!
//! A run reads a measurement table and a metabolic model and writes a
//! workbook with the model index of every measured metabolite per
//! compartment. The stages run in order:
//!
//! 1. Build the query plan from the measured names
//! 2. Optionally expand it with PubChem synonyms
//! 3. Resolve identifiers with MetaboAnalyst (or read them from a checkpoint)
//! 4. Read the model map from the SBML file
//! 5. Match identifiers and model species
//! 6. Locate and pivot model positions
//! 7. Merge positions and measurements and write the workbook
//!
//! Per-item failures are skipped and collected in a [`Report`]; a stage that
//! cannot run at all aborts with a [`PipelineError`].

use std::path::{Path, PathBuf};

use itertools::Itertools;
use polars::prelude::{DataFrame, PolarsError, PolarsResult};
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::dataset::{construct_final_dataset, default_output_path};
use crate::identifiers::IdentifierRecord;
use crate::io::{checkpoint_path, IOError};
use crate::matching::{match_model_and_data, MatchRecord};
use crate::names::QueryPlan;
use crate::positions::{locate_positions, map_positions_to_queries, pivot};
use crate::report::{Report, Stage};
use crate::sbml::{error::ModelError, reader::read_model, species::MetabolicModel};
use crate::services::{
    error::ServiceError,
    metaboanalyst::MetaboAnalystClient,
    pubchem::{PubChemClient, SynonymRecord},
};
use crate::tabular::{
    dataframe::{identifiers_from_csv, write_csv, ToDataFrame},
    error::TableError,
    reader::read_table,
    table::MeasurementTable,
    writer::write_xlsx,
};

/// Checkpoint file names.
pub const SYNONYMS_CHECKPOINT: &str = "synonyms.csv";
pub const IDENTIFIERS_CHECKPOINT: &str = "identifiers.csv";
pub const MODEL_CHECKPOINT: &str = "model.csv";
pub const MATCHES_CHECKPOINT: &str = "matches.csv";
pub const POSITIONS_CHECKPOINT: &str = "positions.csv";

/// Worksheet name of the final workbook.
const DATASET_SHEET: &str = "Mapped";

/// Errors that abort a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    TableError(#[from] TableError),
    #[error(transparent)]
    ModelError(#[from] ModelError),
    #[error(transparent)]
    ServiceError(#[from] ServiceError),
    #[error(transparent)]
    IOError(#[from] IOError),
    #[error("Failed to build checkpoint table: {0}")]
    PolarsError(#[from] PolarsError),
    /// The measurement table does not contain a single metabolite name
    #[error("No metabolite names found in {0}")]
    NoNames(PathBuf),
}

/// Counts and skipped items of a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineSummary {
    /// Distinct measured names.
    pub measured: usize,
    /// Query terms sent to the identifier service.
    pub queries: usize,
    /// Identifier records with at least one identifier.
    pub identified: usize,
    /// Species in the model.
    pub species: usize,
    /// Match rows between identifiers and species.
    pub matches: usize,
    /// Queries with a model position.
    pub positioned: usize,
    /// Rows written to the final dataset.
    pub rows: usize,
    /// Compartment columns of the final dataset.
    pub compartments: Vec<String>,
    pub output: PathBuf,
    pub report: Report,
}

/// Runs the mapping stages with a fixed configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    identifiers: Option<PathBuf>,
}

#[bon::bon]
impl Pipeline {
    /// Creates a pipeline.
    ///
    /// # Arguments
    ///
    /// * `config` - Settings of the run
    /// * `identifiers` - Identifier checkpoint to use instead of querying the web services
    #[builder]
    pub fn new(config: PipelineConfig, identifiers: Option<PathBuf>) -> Self {
        Self {
            config,
            identifiers,
        }
    }
}

impl Pipeline {
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs all stages and writes the final workbook.
    ///
    /// # Arguments
    ///
    /// * `data` - Measurement file (CSV, TSV or spreadsheet)
    /// * `model` - SBML model file
    /// * `output` - Workbook path; defaults to [`default_output_path`] of `data`
    ///
    /// # Returns
    ///
    /// A [`PipelineSummary`] with counts per stage and all skipped items.
    pub fn run(
        &self,
        data: impl AsRef<Path>,
        model: impl AsRef<Path>,
        output: Option<PathBuf>,
    ) -> Result<PipelineSummary, PipelineError> {
        let data = data.as_ref();
        let mut report = Report::new();

        let (table, mut plan) = self.query_plan(data)?;

        let identifiers = match &self.identifiers {
            Some(path) => {
                log::info!("Reading identifiers from {}", path.display());
                identifiers_from_csv(path)?
            }
            None => {
                if self.config.expand_synonyms {
                    let synonyms = self.expand_synonyms(&mut plan, &mut report)?;
                    self.checkpoint(SYNONYMS_CHECKPOINT, || synonyms.to_dataframe())?;
                }
                self.identify(&plan)?
            }
        };
        record_unresolved(&identifiers, &mut report);
        self.checkpoint(IDENTIFIERS_CHECKPOINT, || identifiers.to_dataframe())?;

        let model = read_model(model, &mut report)?;
        self.checkpoint(MODEL_CHECKPOINT, || model.to_dataframe())?;

        let matches = match_model_and_data(&identifiers, &model, &self.config.match_keys);
        record_unmatched(&plan, &matches, &mut report);
        self.checkpoint(MATCHES_CHECKPOINT, || matches.to_dataframe())?;

        log::info!("Locating matched metabolites in the model");
        let located = locate_positions(&matches, &model);
        let table_of_positions = pivot(&located);
        self.checkpoint(POSITIONS_CHECKPOINT, || table_of_positions.to_dataframe())?;
        let positions = map_positions_to_queries(&table_of_positions, &matches, &mut report);

        let dataset =
            construct_final_dataset(&positions, &table, &plan, &self.config, &mut report)?;
        let output = output.unwrap_or_else(|| default_output_path(data));
        write_xlsx(&dataset, &output, DATASET_SHEET)?;
        log::info!("Wrote final dataset to {}", output.display());

        Ok(PipelineSummary {
            measured: plan.names().len(),
            queries: plan.len(),
            identified: identifiers.iter().filter(|r| !r.is_unresolved()).count(),
            species: model.len(),
            matches: matches.len(),
            positioned: positions.len(),
            rows: dataset.height(),
            compartments: positions.compartments.clone(),
            output,
            report,
        })
    }

    /// Reads the measurement table and builds its query plan.
    pub fn query_plan(
        &self,
        data: impl AsRef<Path>,
    ) -> Result<(MeasurementTable, QueryPlan), PipelineError> {
        let data = data.as_ref();
        log::info!("Reading measurements from {}", data.display());

        let table = read_table(data)?;
        let column = table.name_column(self.config.name_column.as_deref())?;
        let plan = QueryPlan::from_table(&table, column, &self.config);

        if plan.is_empty() {
            return Err(PipelineError::NoNames(data.to_path_buf()));
        }

        log::info!(
            "Found {} measured names ({} query terms) in column '{}'",
            plan.names().len(),
            plan.len(),
            table.headers[column]
        );
        Ok((table, plan))
    }

    /// Looks up PubChem synonyms for every query term and adds them to the plan.
    pub fn expand_synonyms(
        &self,
        plan: &mut QueryPlan,
        report: &mut Report,
    ) -> Result<Vec<SynonymRecord>, PipelineError> {
        log::info!("Expanding {} query terms with PubChem synonyms", plan.len());

        let client = PubChemClient::builder()
            .base_url(&self.config.pubchem_url)
            .timeout(self.config.timeout())
            .build()?;

        let terms = plan.terms().to_vec();
        let records = client.lookup_all(&terms, report);

        let added: usize = records
            .iter()
            .map(|record| plan.add_synonyms(&record.name, &record.synonyms))
            .sum();

        log::info!("Added {added} synonym query terms");
        Ok(records)
    }

    /// Resolves the plan's query terms to database identifiers.
    pub fn identify(&self, plan: &QueryPlan) -> Result<Vec<IdentifierRecord>, PipelineError> {
        log::info!("Querying MetaboAnalyst for {} terms", plan.len());

        let client = MetaboAnalystClient::builder()
            .url(&self.config.mapcompounds_url)
            .timeout(self.config.timeout())
            .build()?;

        Ok(client.map_compounds(plan.terms())?)
    }

    /// Reads the model map.
    pub fn model(
        &self,
        model: impl AsRef<Path>,
        report: &mut Report,
    ) -> Result<MetabolicModel, PipelineError> {
        Ok(read_model(model, report)?)
    }

    /// Writes a checkpoint CSV when a checkpoint directory is configured.
    fn checkpoint<F>(&self, file_name: &str, frame: F) -> Result<(), PipelineError>
    where
        F: FnOnce() -> PolarsResult<DataFrame>,
    {
        let Some(dir) = &self.config.checkpoint_dir else {
            return Ok(());
        };

        let path = checkpoint_path(dir, file_name)?;
        let mut df = frame()?;
        write_csv(&mut df, &path)?;
        log::debug!("Wrote checkpoint {}", path.display());
        Ok(())
    }
}

/// Records measured terms the identifier service could not resolve.
fn record_unresolved(identifiers: &[IdentifierRecord], report: &mut Report) {
    for record in identifiers.iter().filter(|r| r.is_unresolved()) {
        report.info(Stage::Identifiers, &record.query, "no identifiers found");
    }
}

/// Records measured names without a single matching model species.
fn record_unmatched(plan: &QueryPlan, matches: &[MatchRecord], report: &mut Report) {
    let matched = matches
        .iter()
        .flat_map(|m| plan.resolve(&m.query))
        .unique()
        .collect::<Vec<_>>();

    for name in plan.names() {
        if !matched.contains(name) {
            report.info(Stage::Matching, name, "no matching model species");
        }
    }
}
