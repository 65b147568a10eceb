//! Information display module for pipeline results
//!
//! Renders run summaries and intermediate tables in a human-readable format
//! for the command line. Tables are built with `tabled`.

use std::fmt::{self, Display};

use itertools::Itertools;
use tabled::{builder::Builder, settings::Style};

use crate::identifiers::IdentifierRecord;
use crate::matching::MatchRecord;
use crate::pipeline::PipelineSummary;
use crate::sbml::species::{MetabolicModel, ModelSpecies};
use crate::services::pubchem::SynonymRecord;

/// Rows of a result table
///
/// Implementors provide the column headers and the cell values of one row.
pub trait TableRecord {
    fn columns() -> Vec<String>;

    fn to_record(&self) -> Vec<String>;
}

impl Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(vec!["Stage", "Count"]);
        builder.push_record(vec!["Measured names".to_string(), self.measured.to_string()]);
        builder.push_record(vec!["Query terms".to_string(), self.queries.to_string()]);
        builder.push_record(vec!["Identified terms".to_string(), self.identified.to_string()]);
        builder.push_record(vec!["Model species".to_string(), self.species.to_string()]);
        builder.push_record(vec!["Matches".to_string(), self.matches.to_string()]);
        builder.push_record(vec!["Positioned queries".to_string(), self.positioned.to_string()]);
        builder.push_record(vec!["Dataset rows".to_string(), self.rows.to_string()]);
        builder.push_record(vec![
            "Compartments".to_string(),
            self.compartments.iter().join(", "),
        ]);
        builder.push_record(vec![
            "Skipped items".to_string(),
            format!("{} ({} warnings)", self.report.len(), self.report.warnings()),
        ]);
        builder.push_record(vec!["Output".to_string(), self.output.display().to_string()]);

        let mut table = builder.build();
        table.with(Style::sharp());
        write!(f, "{table}")
    }
}

impl Display for MetabolicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_table(&self.species))
    }
}

/// Formats records as a rounded table.
pub fn to_table<T: TableRecord>(records: &[T]) -> String {
    let mut builder = Builder::default();
    builder.push_record(T::columns());

    for record in records {
        builder.push_record(record.to_record());
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn optional(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

impl TableRecord for IdentifierRecord {
    fn columns() -> Vec<String> {
        vec![
            "Query".to_string(),
            "Hit".to_string(),
            "ChEBI".to_string(),
            "KEGG".to_string(),
            "HMDB".to_string(),
            "PubChem".to_string(),
        ]
    }

    fn to_record(&self) -> Vec<String> {
        vec![
            self.query.clone(),
            optional(&self.hit),
            optional(&self.chebi),
            optional(&self.kegg),
            optional(&self.hmdb),
            optional(&self.pubchem),
        ]
    }
}

impl TableRecord for SynonymRecord {
    fn columns() -> Vec<String> {
        vec![
            "Name".to_string(),
            "CID".to_string(),
            "Synonyms".to_string(),
        ]
    }

    fn to_record(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.cid.map(|cid| cid.to_string()).unwrap_or_else(|| "-".to_string()),
            self.synonyms.len().to_string(),
        ]
    }
}

impl TableRecord for ModelSpecies {
    fn columns() -> Vec<String> {
        vec![
            "Index".to_string(),
            "BIGG".to_string(),
            "Name".to_string(),
            "Compartment".to_string(),
            "ChEBI".to_string(),
            "KEGG".to_string(),
            "HMDB".to_string(),
        ]
    }

    fn to_record(&self) -> Vec<String> {
        vec![
            self.index.to_string(),
            self.bigg.clone(),
            self.display_name().to_string(),
            optional(&self.compartment),
            self.chebi.join(", "),
            self.kegg.join(", "),
            self.hmdb.join(", "),
        ]
    }
}

impl TableRecord for MatchRecord {
    fn columns() -> Vec<String> {
        vec![
            "Metabolite".to_string(),
            "Query".to_string(),
            "BIGG".to_string(),
            "ChEBI".to_string(),
            "KEGG".to_string(),
            "HMDB".to_string(),
        ]
    }

    fn to_record(&self) -> Vec<String> {
        vec![
            self.metabolite.clone(),
            self.query.clone(),
            self.bigg.clone(),
            optional(&self.chebi),
            optional(&self.kegg),
            optional(&self.hmdb),
        ]
    }
}
