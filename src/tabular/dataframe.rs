//! Checkpoint tables
//!
//! Every intermediate result of the pipeline can be turned into a Polars
//! `DataFrame` and written as CSV. The identifier map can also be read back,
//! which lets a run skip the network stages.
//!
//! # Checkpoint files
//!
//! | Stage       | Columns                                                              |
//! |-------------|----------------------------------------------------------------------|
//! | identifiers | `query`, `hit`, `hmdb_id`, `kegg_id`, `pubchem_id`, `chebi_id`, `metlin_id` |
//! | synonyms    | `name`, `cid`, `synonym`                                             |
//! | model       | `index`, `id`, `bigg`, `name`, `compartment`, `key`, `chebi`, `hmdb`, `kegg` |
//! | matches     | `metabolite`, `query`, `bigg`, `key`, `chebi`, `kegg`, `hmdb`        |
//! | positions   | `key`, one column per compartment                                    |

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::identifiers::{
    normalize_chebi, normalize_hmdb, normalize_kegg, normalize_numeric, IdentifierRecord,
};
use crate::matching::MatchRecord;
use crate::positions::PositionTable;
use crate::sbml::species::MetabolicModel;
use crate::services::pubchem::SynonymRecord;

use super::error::TableError;
use super::reader::read_delimited;

/// Separator used to join several identifiers of one species in a cell.
const MULTI_VALUE_SEPARATOR: &str = ";";

/// Conversion of pipeline results into a Polars `DataFrame`.
pub trait ToDataFrame {
    fn to_dataframe(&self) -> PolarsResult<DataFrame>;
}

impl ToDataFrame for [IdentifierRecord] {
    fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let column = |f: fn(&IdentifierRecord) -> Option<String>| -> Vec<Option<String>> {
            self.iter().map(f).collect()
        };

        DataFrame::new(vec![
            Series::new(
                "query",
                self.iter().map(|r| r.query.clone()).collect::<Vec<_>>(),
            ),
            Series::new("hit", column(|r| r.hit.clone())),
            Series::new("hmdb_id", column(|r| r.hmdb.clone())),
            Series::new("kegg_id", column(|r| r.kegg.clone())),
            Series::new("pubchem_id", column(|r| r.pubchem.clone())),
            Series::new("chebi_id", column(|r| r.chebi.clone())),
            Series::new("metlin_id", column(|r| r.metlin.clone())),
        ])
    }
}

impl ToDataFrame for [SynonymRecord] {
    /// One row per (name, synonym) pair.
    fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut names = Vec::new();
        let mut cids: Vec<Option<i64>> = Vec::new();
        let mut synonyms = Vec::new();

        for record in self {
            for synonym in &record.synonyms {
                names.push(record.name.clone());
                cids.push(record.cid.map(|cid| cid as i64));
                synonyms.push(synonym.clone());
            }
        }

        DataFrame::new(vec![
            Series::new("name", names),
            Series::new("cid", cids),
            Series::new("synonym", synonyms),
        ])
    }
}

impl ToDataFrame for MetabolicModel {
    fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let joined = |values: &[String]| -> Option<String> {
            if values.is_empty() {
                None
            } else {
                Some(values.join(MULTI_VALUE_SEPARATOR))
            }
        };

        let species = &self.species;
        DataFrame::new(vec![
            Series::new(
                "index",
                species.iter().map(|s| s.index as i64).collect::<Vec<_>>(),
            ),
            Series::new("id", species.iter().map(|s| s.id.clone()).collect::<Vec<_>>()),
            Series::new(
                "bigg",
                species.iter().map(|s| s.bigg.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "name",
                species.iter().map(|s| s.name.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "compartment",
                species
                    .iter()
                    .map(|s| s.compartment.clone())
                    .collect::<Vec<_>>(),
            ),
            Series::new("key", species.iter().map(|s| s.key.clone()).collect::<Vec<_>>()),
            Series::new(
                "chebi",
                species.iter().map(|s| joined(&s.chebi)).collect::<Vec<_>>(),
            ),
            Series::new(
                "hmdb",
                species.iter().map(|s| joined(&s.hmdb)).collect::<Vec<_>>(),
            ),
            Series::new(
                "kegg",
                species.iter().map(|s| joined(&s.kegg)).collect::<Vec<_>>(),
            ),
        ])
    }
}

impl ToDataFrame for [MatchRecord] {
    fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Series::new(
                "metabolite",
                self.iter().map(|m| m.metabolite.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "query",
                self.iter().map(|m| m.query.clone()).collect::<Vec<_>>(),
            ),
            Series::new("bigg", self.iter().map(|m| m.bigg.clone()).collect::<Vec<_>>()),
            Series::new("key", self.iter().map(|m| m.key.clone()).collect::<Vec<_>>()),
            Series::new("chebi", self.iter().map(|m| m.chebi.clone()).collect::<Vec<_>>()),
            Series::new("kegg", self.iter().map(|m| m.kegg.clone()).collect::<Vec<_>>()),
            Series::new("hmdb", self.iter().map(|m| m.hmdb.clone()).collect::<Vec<_>>()),
        ])
    }
}

impl ToDataFrame for PositionTable {
    fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = vec![Series::new(
            "key",
            self.rows.keys().cloned().collect::<Vec<_>>(),
        )];

        for compartment in &self.compartments {
            let values: Vec<Option<f64>> = self
                .rows
                .values()
                .map(|cells| cells.get(compartment).copied())
                .collect();
            columns.push(Series::new(compartment, values));
        }

        DataFrame::new(columns)
    }
}

/// Writes a `DataFrame` as a comma separated file with header.
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<(), TableError> {
    let mut file = File::create(path.as_ref())?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

/// Reads an identifier map checkpoint written by [`write_csv`].
///
/// Identifier columns are normalized again, so the file may also be edited
/// by hand or come from the MetaboAnalyst web interface export.
pub fn identifiers_from_csv(path: impl AsRef<Path>) -> Result<Vec<IdentifierRecord>, TableError> {
    let table = read_delimited(path.as_ref(), b',')?;

    let query_column = table
        .column_index("query")
        .ok_or_else(|| TableError::MissingColumn("query".to_string()))?;
    let column = |name: &str| table.column_index(name);
    let (hit, hmdb, kegg, pubchem, chebi, metlin) = (
        column("hit"),
        column("hmdb_id"),
        column("kegg_id"),
        column("pubchem_id"),
        column("chebi_id"),
        column("metlin_id"),
    );

    let records = table
        .rows
        .iter()
        .filter_map(|row| {
            let text = |index: Option<usize>| -> Option<String> {
                index
                    .and_then(|i| row.get(i))
                    .and_then(|cell| cell.as_name())
            };

            Some(IdentifierRecord {
                query: text(Some(query_column))?,
                hit: text(hit),
                hmdb: text(hmdb).and_then(|v| normalize_hmdb(&v)),
                kegg: text(kegg).and_then(|v| normalize_kegg(&v)),
                pubchem: text(pubchem).and_then(|v| normalize_numeric(&v)),
                chebi: text(chebi).and_then(|v| normalize_chebi(&v)),
                metlin: text(metlin).and_then(|v| normalize_numeric(&v)),
            })
        })
        .collect();

    Ok(records)
}
