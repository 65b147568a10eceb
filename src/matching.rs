//! Joining measured identifiers with model species
//!
//! For every match key (ChEBI and KEGG by default) model species and
//! identifier records are joined on equal normalized values. The per-key
//! results are then combined on (model name, query, BIGG id), so a pair that
//! matches through several databases yields a single row listing each value.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::identifiers::{IdentifierRecord, MatchKey};
use crate::sbml::species::MetabolicModel;

/// A model species paired with a measured name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Display name of the model species.
    pub metabolite: String,
    /// The query term the identifier record was resolved for.
    pub query: String,
    /// BIGG id of the model species.
    pub bigg: String,
    /// Metabolite key of the model species, e.g. `glc__D`.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chebi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kegg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmdb: Option<String>,
}

impl MatchRecord {
    fn set(&mut self, key: MatchKey, value: &str) {
        let slot = match key {
            MatchKey::Chebi => &mut self.chebi,
            MatchKey::Kegg => &mut self.kegg,
            MatchKey::Hmdb => &mut self.hmdb,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    pub fn get(&self, key: MatchKey) -> Option<&str> {
        match key {
            MatchKey::Chebi => self.chebi.as_deref(),
            MatchKey::Kegg => self.kegg.as_deref(),
            MatchKey::Hmdb => self.hmdb.as_deref(),
        }
    }
}

/// Matches identifier records against model species.
///
/// # Arguments
///
/// * `identifiers` - Records returned by the compound-mapping service
/// * `model` - The parsed metabolic model
/// * `keys` - Databases to join on, in order of preference
///
/// # Returns
///
/// Match rows in first-seen order (model order within each key), without duplicates.
pub fn match_model_and_data(
    identifiers: &[IdentifierRecord],
    model: &MetabolicModel,
    keys: &[MatchKey],
) -> Vec<MatchRecord> {
    log::info!(
        "Matching metabolomics identifiers and model identifiers by {}",
        keys.iter().join(", ")
    );

    let mut rows: Vec<MatchRecord> = Vec::new();
    let mut positions: HashMap<(String, String, String), usize> = HashMap::new();

    for &key in keys {
        let index = index_by(identifiers, key);

        for species in &model.species {
            for value in species.ids(key) {
                let Some(records) = index.get(value.as_str()) else {
                    continue;
                };

                for record in records {
                    let row_key = (
                        species.display_name().to_string(),
                        record.query.clone(),
                        species.bigg.clone(),
                    );

                    let position = *positions.entry(row_key).or_insert_with(|| {
                        rows.push(MatchRecord {
                            metabolite: species.display_name().to_string(),
                            query: record.query.clone(),
                            bigg: species.bigg.clone(),
                            key: species.key.clone(),
                            ..Default::default()
                        });
                        rows.len() - 1
                    });

                    rows[position].set(key, value);
                }
            }
        }
    }

    log::info!("Found {} matching metabolite pairs", rows.len());
    rows
}

/// Groups identifier records by their value for `key`.
fn index_by(
    identifiers: &[IdentifierRecord],
    key: MatchKey,
) -> HashMap<&str, Vec<&IdentifierRecord>> {
    let mut index: HashMap<&str, Vec<&IdentifierRecord>> = HashMap::new();
    for record in identifiers {
        if let Some(value) = record.get(key) {
            let entry = index.entry(value).or_default();
            if !entry.iter().any(|r| r.query == record.query) {
                entry.push(record);
            }
        }
    }
    index
}
