//! Model positions of matched metabolites
//!
//! A matched metabolite usually exists in several compartments of the model
//! (`M_glc__D_c`, `M_glc__D_e`, ...). This module looks up the model index of
//! every such species and arranges them in a table with one row per measured
//! query and one column per compartment.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::matching::MatchRecord;
use crate::report::{Report, Stage};
use crate::sbml::species::MetabolicModel;

/// Column name used for species whose id carries no compartment.
pub const NO_COMPARTMENT: &str = "none";

/// Position of a matched species in the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Metabolite key, e.g. `glc__D`.
    pub key: String,
    pub compartment: String,
    /// 0-based index in the model's species list.
    pub index: usize,
}

/// Finds the model species that appear in the match set.
///
/// Membership is decided on exact BIGG ids. The returned records follow model order.
pub fn locate_positions(matches: &[MatchRecord], model: &MetabolicModel) -> Vec<PositionRecord> {
    let matched: HashSet<&str> = matches.iter().map(|m| m.bigg.as_str()).collect();

    model
        .species
        .iter()
        .filter(|species| matched.contains(species.bigg.as_str()))
        .map(|species| PositionRecord {
            key: species.key.clone(),
            compartment: species
                .compartment
                .clone()
                .unwrap_or_else(|| NO_COMPARTMENT.to_string()),
            index: species.index,
        })
        .collect()
}

/// Positions pivoted to one row per metabolite key and one column per compartment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionTable {
    /// Sorted compartment columns.
    pub compartments: Vec<String>,
    /// Mean model index per key and compartment.
    pub rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl PositionTable {
    /// Value for a key/compartment pair, `None` when the pair does not occur.
    pub fn get(&self, key: &str, compartment: &str) -> Option<f64> {
        self.rows.get(key)?.get(compartment).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pivots position records, averaging indices that share key and compartment.
pub fn pivot(positions: &[PositionRecord]) -> PositionTable {
    let mut sums: BTreeMap<String, BTreeMap<String, (f64, usize)>> = BTreeMap::new();
    let mut compartments = BTreeSet::new();

    for position in positions {
        compartments.insert(position.compartment.clone());
        let cell = sums
            .entry(position.key.clone())
            .or_default()
            .entry(position.compartment.clone())
            .or_insert((0.0, 0));
        cell.0 += position.index as f64;
        cell.1 += 1;
    }

    let rows = sums
        .into_iter()
        .map(|(key, cells)| {
            let means = cells
                .into_iter()
                .map(|(compartment, (sum, count))| (compartment, sum / count as f64))
                .collect();
            (key, means)
        })
        .collect();

    PositionTable {
        compartments: compartments.into_iter().collect(),
        rows,
    }
}

/// Model positions of one measured query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPosition {
    pub query: String,
    pub key: String,
    /// One value per compartment column, empty where the metabolite is absent.
    pub values: Vec<Option<f64>>,
}

/// Position table keyed by query name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPositions {
    pub compartments: Vec<String>,
    pub rows: Vec<QueryPosition>,
}

impl QueryPositions {
    /// Row for the given query, if any.
    pub fn get(&self, query: &str) -> Option<&QueryPosition> {
        self.rows.iter().find(|row| row.query == query)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Joins the pivoted positions with the matches on the metabolite key.
///
/// A query that matched several species keeps the row of its first match;
/// later duplicates of the same query are dropped. A dropped match with a
/// different metabolite key is recorded in `report`, as is a match whose key
/// has no position at all.
pub fn map_positions_to_queries(
    table: &PositionTable,
    matches: &[MatchRecord],
    report: &mut Report,
) -> QueryPositions {
    let mut kept: HashMap<&str, &str> = HashMap::new();
    let mut dropped = HashSet::new();
    let mut rows = Vec::new();

    for record in matches {
        let Some(cells) = table.rows.get(&record.key) else {
            report.warn(
                Stage::Positions,
                &record.query,
                format!("matched species {} has no model position", record.bigg),
            );
            continue;
        };

        if let Some(&first) = kept.get(record.query.as_str()) {
            if first != record.key && dropped.insert((&record.query, &record.key)) {
                report.info(
                    Stage::Positions,
                    &record.query,
                    format!("also matches {}, kept positions of {first}", record.key),
                );
            }
            continue;
        }
        kept.insert(&record.query, &record.key);

        let values = table
            .compartments
            .iter()
            .map(|compartment| cells.get(compartment).copied())
            .collect();

        rows.push(QueryPosition {
            query: record.query.clone(),
            key: record.key.clone(),
            values,
        });
    }

    log::info!(
        "Mapped {} queries onto {} compartments",
        rows.len(),
        table.compartments.len()
    );

    QueryPositions {
        compartments: table.compartments.clone(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::identifiers::{IdentifierRecord, MatchKey};
    use crate::matching::match_model_and_data;
    use crate::sbml::reader::parse_model;
    use crate::sbml::species::{split_species_id, ModelSpecies};

    fn model(ids: &[&str]) -> MetabolicModel {
        let species = ids
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let (key, compartment) = split_species_id(id, None);
                ModelSpecies {
                    index,
                    id: id.to_string(),
                    bigg: id.to_string(),
                    key,
                    compartment,
                    ..Default::default()
                }
            })
            .collect();
        MetabolicModel { id: None, species }
    }

    fn matched(query: &str, bigg: &str) -> MatchRecord {
        MatchRecord {
            metabolite: query.to_string(),
            query: query.to_string(),
            bigg: bigg.to_string(),
            key: split_species_id(bigg, None).0,
            ..Default::default()
        }
    }

    #[test]
    fn test_locate_uses_exact_ids() {
        let model = model(&["M_glc__D_c", "M_glc__D_e", "M_glc__D_cx_c", "M_lac__L_c"]);
        let positions = locate_positions(&[matched("glucose", "M_glc__D_c")], &model);

        assert_eq!(
            positions,
            vec![PositionRecord {
                key: "glc__D".to_string(),
                compartment: "c".to_string(),
                index: 0,
            }]
        );
    }

    #[test]
    fn test_pivot_sorts_compartments_and_averages() {
        let positions = vec![
            PositionRecord {
                key: "glc__D".to_string(),
                compartment: "e".to_string(),
                index: 4,
            },
            PositionRecord {
                key: "glc__D".to_string(),
                compartment: "c".to_string(),
                index: 0,
            },
            PositionRecord {
                key: "glc__D".to_string(),
                compartment: "c".to_string(),
                index: 2,
            },
            PositionRecord {
                key: "lac__L".to_string(),
                compartment: "c".to_string(),
                index: 7,
            },
        ];

        let table = pivot(&positions);
        assert_eq!(table.compartments, vec!["c", "e"]);
        assert_eq!(table.get("glc__D", "c"), Some(1.0));
        assert_eq!(table.get("glc__D", "e"), Some(4.0));
        assert_eq!(table.get("lac__L", "e"), None);
    }

    #[test]
    fn test_index_zero_is_kept() {
        let model = model(&["M_glc__D_c", "M_lac__L_e"]);
        let matches = vec![matched("glucose", "M_glc__D_c"), matched("lactate", "M_lac__L_e")];

        let table = pivot(&locate_positions(&matches, &model));
        let mapped = map_positions_to_queries(&table, &matches, &mut Report::new());

        assert_eq!(mapped.compartments, vec!["c", "e"]);
        assert_eq!(mapped.get("glucose").unwrap().values, vec![Some(0.0), None]);
        assert_eq!(mapped.get("lactate").unwrap().values, vec![None, Some(1.0)]);
    }

    #[test]
    fn test_duplicate_queries_are_dropped() {
        let model = model(&["M_glc__D_c", "M_glc__D_e"]);
        let matches = vec![matched("glucose", "M_glc__D_c"), matched("glucose", "M_glc__D_e")];

        let table = pivot(&locate_positions(&matches, &model));
        let mut report = Report::new();
        let mapped = map_positions_to_queries(&table, &matches, &mut report);

        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped.rows[0].values, vec![Some(0.0), Some(1.0)]);
        assert!(report.is_empty());
    }

    #[test]
    fn test_query_matching_two_keys_is_reported() {
        let model = model(&["M_glc__D_c", "M_glc__bD_c"]);
        let matches = vec![matched("glucose", "M_glc__D_c"), matched("glucose", "M_glc__bD_c")];

        let table = pivot(&locate_positions(&matches, &model));
        let mut report = Report::new();
        let mapped = map_positions_to_queries(&table, &matches, &mut report);

        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped.rows[0].key, "glc__D");

        let entries = report.by_stage(Stage::Positions);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].subject, "glucose");
        assert_eq!(entries[0].message, "also matches glc__bD, kept positions of glc__D");
    }

    #[test]
    fn test_match_without_position_is_reported() {
        let matches = vec![matched("lactate", "M_lac__L_c")];

        let mut report = Report::new();
        let mapped = map_positions_to_queries(&PositionTable::default(), &matches, &mut report);

        assert!(mapped.is_empty());
        assert_eq!(report.warnings(), 1);
        assert_eq!(report.entries[0].stage, Stage::Positions);
    }

    fn positions_for(xml: &str) -> QueryPositions {
        let mut report = Report::new();
        let model = parse_model(xml.as_bytes(), &mut report).unwrap();
        let identifiers = vec![IdentifierRecord {
            query: "pyruvate".to_string(),
            chebi: Some("15361".to_string()),
            ..Default::default()
        }];

        let matches = match_model_and_data(&identifiers, &model, &MatchKey::defaults());
        let table = pivot(&locate_positions(&matches, &model));
        map_positions_to_queries(&table, &matches, &mut report)
    }

    #[test]
    fn test_compartment_with_underscore_is_positioned() {
        let xml = r#"<sbml><model><listOfSpecies>
  <species id="M_h2o_c" compartment="c"/>
  <species id="M_pyr_c_i" compartment="c_i">
    <annotation><rdf:li rdf:resource="http://identifiers.org/chebi/CHEBI:15361"/></annotation>
  </species>
</listOfSpecies></model></sbml>"#;

        let mapped = positions_for(xml);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped.compartments, vec!["c_i"]);
        assert_eq!(mapped.rows[0].key, "pyr");
        assert_eq!(mapped.rows[0].values, vec![Some(1.0)]);
    }

    #[test]
    fn test_metaid_different_from_id_is_positioned() {
        let xml = r#"<sbml><model><listOfSpecies>
  <species metaid="meta_M_pyr_c" id="M_pyr_c" compartment="c">
    <annotation><rdf:li rdf:resource="http://identifiers.org/chebi/CHEBI:15361"/></annotation>
  </species>
</listOfSpecies></model></sbml>"#;

        let mapped = positions_for(xml);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped.get("pyruvate").unwrap().key, "pyr");
        assert_eq!(mapped.rows[0].values, vec![Some(0.0)]);
    }
}
