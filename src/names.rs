//! Query planning for measured metabolite names
//!
//! Measured names are not always sent to the mapping service verbatim: a
//! compound-method column may hold several names (`citrate/isocitrate`), names
//! may be lower-cased, and synonyms may be added. The [`QueryPlan`] keeps track
//! of which measured name every query term came from, so that service results
//! can be traced back to their measurement rows.

use std::collections::{BTreeSet, HashMap};

use crate::config::PipelineConfig;
use crate::tabular::table::MeasurementTable;

/// Characters stripped from synonyms returned by the synonym service.
const SYNONYM_NOISE: &[char] = &['[', ']', '\'', '"'];

/// Mapping from query terms to the measured names they stand for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPlan {
    /// Query terms in first-seen order.
    terms: Vec<String>,
    /// Measured names a term resolves to.
    origins: HashMap<String, BTreeSet<String>>,
    /// Measured names in row order, without duplicates.
    names: Vec<String>,
}

impl QueryPlan {
    /// Builds a plan from the name column of a measurement table.
    pub fn from_table(table: &MeasurementTable, column: usize, config: &PipelineConfig) -> Self {
        let names = table.names(column).into_iter().flatten().collect::<Vec<_>>();
        Self::from_names(&names, config)
    }

    /// Builds a plan from measured names.
    pub fn from_names(names: &[String], config: &PipelineConfig) -> Self {
        let mut plan = QueryPlan::default();

        for name in names {
            if plan.names.contains(name) {
                continue;
            }
            plan.names.push(name.clone());

            let parts: Vec<&str> = match config.name_delimiter.as_deref() {
                Some(delimiter) if !delimiter.is_empty() => name.split(delimiter).collect(),
                _ => vec![name.as_str()],
            };

            for part in parts {
                let term = part.trim();
                if term.is_empty() {
                    continue;
                }
                let term = if config.lowercase_queries {
                    term.to_lowercase()
                } else {
                    term.to_string()
                };
                plan.insert(term, name);
            }
        }

        plan
    }

    fn insert(&mut self, term: String, origin: &str) {
        let origins = self.origins.entry(term.clone()).or_default();
        if origins.is_empty() {
            self.terms.push(term);
        }
        origins.insert(origin.to_string());
    }

    /// Adds synonyms found for `term`; they resolve to the same measured names as `term`.
    ///
    /// Returns the number of new query terms.
    pub fn add_synonyms<'a>(
        &mut self,
        term: &str,
        synonyms: impl IntoIterator<Item = &'a String>,
    ) -> usize {
        let origins: Vec<String> = match self.origins.get(term) {
            Some(origins) => origins.iter().cloned().collect(),
            None => return 0,
        };

        let before = self.terms.len();
        for synonym in synonyms {
            let Some(cleaned) = clean_synonym(synonym) else {
                continue;
            };
            for origin in &origins {
                self.insert(cleaned.clone(), origin);
            }
        }
        self.terms.len() - before
    }

    /// Query terms in first-seen order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Measured names in row order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Measured names a query term stands for.
    ///
    /// Terms the plan does not know resolve to themselves, since the mapping
    /// service echoes its input verbatim in most cases.
    pub fn resolve(&self, term: &str) -> Vec<String> {
        if let Some(origins) = self.origins.get(term) {
            return origins.iter().cloned().collect();
        }

        let lowered = term.to_lowercase();
        self.origins
            .iter()
            .find(|(key, _)| key.to_lowercase() == lowered)
            .map(|(_, origins)| origins.iter().cloned().collect())
            .unwrap_or_else(|| vec![term.to_string()])
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }
}

/// Strips list punctuation from a synonym and lower-cases it.
pub fn clean_synonym(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| !SYNONYM_NOISE.contains(c)).collect();
    let cleaned = cleaned.trim().to_lowercase();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
