use serde::{Deserialize, Serialize};

use crate::identifiers::MatchKey;

/// Prefix SBML exporters put in front of metabolite ids.
const SPECIES_PREFIX: &str = "M_";

/// A metabolite of the model together with its annotated identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSpecies {
    /// Position in the model's species list (0-based).
    pub index: usize,
    /// SBML `id` attribute, e.g. `M_glc__D_c`.
    pub id: String,
    /// BIGG id: the `metaid` attribute, or `id` when there is none.
    pub bigg: String,
    /// Display name.
    pub name: Option<String>,
    /// Compartment suffix, e.g. `c`.
    pub compartment: Option<String>,
    /// Metabolite key shared by all compartments, e.g. `glc__D`.
    pub key: String,
    pub chebi: Vec<String>,
    pub hmdb: Vec<String>,
    pub kegg: Vec<String>,
}

impl ModelSpecies {
    /// Identifiers of the given database.
    pub fn ids(&self, key: MatchKey) -> &[String] {
        match key {
            MatchKey::Chebi => &self.chebi,
            MatchKey::Kegg => &self.kegg,
            MatchKey::Hmdb => &self.hmdb,
        }
    }

    /// Name shown in match tables, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn has_identifiers(&self) -> bool {
        !(self.chebi.is_empty() && self.hmdb.is_empty() && self.kegg.is_empty())
    }
}

/// The species of a metabolic model, in model order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetabolicModel {
    pub id: Option<String>,
    pub species: Vec<ModelSpecies>,
}

impl MetabolicModel {
    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Sorted compartments that occur in the model.
    pub fn compartments(&self) -> Vec<String> {
        let mut compartments: Vec<String> = self
            .species
            .iter()
            .filter_map(|s| s.compartment.clone())
            .collect();
        compartments.sort();
        compartments.dedup();
        compartments
    }
}

/// Splits a species id into its metabolite key and compartment.
///
/// The `M_` prefix is removed first. When the species carries a
/// `compartment` attribute, that attribute is the compartment and only a
/// matching `_<attr>` or `[<attr>]` suffix is stripped from the key. Without
/// the attribute the text after the last `_` (or inside a trailing `[..]`)
/// is the compartment.
///
/// ```
/// use metabomap::sbml::species::split_species_id;
///
/// assert_eq!(
///     split_species_id("M_glc__D_c", None),
///     ("glc__D".to_string(), Some("c".to_string()))
/// );
/// ```
pub fn split_species_id(id: &str, compartment: Option<&str>) -> (String, Option<String>) {
    let stripped = id.strip_prefix(SPECIES_PREFIX).unwrap_or(id);

    if let Some(compartment) = compartment.filter(|c| !c.is_empty()) {
        if let Some(key) = stripped.strip_suffix(&format!("_{compartment}")) {
            if !key.is_empty() {
                return (key.to_string(), Some(compartment.to_string()));
            }
        }
        if let Some(key) = stripped.strip_suffix(&format!("[{compartment}]")) {
            if !key.is_empty() {
                return (key.to_string(), Some(compartment.to_string()));
            }
        }
        return (stripped.to_string(), Some(compartment.to_string()));
    }

    if let Some(open) = stripped.rfind('[') {
        if stripped.ends_with(']') && open > 0 {
            let inner = &stripped[open + 1..stripped.len() - 1];
            if !inner.is_empty() {
                return (stripped[..open].to_string(), Some(inner.to_string()));
            }
        }
    }

    match stripped.rsplit_once('_') {
        Some((key, suffix)) if !key.is_empty() && !suffix.is_empty() => {
            (key.to_string(), Some(suffix.to_string()))
        }
        _ => (stripped.to_string(), None),
    }
}

/// Strips the `M_` prefix and the compartment suffix from a BIGG id.
pub fn metabolite_key(bigg: &str) -> String {
    split_species_id(bigg, None).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_bigg_id() {
        assert_eq!(
            split_species_id("M_glc__D_c", Some("c")),
            ("glc__D".to_string(), Some("c".to_string()))
        );
        assert_eq!(
            split_species_id("M_atp_m", None),
            ("atp".to_string(), Some("m".to_string()))
        );
    }

    #[test]
    fn test_split_bracket_compartment() {
        assert_eq!(
            split_species_id("glc_D[e]", None),
            ("glc_D".to_string(), Some("e".to_string()))
        );
    }

    #[test]
    fn test_split_without_suffix_uses_attribute() {
        assert_eq!(
            split_species_id("M_h2o", Some("c")),
            ("h2o".to_string(), Some("c".to_string()))
        );
        assert_eq!(split_species_id("h2o", None), ("h2o".to_string(), None));
    }

    #[test]
    fn test_attribute_not_in_id_keeps_key_whole() {
        assert_eq!(
            split_species_id("M_glc__D", Some("c")),
            ("glc__D".to_string(), Some("c".to_string()))
        );
        assert_eq!(
            split_species_id("M_glc__D_e", Some("c")),
            ("glc__D_e".to_string(), Some("c".to_string()))
        );
    }

    #[test]
    fn test_compartment_attribute_with_underscore() {
        assert_eq!(
            split_species_id("M_pyr_c_i", Some("c_i")),
            ("pyr".to_string(), Some("c_i".to_string()))
        );
    }

    #[test]
    fn test_metabolite_key() {
        assert_eq!(metabolite_key("M_glc__D_e"), "glc__D");
        assert_eq!(metabolite_key("M_13dampp_c"), "13dampp");
    }

    #[test]
    fn test_model_compartments() {
        let model = MetabolicModel {
            id: None,
            species: vec![
                ModelSpecies {
                    compartment: Some("e".to_string()),
                    ..Default::default()
                },
                ModelSpecies {
                    compartment: Some("c".to_string()),
                    ..Default::default()
                },
                ModelSpecies {
                    compartment: Some("c".to_string()),
                    ..Default::default()
                },
            ],
        };
        assert_eq!(model.compartments(), vec!["c", "e"]);
    }
}
