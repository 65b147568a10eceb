//! Pipeline configuration
//!
//! All settings have defaults, so an empty JSON object (`{}`) is a valid
//! configuration file. The CLI loads the file first and applies its flags on top.

use std::path::PathBuf;

use derive_builder::Builder;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::identifiers::MatchKey;

/// MetaboAnalyst compound-mapping endpoint.
pub const DEFAULT_MAPCOMPOUNDS_URL: &str = "http://api.xialab.ca/mapcompounds";

/// PubChem PUG REST root.
pub const DEFAULT_PUBCHEM_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_mapcompounds_url() -> String {
    DEFAULT_MAPCOMPOUNDS_URL.to_string()
}

fn default_pubchem_url() -> String {
    DEFAULT_PUBCHEM_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_drop_columns() -> Vec<String> {
    vec!["Time".to_string()]
}

/// Settings for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Builder)]
pub struct PipelineConfig {
    /// URL of the MetaboAnalyst `mapcompounds` endpoint.
    #[serde(default = "default_mapcompounds_url")]
    #[builder(default = "default_mapcompounds_url()", setter(into))]
    pub mapcompounds_url: String,

    /// Root of the PubChem PUG REST API.
    #[serde(default = "default_pubchem_url")]
    #[builder(default = "default_pubchem_url()", setter(into))]
    pub pubchem_url: String,

    /// Timeout applied to every HTTP request.
    #[serde(default = "default_timeout_secs")]
    #[builder(default = "default_timeout_secs()")]
    pub timeout_secs: u64,

    /// Expand every measured name with its PubChem synonyms before mapping.
    #[serde(default)]
    #[builder(default)]
    pub expand_synonyms: bool,

    /// Splits compound-method names such as `citrate/isocitrate` into separate queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name_delimiter: Option<String>,

    /// Lower-case query terms before sending them.
    #[serde(default)]
    #[builder(default)]
    pub lowercase_queries: bool,

    /// Identifier databases used to join measurements and model species.
    #[serde(default = "MatchKey::defaults")]
    #[builder(default = "MatchKey::defaults()", setter(into))]
    pub match_keys: Vec<MatchKey>,

    /// Header of the metabolite name column; the first column when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name_column: Option<String>,

    /// Measurement columns left out of the final dataset.
    #[serde(default = "default_drop_columns")]
    #[builder(default = "default_drop_columns()", setter(into))]
    pub drop_columns: Vec<String>,

    /// Directory for intermediate CSV files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub checkpoint_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mapcompounds_url: default_mapcompounds_url(),
            pubchem_url: default_pubchem_url(),
            timeout_secs: default_timeout_secs(),
            expand_synonyms: false,
            name_delimiter: None,
            lowercase_queries: false,
            match_keys: MatchKey::defaults(),
            name_column: None,
            drop_columns: default_drop_columns(),
            checkpoint_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Request timeout as a [`std::time::Duration`].
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}
