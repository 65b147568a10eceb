//! Cross-database compound identifiers
//!
//! Both sides of the pipeline (the compound-mapping service and the metabolic
//! model annotations) report identifiers in slightly different spellings. This
//! module holds the shared record type and the normalization rules that make
//! the two comparable.

use std::fmt::{self, Display};
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Markers used by the web services for "no identifier".
const ABSENT_MARKERS: &[&str] = &["-", "NA", "N/A", "NaN", "nan", "None", "null"];

/// Number of digits in a current-style HMDB accession (`HMDB0000122`).
const HMDB_DIGITS: usize = 7;

/// Identifier databases that can be used to join measured names and model species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchKey {
    Chebi,
    Kegg,
    Hmdb,
}

impl MatchKey {
    /// Default join keys: ChEBI first, then KEGG.
    pub fn defaults() -> Vec<MatchKey> {
        vec![MatchKey::Chebi, MatchKey::Kegg]
    }

    /// Column header used in tables for this key.
    pub fn column(&self) -> &'static str {
        match self {
            MatchKey::Chebi => "CHEBI",
            MatchKey::Kegg => "KEGG",
            MatchKey::Hmdb => "HMDB",
        }
    }

    /// Normalizes a raw identifier for this database.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        match self {
            MatchKey::Chebi => normalize_chebi(raw),
            MatchKey::Kegg => normalize_kegg(raw),
            MatchKey::Hmdb => normalize_hmdb(raw),
        }
    }
}

impl Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

impl FromStr for MatchKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chebi" => Ok(MatchKey::Chebi),
            "kegg" => Ok(MatchKey::Kegg),
            "hmdb" => Ok(MatchKey::Hmdb),
            _ => Err(format!("Invalid match key: {s}")),
        }
    }
}

/// Identifiers resolved for a single measured metabolite name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentifierRecord {
    /// The name that was sent to the service.
    pub query: String,
    /// The compound name the service matched, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmdb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kegg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubchem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chebi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metlin: Option<String>,
}

impl IdentifierRecord {
    /// Returns the normalized identifier stored for `key`.
    pub fn get(&self, key: MatchKey) -> Option<&str> {
        match key {
            MatchKey::Chebi => self.chebi.as_deref(),
            MatchKey::Kegg => self.kegg.as_deref(),
            MatchKey::Hmdb => self.hmdb.as_deref(),
        }
    }

    /// True if the service did not return a single identifier.
    pub fn is_unresolved(&self) -> bool {
        self.hmdb.is_none()
            && self.kegg.is_none()
            && self.pubchem.is_none()
            && self.chebi.is_none()
            && self.metlin.is_none()
    }
}

/// Trims a raw value and maps the services' "absent" markers to `None`.
pub fn clean(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || ABSENT_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed)
    }
}

/// Renders integral floats (`17234.0`) without their fraction.
pub fn normalize_numeric(raw: &str) -> Option<String> {
    let value = clean(raw)?;
    match value.parse::<f64>() {
        Ok(number) if number.fract() == 0.0 && (0.0..u64::MAX as f64).contains(&number) => {
            Some(format!("{}", number as u64))
        }
        _ => Some(value.to_string()),
    }
}

/// `CHEBI:17234`, `17234` and `17234.0` all become `17234`.
pub fn normalize_chebi(raw: &str) -> Option<String> {
    let value = clean(raw)?;
    let value = value
        .strip_prefix("CHEBI:")
        .or_else(|| value.strip_prefix("chebi:"))
        .unwrap_or(value);
    normalize_numeric(value)
}

/// KEGG compound ids are compared upper-cased (`c00031` becomes `C00031`).
pub fn normalize_kegg(raw: &str) -> Option<String> {
    clean(raw).map(|value| value.to_ascii_uppercase())
}

/// Pads HMDB accessions to the current seven digit form.
///
/// Older models use `HMDB00122` while the mapping service reports
/// `HMDB0000122`; both normalize to the latter.
pub fn normalize_hmdb(raw: &str) -> Option<String> {
    let value = clean(raw)?.to_ascii_uppercase();
    let digits = value.strip_prefix("HMDB").unwrap_or(&value);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Some(value);
    }

    let trimmed = digits.trim_start_matches('0');
    if trimmed.len() > HMDB_DIGITS {
        return Some(format!("HMDB{trimmed}"));
    }

    Some(format!("HMDB{:0>width$}", trimmed, width = HMDB_DIGITS))
}
