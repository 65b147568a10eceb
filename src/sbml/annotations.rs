//! Identifier extraction from species annotation URIs.
//!
//! Metabolic models reference external databases through MIRIAM-style
//! `identifiers.org` URIs in the RDF annotation of each species:
//!
//! ```xml
//! <rdf:li rdf:resource="http://identifiers.org/chebi/CHEBI:17234"/>
//! ```
//!
//! Three fixed patterns (ChEBI, HMDB, KEGG compound) are applied to every URI
//! independently.

use lazy_static::lazy_static;
use regex::Regex;

use crate::identifiers::{normalize_chebi, normalize_hmdb, normalize_kegg};

lazy_static! {
    static ref CHEBI_PATTERN: Regex =
        Regex::new(r"https?://identifiers\.org/chebi/CHEBI:(\d+)").expect("valid ChEBI pattern");
    static ref HMDB_PATTERN: Regex =
        Regex::new(r"https?://identifiers\.org/hmdb/HMDB(\d+)").expect("valid HMDB pattern");
    static ref KEGG_PATTERN: Regex = Regex::new(r"https?://identifiers\.org/kegg\.compound/C(\d+)")
        .expect("valid KEGG pattern");
}

/// Identifiers found in the annotation URIs of one species.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationIds {
    pub chebi: Vec<String>,
    pub hmdb: Vec<String>,
    pub kegg: Vec<String>,
}

impl AnnotationIds {
    /// Extracts identifiers from a list of annotation URIs.
    pub fn from_uris<S: AsRef<str>>(uris: &[S]) -> Self {
        let mut ids = AnnotationIds::default();
        for uri in uris {
            ids.add_uri(uri.as_ref());
        }
        ids
    }

    /// Applies the three patterns to one URI.
    pub fn add_uri(&mut self, uri: &str) {
        for capture in CHEBI_PATTERN.captures_iter(uri) {
            push_unique(&mut self.chebi, normalize_chebi(&capture[1]));
        }
        for capture in HMDB_PATTERN.captures_iter(uri) {
            push_unique(&mut self.hmdb, normalize_hmdb(&format!("HMDB{}", &capture[1])));
        }
        for capture in KEGG_PATTERN.captures_iter(uri) {
            push_unique(&mut self.kegg, normalize_kegg(&format!("C{}", &capture[1])));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chebi.is_empty() && self.hmdb.is_empty() && self.kegg.is_empty()
    }
}

fn push_unique(values: &mut Vec<String>, value: Option<String>) {
    if let Some(value) = value {
        if !values.contains(&value) {
            values.push(value);
        }
    }
}
