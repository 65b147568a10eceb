use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading a metabolic model
#[derive(Debug, Error)]
pub enum ModelError {
    /// Error when reading the SBML file fails
    #[error("Failed to read SBML file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error when the document is not well-formed XML
    #[error("Malformed XML at byte {position}: {source}")]
    XmlError {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// Error when a species element has neither `id` nor `metaid`
    #[error("Species #{0} has no id")]
    MissingSpeciesId(usize),

    /// Error when the document does not list any species
    #[error("No species found in model {0}")]
    NoSpecies(PathBuf),
}
