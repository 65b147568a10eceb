//! Metabolomics-to-model mapping library
//!
//! This library places measured metabolites in a genome-scale metabolic model:
//! - Resolving measured names to ChEBI, KEGG and HMDB identifiers through MetaboAnalyst
//! - Expanding names with PubChem synonyms
//! - Reading species and their annotations from SBML models
//! - Matching both sides and locating every metabolite per compartment
//! - Reading and writing measurement tables and checkpoints

#![warn(unused_imports)]

/// Commonly used types and functionality re-exported for convenience
pub mod prelude {
    pub use crate::config::*;
    pub use crate::dataset::*;
    pub use crate::identifiers::*;
    pub use crate::io::*;
    pub use crate::matching::*;
    pub use crate::names::*;
    pub use crate::pipeline::*;
    pub use crate::positions::*;
    pub use crate::report::*;
    pub use crate::sbml::{reader::*, species::*};
    pub use crate::tabular::{dataframe::*, table::*};
}

/// Pipeline settings
pub mod config;

/// Identifier records and normalization
pub mod identifiers;

/// Query terms derived from measured names
pub mod names;

/// Web service clients
pub mod services {
    /// Error types for web service failures
    pub mod error;
    /// MetaboAnalyst compound mapping
    pub mod metaboanalyst;
    /// PubChem synonym lookups
    pub mod pubchem;
}

/// Metabolic model reading
pub mod sbml {
    /// Identifier extraction from annotation URIs
    pub mod annotations;
    /// Error types for model reading
    pub mod error;
    /// Streaming SBML reader
    pub mod reader;
    /// Model species and id handling
    pub mod species;
}

/// Joining identifiers and model species
pub mod matching;

/// Model positions per compartment
pub mod positions;

/// Final dataset construction
pub mod dataset;

/// Stage orchestration
pub mod pipeline;

/// Skipped items of a run
pub mod report;

/// Tabular data handling
pub mod tabular {
    /// DataFrame conversion and checkpoints
    pub mod dataframe;
    /// Error types for tabular IO
    pub mod error;
    /// Reading tabular data from files
    pub mod reader;
    /// In-memory measurement table
    pub mod table;
    /// Writing data to tabular formats
    pub mod writer;
}

/// Display of results as tables
pub mod info;

/// IO functionality
pub mod io;
