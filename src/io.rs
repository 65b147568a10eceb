use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::PipelineConfig;

/// Loads a pipeline configuration from a JSON file.
///
/// Missing fields fall back to their defaults, so a partial file only needs
/// to name the settings it changes.
///
/// # Arguments
///
/// * `path` - Path to the JSON configuration file
///
/// # Returns
///
/// Returns a `Result` containing either:
/// * `Ok(PipelineConfig)` - The parsed configuration
/// * `Err(IOError)` - The file could not be opened or is not valid JSON
pub fn load_config(path: impl Into<PathBuf>) -> Result<PipelineConfig, IOError> {
    let path = path.into();
    let file = std::fs::File::open(path).map_err(IOError::FileNotFound)?;
    serde_json::from_reader(file).map_err(IOError::JsonParseError)
}

/// Saves a pipeline configuration to a JSON file.
///
/// # Arguments
///
/// * `path` - Destination of the JSON file
/// * `config` - The configuration to save
pub fn save_config(path: impl Into<PathBuf>, config: &PipelineConfig) -> Result<(), IOError> {
    let path = path.into();
    let file = std::fs::File::create(path).map_err(IOError::FileNotFound)?;
    serde_json::to_writer_pretty(file, config).map_err(IOError::JsonParseError)
}

/// Creates the checkpoint directory if needed and returns the path of `file_name` inside it.
pub fn checkpoint_path(dir: &Path, file_name: &str) -> Result<PathBuf, IOError> {
    std::fs::create_dir_all(dir).map_err(IOError::FileNotFound)?;
    Ok(dir.join(file_name))
}

/// Represents errors that can occur while reading or writing configuration files.
#[derive(Error, Debug)]
pub enum IOError {
    /// The file could not be found, opened or created.
    #[error("File not found: {0}")]
    FileNotFound(#[from] std::io::Error),

    /// The file contents could not be parsed as valid JSON.
    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfigBuilder;

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = PipelineConfigBuilder::default()
            .expand_synonyms(true)
            .build()
            .unwrap();

        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_config() {
        let result = load_config("does/not/exist.json");
        assert!(matches!(result, Err(IOError::FileNotFound(_))));
    }

    #[test]
    fn test_checkpoint_path_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("checkpoints");
        let path = checkpoint_path(&nested, "matches.csv").unwrap();
        assert!(nested.is_dir());
        assert_eq!(path, nested.join("matches.csv"));
    }
}
