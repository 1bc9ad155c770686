//! Loading a resolved, validated search configuration.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::resolve::{resolve_config_path, ConfigSource};
use crate::search::SearchConfig;
use crate::validate::{validate_search_config, ValidationError};

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("Semantic validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// A search configuration with provenance.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SearchConfig,
    /// Path the config came from (None for built-in defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Resolve, read and validate the search configuration.
///
/// An explicit CLI path that does not exist is an error; every other
/// missing location falls through to the built-in defaults.
pub fn load_config(cli_path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let (path, source) = resolve_config_path(cli_path);

    let config = match &path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound { path: p.clone() });
            }
            SearchConfig::from_file(p).map_err(|source| ConfigError::Load {
                path: p.clone(),
                source,
            })?
        }
        None => SearchConfig::default(),
    };

    validate_search_config(&config)?;

    Ok(LoadedConfig {
        config,
        path,
        source,
    })
}
