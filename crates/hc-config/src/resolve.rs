//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variable → XDG path → defaults.

use std::path::{Path, PathBuf};

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable naming a config file.
pub const ENV_CONFIG_PATH: &str = "HMM_COMPLEXITY_CONFIG";

/// Config file names looked up in the XDG directory, in order.
const CONFIG_FILENAMES: [&str; 2] = ["config.toml", "config.json"];

/// Application name for XDG directories.
const APP_NAME: &str = "hmm-complexity";

/// Resolve the config file path.
///
/// 1. Explicit CLI path (returned even if missing, so loading can report it)
/// 2. `HMM_COMPLEXITY_CONFIG` environment variable
/// 3. XDG config directory (~/.config/hmm-complexity/config.{toml,json})
/// 4. Built-in defaults (None)
pub fn resolve_config_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        for name in CONFIG_FILENAMES {
            let path = dir.join(name);
            if path.exists() {
                return (Some(path), ConfigSource::XdgConfig);
            }
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Get the XDG config directory for hmm-complexity.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}
