//! HMM complexity search configuration loading and validation.
//!
//! This crate provides:
//! - Typed `SearchConfig` for the complexity search knobs
//! - Named presets (quick / standard / thorough)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation

pub mod load;
pub mod preset;
pub mod resolve;
pub mod search;
pub mod validate;

pub use load::{load_config, ConfigError, LoadedConfig};
pub use preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use resolve::{resolve_config_path, ConfigSource};
pub use search::{RecordFormat, SearchConfig};
pub use validate::{validate_search_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Largest alphabet whose symbols are all single digits.
pub const MAX_ALPHABET_SIZE: usize = 10;
