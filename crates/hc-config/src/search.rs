//! Search configuration types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// On-disk encoding of the verification record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// One self-describing JSON object per line (default).
    #[default]
    Jsonl,
    /// Legacy flat text table with sentinel-padded columns.
    Padded,
}

impl RecordFormat {
    /// File extension used for stores in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            RecordFormat::Jsonl => "jsonl",
            RecordFormat::Padded => "txt",
        }
    }
}

impl std::str::FromStr for RecordFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" | "json" => Ok(RecordFormat::Jsonl),
            "padded" | "txt" | "text" | "legacy" => Ok(RecordFormat::Padded),
            _ => Err(format!("unknown record format: {}", s)),
        }
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordFormat::Jsonl => write!(f, "jsonl"),
            RecordFormat::Padded => write!(f, "padded"),
        }
    }
}

/// Knobs for one complexity search.
///
/// Every field has a default, so config files may set any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub schema_version: String,

    /// Alphabet size; symbols are `"0".."size-1"`.
    pub size: usize,

    /// Random restarts per state count.
    pub hmm_searches: usize,

    /// Re-estimation epochs per restart.
    pub epochs: usize,

    /// Extra single-epoch rounds tried on a non-witnessing layer.
    pub epoch_searches: usize,

    /// Slack in the witness test `score(word) > max(others) - epsilon`.
    pub epsilon: f64,

    /// Persist non-witnessing layers and verify each exhausted level.
    pub verify: bool,

    /// Fraction of stored layers re-scored during verification.
    pub proportion: f64,

    /// Report the witnessing layer's parameters.
    pub print_witness: bool,

    /// Seed for the search RNG; `None` draws one from the OS.
    pub seed: Option<u64>,

    /// Highest state count tried; `None` caps at the word length.
    pub max_complexity: Option<usize>,

    pub record_format: RecordFormat,

    /// Directory holding verification record stores.
    pub record_dir: PathBuf,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            size: 2,
            hmm_searches: 1000,
            epochs: 100,
            epoch_searches: 10,
            epsilon: 0.0,
            verify: false,
            proportion: 0.5,
            print_witness: true,
            seed: None,
            max_complexity: None,
            record_format: RecordFormat::Jsonl,
            record_dir: PathBuf::from("."),
        }
    }
}

impl SearchConfig {
    /// Parse a config from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, crate::validate::ValidationError> {
        serde_json::from_str(json).map_err(|e| {
            crate::validate::ValidationError::ParseError(format!("Invalid JSON: {}", e))
        })
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, crate::validate::ValidationError> {
        toml::from_str(text).map_err(|e| {
            crate::validate::ValidationError::ParseError(format!("Invalid TOML: {}", e))
        })
    }

    /// Read a config file, choosing the parser by extension (`.json` or TOML otherwise).
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::validate::ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::validate::ValidationError::IoError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the alphabet size.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set restarts per level.
    pub fn with_hmm_searches(mut self, hmm_searches: usize) -> Self {
        self.hmm_searches = hmm_searches;
        self
    }

    /// Set epochs per restart.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Enable verification with the given sample proportion.
    pub fn with_verification(mut self, proportion: f64) -> Self {
        self.verify = true;
        self.proportion = proportion;
        self
    }

    /// Effective level cap for a word of `word_len` symbols.
    pub fn level_cap(&self, word_len: usize) -> usize {
        self.max_complexity.unwrap_or(word_len)
    }
}
