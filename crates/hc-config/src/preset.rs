//! Search presets trading run time for confidence.
//!
//! - Quick: few restarts, short training, for smoke runs and tests
//! - Standard: the reference search (1000 restarts × 100 epochs)
//! - Thorough: more restarts and epochs, with verification enabled

use crate::search::SearchConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Available search presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Few restarts, short training
    Quick,
    /// Reference search settings
    Standard,
    /// Many restarts, long training, verification on
    Thorough,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] =
        &[PresetName::Quick, PresetName::Standard, PresetName::Thorough];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Quick => "quick",
            PresetName::Standard => "standard",
            PresetName::Thorough => "thorough",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "quick" => Some(PresetName::Quick),
            "standard" | "default" => Some(PresetName::Standard),
            "thorough" => Some(PresetName::Thorough),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Quick => "50 restarts x 50 epochs per level, no verification",
            PresetName::Standard => "1000 restarts x 100 epochs per level, no verification",
            PresetName::Thorough => {
                "5000 restarts x 200 epochs per level, verifies half of the stored HMMs"
            }
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Debug, Clone, Error)]
pub enum PresetError {
    #[error(
        "Unknown preset '{0}'. Available: {available}",
        available = PresetName::ALL.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
    )]
    UnknownPreset(String),
}

/// Build the search config for a preset.
pub fn get_preset(name: PresetName) -> SearchConfig {
    let base = SearchConfig::default();
    match name {
        PresetName::Quick => SearchConfig {
            hmm_searches: 50,
            epochs: 50,
            epoch_searches: 5,
            ..base
        },
        PresetName::Standard => base,
        PresetName::Thorough => SearchConfig {
            hmm_searches: 5000,
            epochs: 200,
            epoch_searches: 20,
            verify: true,
            proportion: 0.5,
            ..base
        },
    }
}

/// Summary of a preset for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
}

/// List all presets with descriptions.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|p| PresetInfo {
            name: p.as_str().to_string(),
            description: p.description().to_string(),
        })
        .collect()
}
