//! Discrete hidden Markov models.
//!
//! - [`HiddenMarkovLayer`]: parameters `T`, `E`, `π` plus forward/backward
//!   scoring and one Baum-Welch re-estimation step
//! - [`HiddenMarkovModel`]: owns a layer and runs training epochs over it

pub mod layer;
pub mod model;

pub use layer::{EmStep, HiddenMarkovLayer};
pub use model::{HiddenMarkovModel, TrainingSummary};

use hc_math::ProbabilityError;
use thiserror::Error;

/// Errors from building, scoring or training a layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HmmError {
    #[error("alphabet size must be in 1..={max}, got {size}")]
    InvalidAlphabet { size: usize, max: usize },

    #[error("invalid symbol '{symbol}' at position {position} for alphabet of size {size}")]
    InvalidSymbol {
        symbol: char,
        position: usize,
        size: usize,
    },

    #[error("symbol {symbol} out of range for a layer with {symbols} symbols")]
    SymbolOutOfRange { symbol: usize, symbols: usize },

    #[error("layer needs at least one hidden state")]
    NoStates,

    #[error("{what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what} labels do not match the hidden states")]
    LabelMismatch { what: &'static str },

    #[error("cannot re-estimate on an empty sequence")]
    EmptySequence,

    #[error(transparent)]
    Probability(#[from] ProbabilityError),
}
