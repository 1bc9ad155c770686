//! HMM Complexity Core Library
//!
//! Estimates the HMM complexity of a word: the fewest hidden states an HMM
//! needs to rank that word strictly above every other word of the same length
//! over the same alphabet.
//!
//! - `hmm`: layer parameters, forward-backward scoring, Baum-Welch training
//! - `words`: words and their enumeration
//! - `search`: the escalating restart-and-train complexity search
//! - `store` / `verify`: dumps of non-witnessing layers and their re-scoring
//! - `witness`: the witness test and a hand-built `0^n 1` witness
//!
//! The binary entry point is in `main.rs`.

pub mod exit_codes;
pub mod hmm;
pub mod logging;
pub mod search;
pub mod store;
pub mod verify;
pub mod witness;
pub mod words;

pub use hmm::{EmStep, HiddenMarkovLayer, HiddenMarkovModel, HmmError, TrainingSummary};
pub use search::{
    compute_all_complexity, compute_complexity, ComplexityReport, ComplexityRule,
    ComplexitySearch, SearchError,
};
pub use words::{all_words, unique_words, Word};
