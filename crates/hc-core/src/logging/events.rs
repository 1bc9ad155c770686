//! Structured event vocabulary.
//!
//! Every search event carries the run id, the word under search and the stage.

use serde::{Deserialize, Serialize};

/// Stages of a complexity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Level loop and restarts.
    Search,
    /// Baum-Welch epochs on one restart.
    Train,
    /// Re-scoring stored layers.
    Verify,
    /// Result output.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Search => "search",
            Stage::Train => "train",
            Stage::Verify => "verify",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";

    // Search stage
    pub const SEARCH_TRIVIAL: &str = "search.trivial";
    pub const SEARCH_LEVEL_STARTED: &str = "search.level_started";
    pub const SEARCH_LEVEL_EXHAUSTED: &str = "search.level_exhausted";
    pub const SEARCH_WITNESS_FOUND: &str = "search.witness_found";
    pub const SEARCH_CAP_EXCEEDED: &str = "search.cap_exceeded";

    // Train stage
    pub const TRAIN_RESTART_DONE: &str = "train.restart_done";
    pub const TRAIN_STALLED: &str = "train.stalled";

    // Verify stage
    pub const VERIFY_STARTED: &str = "verify.started";
    pub const VERIFY_HIT: &str = "verify.hit";
    pub const VERIFY_FINISHED: &str = "verify.finished";
}

/// Correlation fields shared by every event of one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,
    /// Word currently being searched, once known.
    pub word: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            word: None,
        }
    }

    pub fn with_word(mut self, word: impl Into<String>) -> Self {
        self.word = Some(word.into());
        self
    }
}
