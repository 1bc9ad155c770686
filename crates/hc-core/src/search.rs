//! Complexity search.
//!
//! Starting at two states, each level runs `hmm_searches` random restarts of
//! `epochs` Baum-Welch epochs and tests the trained layer as a witness. A
//! layer that fails gets up to `epoch_searches` extra single epochs, with the
//! test repeated after each. When every restart of a level fails, the level
//! is optionally verified against the stored layers and the search moves on
//! to one more state. The empty word has complexity 0 and a word with a single
//! distinct symbol has complexity 1 without any search.

use chrono::{DateTime, Utc};
use hc_config::{validate_search_config, SearchConfig, ValidationError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

use crate::exit_codes::ExitCode;
use crate::hmm::{HiddenMarkovLayer, HiddenMarkovModel, HmmError};
use crate::logging::{event_names, generate_run_id, LogContext, Stage};
use crate::store::{RecordStore, StoreError};
use crate::verify::{verify_complexity, VerificationOutcome, VerifyError};
use crate::witness::check_witness;
use crate::words::{competitors, unique_words, Word};

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid search configuration: {0}")]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Hmm(#[from] HmmError),

    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    #[error("verification failed: {0}")]
    Verify(#[from] VerifyError),

    #[error("no witness for '{word}' with up to {max_complexity} states")]
    LevelCapExceeded { word: String, max_complexity: usize },
}

impl SearchError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SearchError::Config(_) => ExitCode::ConfigError,
            SearchError::Hmm(HmmError::InvalidSymbol { .. })
            | SearchError::Hmm(HmmError::InvalidAlphabet { .. })
            | SearchError::Hmm(HmmError::SymbolOutOfRange { .. }) => ExitCode::InvalidWord,
            SearchError::Hmm(_) => ExitCode::InternalError,
            SearchError::Store(_) | SearchError::Verify(VerifyError::Store(_)) => ExitCode::IoError,
            SearchError::Verify(VerifyError::InvalidProportion(_)) => ExitCode::ConfigError,
            SearchError::Verify(VerifyError::Hmm(_)) => ExitCode::InternalError,
            SearchError::LevelCapExceeded { .. } => ExitCode::SearchExhausted,
        }
    }
}

/// How the reported complexity was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityRule {
    /// The empty word, complexity 0.
    EmptyWord,
    /// One distinct symbol, complexity 1.
    SingleSymbol,
    /// A trained layer passed the witness test.
    Search,
    /// A stored layer passed the witness test on re-scoring.
    Verification,
}

/// A layer that ranks the word above all its competitors.
#[derive(Debug, Clone, Serialize)]
pub struct Witness {
    pub layer: HiddenMarkovLayer,
    pub score: f64,
    pub best_competitor: f64,
}

/// What happened at one state count.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LevelSummary {
    pub states: usize,
    /// Random restarts tried (including a witnessing one).
    pub restarts: usize,
    /// Extra single-epoch rounds across all restarts.
    pub extra_epochs: usize,
    /// Epochs skipped because the word had zero likelihood.
    pub stalled_epochs: usize,
    /// Layers written to the record store.
    pub stored: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationOutcome>,
}

/// Outcome of a search for one word.
#[derive(Debug, Clone, Serialize)]
pub struct ComplexityReport {
    pub run_id: String,
    pub word: Word,
    pub size: usize,
    pub complexity: usize,
    pub rule: ComplexityRule,
    /// Seed the search RNG started from.
    pub seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness: Option<Witness>,
    pub levels: Vec<LevelSummary>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A configured search with its own random generator.
///
/// Successive runs share the generator, so a seeded search over several
/// words is reproducible as a whole.
#[derive(Debug)]
pub struct ComplexitySearch {
    config: SearchConfig,
    seed: u64,
    rng: StdRng,
    store: RecordStore,
    ctx: LogContext,
}

impl ComplexitySearch {
    /// Validate `config` and seed the generator from `config.seed`, or from
    /// the OS when no seed is set.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        validate_search_config(&config)?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let store = RecordStore::from_config(&config);
        Ok(Self {
            config,
            seed,
            rng: StdRng::seed_from_u64(seed),
            store,
            ctx: LogContext::new(generate_run_id()),
        })
    }

    /// Use an existing correlation context for log events.
    pub fn with_context(mut self, ctx: LogContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn run_id(&self) -> &str {
        &self.ctx.run_id
    }

    /// Parse `word` over the configured alphabet and search it.
    pub fn run(&mut self, word: &str) -> Result<ComplexityReport, SearchError> {
        let word = Word::parse(word, self.config.size)?;
        self.run_word(&word)
    }

    pub fn run_word(&mut self, word: &Word) -> Result<ComplexityReport, SearchError> {
        let size = self.config.size;
        if let Some(&symbol) = word.symbols().iter().find(|&&s| s >= size) {
            return Err(HmmError::SymbolOutOfRange {
                symbol,
                symbols: size,
            }
            .into());
        }

        let ctx = self.ctx.clone().with_word(word.to_string());
        let started_at = Utc::now();
        let mut report = ComplexityReport {
            run_id: ctx.run_id.clone(),
            word: word.clone(),
            size,
            complexity: 0,
            rule: ComplexityRule::EmptyWord,
            seed: self.seed,
            witness: None,
            levels: Vec::new(),
            started_at,
            finished_at: started_at,
        };

        if word.is_empty() || word.distinct_symbols() == 1 {
            if !word.is_empty() {
                report.complexity = 1;
                report.rule = ComplexityRule::SingleSymbol;
            }
            crate::log_event!(
                ctx,
                INFO,
                event_names::SEARCH_TRIVIAL,
                Stage::Search,
                "complexity follows from the word alone",
                complexity = report.complexity
            );
            report.finished_at = Utc::now();
            return Ok(report);
        }

        let others = competitors(word, size);
        let cap = self.config.level_cap(word.len());

        for states in 2..=cap {
            let (summary, witness) = self.search_level(word, &others, states, &ctx)?;
            report.levels.push(summary);
            if let Some((witness, rule)) = witness {
                report.complexity = states;
                report.rule = rule;
                report.witness = Some(witness);
                report.finished_at = Utc::now();
                return Ok(report);
            }
        }

        crate::log_event!(
            ctx,
            WARN,
            event_names::SEARCH_CAP_EXCEEDED,
            Stage::Search,
            "no witness found up to the level cap",
            max_complexity = cap
        );
        Err(SearchError::LevelCapExceeded {
            word: word.to_string(),
            max_complexity: cap,
        })
    }

    /// Search one state count; returns the level summary and any witness.
    fn search_level(
        &mut self,
        word: &Word,
        others: &[Word],
        states: usize,
        ctx: &LogContext,
    ) -> Result<(LevelSummary, Option<(Witness, ComplexityRule)>), SearchError> {
        let size = self.config.size;
        let observations = word.symbols();
        let mut summary = LevelSummary {
            states,
            ..LevelSummary::default()
        };

        crate::log_event!(
            ctx,
            INFO,
            event_names::SEARCH_LEVEL_STARTED,
            Stage::Search,
            "searching level",
            states = states,
            restarts = self.config.hmm_searches
        );

        let mut writer = if self.config.verify {
            Some(self.store.create(word, states, size)?)
        } else {
            None
        };

        for restart in 0..self.config.hmm_searches {
            summary.restarts += 1;
            let layer = HiddenMarkovLayer::initialize(states, size, &mut self.rng)?;
            let mut model = HiddenMarkovModel::new(layer);
            let trained = model.train(observations, self.config.epochs)?;
            summary.stalled_epochs += trained.stalled;

            let mut check = check_witness(model.layer(), word, others, self.config.epsilon)?;
            let mut extra = 0;
            while !check.witnessed && extra < self.config.epoch_searches {
                let step = model.train(observations, 1)?;
                summary.stalled_epochs += step.stalled;
                extra += 1;
                check = check_witness(model.layer(), word, others, self.config.epsilon)?;
            }
            summary.extra_epochs += extra;

            crate::log_event!(
                ctx,
                DEBUG,
                event_names::TRAIN_RESTART_DONE,
                Stage::Train,
                "restart trained",
                states = states,
                restart = restart,
                score = check.score,
                best_competitor = check.best_competitor,
                witnessed = check.witnessed
            );

            if check.witnessed {
                if let Some(w) = writer.take() {
                    summary.stored = w.finish()?;
                }
                crate::log_event!(
                    ctx,
                    INFO,
                    event_names::SEARCH_WITNESS_FOUND,
                    Stage::Search,
                    "witness found",
                    states = states,
                    restart = restart,
                    score = check.score
                );
                let witness = Witness {
                    layer: model.into_layer(),
                    score: check.score,
                    best_competitor: check.best_competitor,
                };
                return Ok((summary, Some((witness, ComplexityRule::Search))));
            }

            if let Some(w) = writer.as_mut() {
                w.append(model.layer())?;
            }
        }

        if let Some(w) = writer.take() {
            summary.stored = w.finish()?;
        }
        crate::log_event!(
            ctx,
            INFO,
            event_names::SEARCH_LEVEL_EXHAUSTED,
            Stage::Search,
            "level exhausted without a witness",
            states = states,
            stalled_epochs = summary.stalled_epochs
        );

        if !self.config.verify {
            return Ok((summary, None));
        }

        let outcome = verify_complexity(
            &self.store,
            word,
            size,
            states,
            self.config.proportion,
            self.config.epsilon,
            &mut self.rng,
            ctx,
        )?;
        let witness = outcome.witness.as_ref().map(|found| {
            (
                Witness {
                    layer: found.layer.clone(),
                    score: found.score,
                    best_competitor: found.best_competitor,
                },
                ComplexityRule::Verification,
            )
        });
        summary.verification = Some(outcome);
        Ok((summary, witness))
    }
}

/// Search one word with a fresh search built from `config`.
pub fn compute_complexity(word: &str, config: &SearchConfig) -> Result<ComplexityReport, SearchError> {
    ComplexitySearch::new(config.clone())?.run(word)
}

/// Search every word of [`unique_words`]`(length, config.size)` in order.
pub fn compute_all_complexity(
    length: usize,
    config: &SearchConfig,
) -> Result<Vec<ComplexityReport>, SearchError> {
    let mut search = ComplexitySearch::new(config.clone())?;
    unique_words(length, config.size)
        .iter()
        .map(|word| search.run_word(word))
        .collect()
}
