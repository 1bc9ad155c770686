//! Re-scoring stored layers of an exhausted level.
//!
//! A sample of the layers that failed the witness test during the search is
//! read back from the record store and checked again. Finding a witness
//! among them means the level was decided too early.

use rand::seq::index::sample;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::hmm::{HiddenMarkovLayer, HmmError};
use crate::logging::{event_names, LogContext, Stage};
use crate::store::{RecordStore, StoreError};
use crate::witness::check_witness;
use crate::words::{competitors, Word};

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("proportion must be in [0, 1], got {0}")]
    InvalidProportion(f64),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hmm(#[from] HmmError),
}

/// A stored layer that passed the witness test on re-scoring.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedWitness {
    /// Position of the record in the store.
    pub record: usize,
    pub layer: HiddenMarkovLayer,
    pub score: f64,
    pub best_competitor: f64,
}

/// Result of verifying one level.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub complexity: usize,
    pub total_records: usize,
    pub sampled: usize,
    /// Records scored before stopping.
    pub checked: usize,
    pub witness: Option<VerifiedWitness>,
}

impl VerificationOutcome {
    /// 1 when a stored layer witnesses the word, 0 otherwise.
    pub fn value(&self) -> u8 {
        u8::from(self.witness.is_some())
    }
}

/// Sample `floor(proportion · records)` stored layers without replacement
/// and stop at the first that witnesses `word`.
#[allow(clippy::too_many_arguments)]
pub fn verify_complexity<R: Rng + ?Sized>(
    store: &RecordStore,
    word: &Word,
    size: usize,
    complexity: usize,
    proportion: f64,
    epsilon: f64,
    rng: &mut R,
    ctx: &LogContext,
) -> Result<VerificationOutcome, VerifyError> {
    if !(0.0..=1.0).contains(&proportion) {
        return Err(VerifyError::InvalidProportion(proportion));
    }
    let records = store.read(word, complexity, size)?;
    let total = records.len();
    let amount = ((proportion * total as f64).floor() as usize).min(total);

    crate::log_event!(
        ctx,
        INFO,
        event_names::VERIFY_STARTED,
        Stage::Verify,
        "verifying exhausted level",
        complexity = complexity,
        total = total,
        sampled = amount
    );

    let others = competitors(word, size);
    let mut checked = 0;
    let mut witness = None;
    for index in sample(rng, total, amount) {
        checked += 1;
        let layer = records[index]
            .to_layer()
            .map_err(|source| StoreError::InvalidLayer {
                path: store.path_for(word, complexity, size),
                index,
                source,
            })?;
        let check = check_witness(&layer, word, &others, epsilon)?;
        if check.witnessed {
            crate::log_event!(
                ctx,
                INFO,
                event_names::VERIFY_HIT,
                Stage::Verify,
                "stored layer witnesses the word",
                complexity = complexity,
                record = index,
                score = check.score
            );
            witness = Some(VerifiedWitness {
                record: index,
                layer,
                score: check.score,
                best_competitor: check.best_competitor,
            });
            break;
        }
    }

    let outcome = VerificationOutcome {
        complexity,
        total_records: total,
        sampled: amount,
        checked,
        witness,
    };
    crate::log_event!(
        ctx,
        INFO,
        event_names::VERIFY_FINISHED,
        Stage::Verify,
        "verification finished",
        complexity = complexity,
        value = outcome.value(),
        checked = checked
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::witness::construct_0n1_witness;
    use hc_config::RecordFormat;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn ctx() -> LogContext {
        LogContext::new("run-test")
    }

    fn uniform(states: usize) -> HiddenMarkovLayer {
        let p = 1.0 / states as f64;
        HiddenMarkovLayer::from_values(
            vec![vec![p; states]; states],
            vec![vec![0.5, 0.5]; states],
            vec![p; states],
        )
        .unwrap()
    }

    #[test]
    fn finds_stored_witness() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path(), RecordFormat::Jsonl);
        let word = Word::parse("01", 2).unwrap();
        let witness = HiddenMarkovLayer::from_values(
            vec![vec![0.0, 1.0], vec![0.0, 1.0]],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![1.0, 0.0],
        )
        .unwrap();

        let mut writer = store.create(&word, 2, 2).unwrap();
        writer.append(&uniform(2)).unwrap();
        writer.append(&witness).unwrap();
        writer.finish().unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        let outcome =
            verify_complexity(&store, &word, 2, 2, 1.0, 0.0, &mut rng, &ctx()).unwrap();
        assert_eq!(outcome.value(), 1);
        assert_eq!(outcome.total_records, 2);
        assert_eq!(outcome.sampled, 2);
        let found = outcome.witness.unwrap();
        assert_eq!(found.record, 1);
        assert_eq!(found.layer, witness);
    }

    #[test]
    fn no_witness_gives_zero() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path(), RecordFormat::Padded);
        let word = Word::parse("001", 2).unwrap();
        let mut writer = store.create(&word, 2, 2).unwrap();
        for _ in 0..4 {
            writer.append(&uniform(2)).unwrap();
        }
        writer.finish().unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let outcome =
            verify_complexity(&store, &word, 2, 2, 0.5, 0.0, &mut rng, &ctx()).unwrap();
        assert_eq!(outcome.value(), 0);
        assert_eq!(outcome.sampled, 2);
        assert_eq!(outcome.checked, 2);
    }

    #[test]
    fn zero_proportion_samples_nothing() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path(), RecordFormat::Jsonl);
        let word = Word::parse("001", 2).unwrap();
        let mut writer = store.create(&word, 2, 2).unwrap();
        writer.append(&construct_0n1_witness(2).unwrap()).unwrap();
        writer.finish().unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let outcome =
            verify_complexity(&store, &word, 2, 2, 0.0, 0.0, &mut rng, &ctx()).unwrap();
        assert_eq!(outcome.sampled, 0);
        assert_eq!(outcome.value(), 0);
    }

    #[test]
    fn missing_store_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path(), RecordFormat::Jsonl);
        let word = Word::parse("01", 2).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let err = verify_complexity(&store, &word, 2, 3, 0.5, 0.0, &mut rng, &ctx()).unwrap_err();
        assert!(matches!(err, VerifyError::Store(StoreError::NotFound { .. })));
    }

    #[test]
    fn bad_proportion_rejected() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path(), RecordFormat::Jsonl);
        let word = Word::parse("01", 2).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            verify_complexity(&store, &word, 2, 2, 1.5, 0.0, &mut rng, &ctx()),
            Err(VerifyError::InvalidProportion(_))
        ));
    }
}
