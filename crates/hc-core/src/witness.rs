//! The witness test and a hand-built witness for `0^n 1`.

use hc_math::approx_eq;
use serde::Serialize;

use crate::hmm::{HiddenMarkovLayer, HmmError};
use crate::words::{all_words, Word};

/// Scores behind one witness decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WitnessCheck {
    /// Likelihood of the target word.
    pub score: f64,
    /// Highest likelihood among competitors (`-inf` when there are none).
    pub best_competitor: f64,
    pub witnessed: bool,
}

/// Test `score(word) > max(competitor scores) - epsilon` under `layer`.
///
/// The comparison is strict; with `epsilon = 0` a tie is not a witness.
pub fn check_witness(
    layer: &HiddenMarkovLayer,
    word: &Word,
    competitors: &[Word],
    epsilon: f64,
) -> Result<WitnessCheck, HmmError> {
    let score = layer.score_word(word)?;
    let mut best_competitor = f64::NEG_INFINITY;
    for other in competitors {
        best_competitor = best_competitor.max(layer.score_word(other)?);
    }
    Ok(WitnessCheck {
        score,
        best_competitor,
        witnessed: score > best_competitor - epsilon,
    })
}

/// The `n`-state layer over `{0, 1}` built for the word `0^n 1`.
///
/// States `0..n-1` form a chain that emits `0`; each advances with
/// probability `n/(n+1)`. The last state absorbs and emits `1` with
/// probability `n/(n+1)`.
pub fn construct_0n1_witness(n: usize) -> Result<HiddenMarkovLayer, HmmError> {
    if n == 0 {
        return Err(HmmError::NoStates);
    }
    let stay = 1.0 / (n as f64 + 1.0);
    let advance = n as f64 / (n as f64 + 1.0);

    let mut transition = vec![vec![0.0; n]; n];
    let mut emission = vec![vec![0.0; 2]; n];
    for i in 0..n - 1 {
        transition[i][i] = stay;
        transition[i][i + 1] = advance;
        emission[i][0] = 1.0;
    }
    transition[n - 1][n - 1] = 1.0;
    emission[n - 1][0] = stay;
    emission[n - 1][1] = advance;

    let mut initial = vec![0.0; n];
    initial[0] = 1.0;

    HiddenMarkovLayer::from_values(transition, emission, initial)
}

/// Relative gap below which two table scores count as tied.
const TIE_TOLERANCE: f64 = 1e-12;

/// Likelihood of every binary word of one length under a fixed layer.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreTable {
    pub scores: Vec<(Word, f64)>,
    /// First word in enumeration order among those with the top score.
    pub best: Word,
    pub best_score: f64,
}

/// Score every binary word of `length` under the `0^n 1` witness with `states` states.
pub fn witness_score_table(length: usize, states: usize) -> Result<ScoreTable, HmmError> {
    let layer = construct_0n1_witness(states)?;
    let mut scores = Vec::new();
    for word in all_words(length, 2) {
        let score = layer.score_word(&word)?;
        scores.push((word, score));
    }

    let mut best = Word::empty();
    let mut best_score = f64::NEG_INFINITY;
    for (word, score) in &scores {
        let first = best_score == f64::NEG_INFINITY;
        if first || (*score > best_score && !approx_eq(*score, best_score, TIE_TOLERANCE)) {
            best = word.clone();
            best_score = *score;
        }
    }
    Ok(ScoreTable {
        scores,
        best,
        best_score,
    })
}
