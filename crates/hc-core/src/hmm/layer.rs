//! One set of HMM parameters with forward-backward scoring and re-estimation.
//!
//! Notation, for a layer with `n` states over `m` symbols and an observation
//! sequence `o_1..o_L`:
//! - `T[s][s']`: probability of moving from state `s` to `s'`
//! - `E[s][o]`: probability of emitting symbol `o` in state `s`
//! - `π[s]`: probability of starting in state `s`
//!
//! Forward: `α_1(s) = π(s)·E(s,o_1)`, `α_t(s) = E(s,o_t)·Σ_{s'} α_{t-1}(s')·T(s',s)`.
//! Backward: `β_L(s) = 1`, `β_t(s) = Σ_{s'} T(s,s')·E(s',o_{t+1})·β_{t+1}(s')`.

use hc_math::{index_labels, ln_prob, log_sum_exp, ProbabilityMatrix, ProbabilityVector};
use rand::Rng;
use serde::Serialize;
use tracing::trace;

use super::HmmError;
use crate::words::Word;

/// Outcome of one Baum-Welch step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmStep {
    /// Parameters replaced; `likelihood` is the score before the update.
    Updated { likelihood: f64 },
    /// The sequence had zero likelihood; parameters left as they were.
    Stalled,
}

/// Transition, emission and initial distributions of one HMM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HiddenMarkovLayer {
    transition: ProbabilityMatrix,
    emission: ProbabilityMatrix,
    initial: ProbabilityVector,
}

impl HiddenMarkovLayer {
    /// Assemble a layer, checking that all three share the same state labels.
    pub fn new(
        transition: ProbabilityMatrix,
        emission: ProbabilityMatrix,
        initial: ProbabilityVector,
    ) -> Result<Self, HmmError> {
        let states = transition.row_labels();
        if transition.n_cols() != transition.n_rows() {
            return Err(HmmError::DimensionMismatch {
                what: "transition columns",
                expected: transition.n_rows(),
                actual: transition.n_cols(),
            });
        }
        if transition.column_labels() != states {
            return Err(HmmError::LabelMismatch { what: "transition column" });
        }
        if emission.n_rows() != transition.n_rows() {
            return Err(HmmError::DimensionMismatch {
                what: "emission rows",
                expected: transition.n_rows(),
                actual: emission.n_rows(),
            });
        }
        if emission.row_labels() != states {
            return Err(HmmError::LabelMismatch { what: "emission row" });
        }
        if initial.len() != transition.n_rows() {
            return Err(HmmError::DimensionMismatch {
                what: "initial distribution",
                expected: transition.n_rows(),
                actual: initial.len(),
            });
        }
        if initial.labels() != states {
            return Err(HmmError::LabelMismatch { what: "initial" });
        }
        Ok(Self {
            transition,
            emission,
            initial,
        })
    }

    /// Layer from raw nested values, labelled `"0".."n-1"` and `"0".."m-1"`.
    pub fn from_values(
        transition: Vec<Vec<f64>>,
        emission: Vec<Vec<f64>>,
        initial: Vec<f64>,
    ) -> Result<Self, HmmError> {
        let states = transition.len();
        if states == 0 {
            return Err(HmmError::NoStates);
        }
        if emission.len() != states {
            return Err(HmmError::DimensionMismatch {
                what: "emission rows",
                expected: states,
                actual: emission.len(),
            });
        }
        if initial.len() != states {
            return Err(HmmError::DimensionMismatch {
                what: "initial distribution",
                expected: states,
                actual: initial.len(),
            });
        }
        let symbols = emission.first().map_or(0, Vec::len);
        let state_labels = index_labels(states);
        Self::new(
            ProbabilityMatrix::new(state_labels.clone(), state_labels.clone(), transition)?,
            ProbabilityMatrix::new(state_labels.clone(), index_labels(symbols), emission)?,
            ProbabilityVector::from_parts(state_labels, initial)?,
        )
    }

    /// Random layer: every row of `T`, `E` and `π` drawn uniformly from its simplex.
    pub fn initialize<R: Rng + ?Sized>(
        states: usize,
        symbols: usize,
        rng: &mut R,
    ) -> Result<Self, HmmError> {
        if states == 0 {
            return Err(HmmError::NoStates);
        }
        let state_labels = index_labels(states);
        let transition = ProbabilityMatrix::random(state_labels.clone(), state_labels.clone(), rng)?;
        let emission = ProbabilityMatrix::random(state_labels.clone(), index_labels(symbols), rng)?;
        let initial = ProbabilityVector::random(state_labels, rng)?;
        Ok(Self {
            transition,
            emission,
            initial,
        })
    }

    pub fn n_states(&self) -> usize {
        self.transition.n_rows()
    }

    pub fn n_symbols(&self) -> usize {
        self.emission.n_cols()
    }

    pub fn transition(&self) -> &ProbabilityMatrix {
        &self.transition
    }

    pub fn emission(&self) -> &ProbabilityMatrix {
        &self.emission
    }

    pub fn initial(&self) -> &ProbabilityVector {
        &self.initial
    }

    fn check_symbols(&self, observations: &[usize]) -> Result<(), HmmError> {
        let symbols = self.n_symbols();
        match observations.iter().find(|&&o| o >= symbols) {
            Some(&symbol) => Err(HmmError::SymbolOutOfRange { symbol, symbols }),
            None => Ok(()),
        }
    }

    /// Likelihood of `observations`; the empty sequence scores 1.
    pub fn score(&self, observations: &[usize]) -> Result<f64, HmmError> {
        self.check_symbols(observations)?;
        if observations.is_empty() {
            return Ok(1.0);
        }
        let alpha = self.forward(observations);
        Ok(alpha.last().map_or(1.0, |a| a.iter().sum()))
    }

    pub fn score_word(&self, word: &Word) -> Result<f64, HmmError> {
        self.score(word.symbols())
    }

    /// Natural log of [`score`](Self::score), computed without underflow.
    ///
    /// Zero likelihood gives `-inf`.
    pub fn log_score(&self, observations: &[usize]) -> Result<f64, HmmError> {
        self.check_symbols(observations)?;
        let Some((&first, rest)) = observations.split_first() else {
            return Ok(0.0);
        };
        let n = self.n_states();
        let ln_t: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| ln_prob(self.transition.at(i, j))).collect())
            .collect();

        let mut log_alpha: Vec<f64> = (0..n)
            .map(|s| ln_prob(self.initial.at(s)) + ln_prob(self.emission.at(s, first)))
            .collect();
        let mut terms = vec![0.0; n];
        for &o in rest {
            log_alpha = (0..n)
                .map(|s| {
                    for (prev, term) in terms.iter_mut().enumerate() {
                        *term = log_alpha[prev] + ln_t[prev][s];
                    }
                    ln_prob(self.emission.at(s, o)) + log_sum_exp(&terms)
                })
                .collect();
        }
        Ok(log_sum_exp(&log_alpha))
    }

    /// Forward variables `α_t(s)` for every step.
    fn forward(&self, observations: &[usize]) -> Vec<Vec<f64>> {
        let n = self.n_states();
        let mut alpha = Vec::with_capacity(observations.len());
        let Some((&first, rest)) = observations.split_first() else {
            return alpha;
        };
        alpha.push(
            (0..n)
                .map(|s| self.initial.at(s) * self.emission.at(s, first))
                .collect::<Vec<f64>>(),
        );
        for &o in rest {
            let prev = &alpha[alpha.len() - 1];
            let next: Vec<f64> = (0..n)
                .map(|s| {
                    let into: f64 = (0..n).map(|p| prev[p] * self.transition.at(p, s)).sum();
                    self.emission.at(s, o) * into
                })
                .collect();
            alpha.push(next);
        }
        alpha
    }

    /// Backward variables `β_t(s)` for every step.
    fn backward(&self, observations: &[usize]) -> Vec<Vec<f64>> {
        let n = self.n_states();
        let len = observations.len();
        let mut beta = vec![vec![1.0; n]; len];
        for t in (0..len.saturating_sub(1)).rev() {
            let o_next = observations[t + 1];
            for s in 0..n {
                beta[t][s] = (0..n)
                    .map(|s2| self.transition.at(s, s2) * self.emission.at(s2, o_next) * beta[t + 1][s2])
                    .sum();
            }
        }
        beta
    }

    /// One Baum-Welch step on `observations`.
    ///
    /// New `π`, `T` and `E` are computed from the current parameters and
    /// swapped in together. A state with zero expected occupancy keeps its old
    /// rows; a sequence with zero likelihood leaves the layer unchanged and
    /// returns [`EmStep::Stalled`].
    pub fn reestimate(&mut self, observations: &[usize]) -> Result<EmStep, HmmError> {
        if observations.is_empty() {
            return Err(HmmError::EmptySequence);
        }
        self.check_symbols(observations)?;

        let n = self.n_states();
        let m = self.n_symbols();
        let len = observations.len();
        let alpha = self.forward(observations);
        let beta = self.backward(observations);

        let likelihood: f64 = alpha[len - 1].iter().sum();
        if !(likelihood > 0.0 && likelihood.is_finite()) {
            trace!(likelihood, "zero-likelihood sequence, step skipped");
            return Ok(EmStep::Stalled);
        }

        let mut initial = vec![0.0; n];
        let mut xi_sum = vec![vec![0.0; n]; n];
        let mut emit_sum = vec![vec![0.0; m]; n];

        for t in 0..len {
            let weights: Vec<f64> = (0..n).map(|s| alpha[t][s] * beta[t][s]).collect();
            let norm: f64 = weights.iter().sum();
            if norm <= 0.0 {
                continue;
            }
            for s in 0..n {
                let gamma = weights[s] / norm;
                if t == 0 {
                    initial[s] = gamma;
                }
                emit_sum[s][observations[t]] += gamma;
            }

            if t + 1 < len {
                let o_next = observations[t + 1];
                let mut xi = vec![vec![0.0; n]; n];
                let mut xi_norm = 0.0;
                for s in 0..n {
                    for s2 in 0..n {
                        let v = alpha[t][s]
                            * self.transition.at(s, s2)
                            * self.emission.at(s2, o_next)
                            * beta[t + 1][s2];
                        xi[s][s2] = v;
                        xi_norm += v;
                    }
                }
                if xi_norm > 0.0 {
                    for s in 0..n {
                        for s2 in 0..n {
                            xi_sum[s][s2] += xi[s][s2] / xi_norm;
                        }
                    }
                }
            }
        }

        // Σ_{s'} ξ_t(s,s') = γ_t(s), so dividing each row by its own total is
        // the ratio of expected counts.
        let transition = normalize_rows(xi_sum, &self.transition.to_values());
        let emission = normalize_rows(emit_sum, &self.emission.to_values());
        let initial = normalize_row(initial).unwrap_or_else(|| self.initial.values().to_vec());

        let mut next_t = self.transition.clone();
        let mut next_e = self.emission.clone();
        let mut next_pi = self.initial.clone();
        next_t.replace_values(transition)?;
        next_e.replace_values(emission)?;
        next_pi.replace_values(initial)?;

        self.transition = next_t;
        self.emission = next_e;
        self.initial = next_pi;
        Ok(EmStep::Updated { likelihood })
    }
}

fn normalize_row(mut row: Vec<f64>) -> Option<Vec<f64>> {
    let total: f64 = row.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return None;
    }
    for v in &mut row {
        *v /= total;
    }
    Some(row)
}

fn normalize_rows(counts: Vec<Vec<f64>>, previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
    counts
        .into_iter()
        .zip(previous)
        .map(|(row, old)| normalize_row(row).unwrap_or_else(|| old.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_state() -> HiddenMarkovLayer {
        HiddenMarkovLayer::from_values(
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![vec![0.9, 0.1], vec![0.2, 0.8]],
            vec![0.6, 0.4],
        )
        .unwrap()
    }

    fn assert_valid(layer: &HiddenMarkovLayer) {
        for row in layer.transition().rows().iter().chain(layer.emission().rows()) {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.values().iter().all(|v| v.is_finite() && *v >= 0.0));
        }
        assert!((layer.initial().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn score_matches_hand_computation() {
        let layer = two_state();
        // α1 = [0.6*0.9, 0.4*0.2] = [0.54, 0.08]
        // α2(0) = 0.1 * (0.54*0.7 + 0.08*0.4) = 0.041
        // α2(1) = 0.8 * (0.54*0.3 + 0.08*0.6) = 0.168
        let score = layer.score(&[0, 1]).unwrap();
        assert!((score - 0.209).abs() < 1e-12);
    }

    #[test]
    fn empty_sequence_scores_one() {
        let layer = two_state();
        assert_eq!(layer.score(&[]).unwrap(), 1.0);
        assert_eq!(layer.log_score(&[]).unwrap(), 0.0);
    }

    #[test]
    fn scores_over_all_words_sum_to_one() {
        let layer = two_state();
        let total: f64 = crate::words::all_words(4, 2)
            .iter()
            .map(|w| layer.score_word(w).unwrap())
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn log_score_agrees_with_score() {
        let layer = two_state();
        let obs = [0, 1, 1, 0, 1];
        let p = layer.score(&obs).unwrap();
        let lp = layer.log_score(&obs).unwrap();
        assert!((lp - p.ln()).abs() < 1e-10);
    }

    #[test]
    fn out_of_range_symbol_rejected() {
        let layer = two_state();
        assert_eq!(
            layer.score(&[0, 2]),
            Err(HmmError::SymbolOutOfRange { symbol: 2, symbols: 2 })
        );
    }

    #[test]
    fn mismatched_shapes_rejected() {
        let err = HiddenMarkovLayer::from_values(
            vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![vec![1.0]],
            vec![0.5, 0.5],
        )
        .unwrap_err();
        assert_eq!(
            err,
            HmmError::DimensionMismatch {
                what: "emission rows",
                expected: 2,
                actual: 1,
            }
        );
        let err = HiddenMarkovLayer::from_values(
            vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![1.0],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            HmmError::DimensionMismatch { what: "initial distribution", .. }
        ));
        assert_eq!(
            HiddenMarkovLayer::from_values(vec![], vec![], vec![]),
            Err(HmmError::NoStates)
        );
    }

    #[test]
    fn reestimate_keeps_distributions_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut layer = HiddenMarkovLayer::initialize(3, 2, &mut rng).unwrap();
        for _ in 0..20 {
            layer.reestimate(&[0, 1, 1, 0]).unwrap();
            assert_valid(&layer);
        }
    }

    #[test]
    fn reestimate_does_not_decrease_likelihood() {
        let mut layer = two_state();
        let obs = [0, 1, 0, 0, 1];
        let mut last = layer.score(&obs).unwrap();
        for _ in 0..30 {
            layer.reestimate(&obs).unwrap();
            let next = layer.score(&obs).unwrap();
            assert!(next >= last - 1e-12, "{next} < {last}");
            last = next;
        }
    }

    #[test]
    fn zero_likelihood_stalls_without_change() {
        // State 0 only emits 0 and never leaves; "1" is impossible.
        let mut layer = HiddenMarkovLayer::from_values(
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![1.0, 0.0],
        )
        .unwrap();
        let before = layer.clone();
        assert_eq!(layer.reestimate(&[1]).unwrap(), EmStep::Stalled);
        assert_eq!(layer, before);
    }

    #[test]
    fn unvisited_state_keeps_rows() {
        let mut layer = HiddenMarkovLayer::from_values(
            vec![vec![1.0, 0.0], vec![0.3, 0.7]],
            vec![vec![0.5, 0.5], vec![0.1, 0.9]],
            vec![1.0, 0.0],
        )
        .unwrap();
        assert!(matches!(
            layer.reestimate(&[0, 1, 0]).unwrap(),
            EmStep::Updated { .. }
        ));
        assert_eq!(layer.transition().row(1).values(), &[0.3, 0.7]);
        assert_eq!(layer.emission().row(1).values(), &[0.1, 0.9]);
        assert_valid(&layer);
    }

    #[test]
    fn single_symbol_sequence_reestimates() {
        let mut layer = two_state();
        assert!(matches!(
            layer.reestimate(&[1]).unwrap(),
            EmStep::Updated { .. }
        ));
        // Transition rows have no counts with L = 1 and are kept.
        assert_eq!(layer.transition().row(0).values(), &[0.7, 0.3]);
        assert_valid(&layer);
    }

    #[test]
    fn empty_sequence_cannot_be_reestimated() {
        let mut layer = two_state();
        assert_eq!(layer.reestimate(&[]), Err(HmmError::EmptySequence));
    }
}
