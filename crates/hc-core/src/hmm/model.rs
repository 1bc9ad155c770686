//! Training wrapper around a single layer.

use serde::Serialize;
use super::{EmStep, HiddenMarkovLayer, HmmError};
use crate::logging::{event_names, Stage};

/// What a call to [`HiddenMarkovModel::train`] did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingSummary {
    /// Re-estimation steps run (always the requested count).
    pub epochs: usize,
    /// Steps skipped because the sequence had zero likelihood.
    pub stalled: usize,
    /// Likelihood of the sequence after the last step.
    pub score: f64,
}

/// Owns one layer and trains it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenMarkovModel {
    layer: HiddenMarkovLayer,
    epochs_run: usize,
}

impl HiddenMarkovModel {
    pub fn new(layer: HiddenMarkovLayer) -> Self {
        Self {
            layer,
            epochs_run: 0,
        }
    }

    pub fn layer(&self) -> &HiddenMarkovLayer {
        &self.layer
    }

    pub fn into_layer(self) -> HiddenMarkovLayer {
        self.layer
    }

    /// Total epochs over every `train` call so far.
    pub fn epochs_run(&self) -> usize {
        self.epochs_run
    }

    /// Run exactly `epochs` Baum-Welch steps on `observations`.
    ///
    /// There is no convergence check; repeated calls continue from the
    /// current parameters.
    pub fn train(&mut self, observations: &[usize], epochs: usize) -> Result<TrainingSummary, HmmError> {
        let mut stalled = 0;
        for _ in 0..epochs {
            if self.layer.reestimate(observations)? == EmStep::Stalled {
                stalled += 1;
            }
        }
        self.epochs_run += epochs;
        if stalled > 0 {
            tracing::debug!(
                event = event_names::TRAIN_STALLED,
                stage = %Stage::Train,
                stalled,
                epochs,
                "training stalled on zero-likelihood sequence"
            );
        }
        Ok(TrainingSummary {
            epochs,
            stalled,
            score: self.layer.score(observations)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn dead_layer() -> HiddenMarkovLayer {
        HiddenMarkovLayer::from_values(vec![vec![1.0]], vec![vec![1.0, 0.0]], vec![1.0]).unwrap()
    }

    #[test]
    fn epochs_accumulate() {
        let mut rng = StdRng::seed_from_u64(1);
        let layer = HiddenMarkovLayer::initialize(2, 2, &mut rng).unwrap();
        let mut model = HiddenMarkovModel::new(layer);
        let first = model.train(&[0, 1], 5).unwrap();
        let second = model.train(&[0, 1], 3).unwrap();
        assert_eq!(first.epochs, 5);
        assert_eq!(second.epochs, 3);
        assert_eq!(model.epochs_run(), 8);
        assert!(second.score >= first.score - 1e-12);
    }

    #[test]
    fn zero_epochs_leaves_layer_untouched() {
        let mut rng = StdRng::seed_from_u64(2);
        let layer = HiddenMarkovLayer::initialize(3, 2, &mut rng).unwrap();
        let mut model = HiddenMarkovModel::new(layer.clone());
        let summary = model.train(&[1, 0, 1], 0).unwrap();
        assert_eq!(summary.epochs, 0);
        assert_eq!(model.layer(), &layer);
        assert_eq!(summary.score, layer.score(&[1, 0, 1]).unwrap());
    }

    #[test]
    fn stalled_epochs_are_counted() {
        let mut model = HiddenMarkovModel::new(dead_layer());
        let summary = model.train(&[1, 1], 4).unwrap();
        assert_eq!(summary.stalled, 4);
        assert_eq!(summary.score, 0.0);
    }

    #[test]
    fn stall_emits_train_event() {
        let buffer = Captured::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut model = HiddenMarkovModel::new(dead_layer());
            model.train(&[1], 2).unwrap();
        });

        let output = buffer.0.lock().unwrap();
        let text = String::from_utf8_lossy(&output);
        assert!(text.contains("\"event\":\"train.stalled\""), "{}", text);
        assert!(text.contains("\"stage\":\"train\""), "{}", text);
        assert!(text.contains("\"stalled\":2"), "{}", text);
    }

    #[test]
    fn healthy_training_is_quiet() {
        let buffer = Captured::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut rng = StdRng::seed_from_u64(4);
            let layer = HiddenMarkovLayer::initialize(2, 2, &mut rng).unwrap();
            HiddenMarkovModel::new(layer).train(&[0, 1], 3).unwrap();
        });

        let output = buffer.0.lock().unwrap();
        assert!(!String::from_utf8_lossy(&output).contains("train.stalled"));
    }
}
