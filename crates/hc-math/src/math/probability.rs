//! Labeled probability vectors and row-stochastic matrices.
//!
//! These back the parameters of a hidden Markov layer:
//! - initial state distribution `π` is a [`ProbabilityVector`] over states
//! - transition matrix `T` is a [`ProbabilityMatrix`] (states × states)
//! - emission matrix `E` is a [`ProbabilityMatrix`] (states × symbols)
//!
//! Labels keep a fixed order for the lifetime of a value. Replacing values
//! assigns them positionally in that order (row-major for matrices).

use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use super::dirichlet::sample_flat;

/// Maximum allowed deviation of a distribution's sum from 1.
pub const NORMALIZATION_TOLERANCE: f64 = 1e-9;

/// Errors from constructing or updating probability containers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbabilityError {
    #[error("distribution has no labels")]
    Empty,

    #[error("expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("duplicate label '{0}'")]
    DuplicateLabel(String),

    #[error("invalid probability {value} for label '{label}'")]
    InvalidValue { label: String, value: f64 },

    #[error("probabilities sum to {sum}, expected 1")]
    NotNormalized { sum: f64 },

    #[error("row '{row}': {source}")]
    Row {
        row: String,
        #[source]
        source: Box<ProbabilityError>,
    },
}

/// Result alias for probability container operations.
pub type ProbabilityResult<T> = Result<T, ProbabilityError>;

/// Labels `"0".."n-1"`, the naming used for hidden states and alphabet symbols.
pub fn index_labels(n: usize) -> Vec<String> {
    (0..n).map(|i| i.to_string()).collect()
}

fn check_labels(labels: &[String]) -> ProbabilityResult<()> {
    if labels.is_empty() {
        return Err(ProbabilityError::Empty);
    }
    for (i, label) in labels.iter().enumerate() {
        if labels[..i].contains(label) {
            return Err(ProbabilityError::DuplicateLabel(label.clone()));
        }
    }
    Ok(())
}

fn check_distribution(labels: &[String], values: &[f64]) -> ProbabilityResult<()> {
    if values.len() != labels.len() {
        return Err(ProbabilityError::ShapeMismatch {
            expected: labels.len(),
            actual: values.len(),
        });
    }
    for (label, &value) in labels.iter().zip(values) {
        if !value.is_finite() || !(0.0..=1.0 + NORMALIZATION_TOLERANCE).contains(&value) {
            return Err(ProbabilityError::InvalidValue {
                label: label.clone(),
                value,
            });
        }
    }
    let sum: f64 = values.iter().sum();
    if (sum - 1.0).abs() > NORMALIZATION_TOLERANCE {
        return Err(ProbabilityError::NotNormalized { sum });
    }
    Ok(())
}

/// A normalized distribution over an ordered set of labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityVector {
    labels: Vec<String>,
    values: Vec<f64>,
}

impl ProbabilityVector {
    /// Build from explicit `label -> probability` pairs, in iteration order.
    pub fn new<L, I>(pairs: I) -> ProbabilityResult<Self>
    where
        L: Into<String>,
        I: IntoIterator<Item = (L, f64)>,
    {
        let (labels, values): (Vec<String>, Vec<f64>) =
            pairs.into_iter().map(|(l, v)| (l.into(), v)).unzip();
        Self::from_parts(labels, values)
    }

    /// Build from parallel label and value arrays.
    pub fn from_parts(labels: Vec<String>, values: Vec<f64>) -> ProbabilityResult<Self> {
        check_labels(&labels)?;
        check_distribution(&labels, &values)?;
        Ok(Self { labels, values })
    }

    /// Uniform distribution over `labels`.
    pub fn uniform(labels: Vec<String>) -> ProbabilityResult<Self> {
        check_labels(&labels)?;
        let p = 1.0 / labels.len() as f64;
        let values = vec![p; labels.len()];
        Ok(Self { labels, values })
    }

    /// Random distribution over `labels`, drawn uniformly from the simplex.
    ///
    /// All entries are strictly positive.
    pub fn random<R: Rng + ?Sized>(labels: Vec<String>, rng: &mut R) -> ProbabilityResult<Self> {
        check_labels(&labels)?;
        let values = sample_flat(labels.len(), rng);
        Ok(Self { labels, values })
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false for a constructed vector; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Position of `label`, if present.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Probability of `label`, if present.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.index_of(label).map(|i| self.values[i])
    }

    /// Probability at position `i`.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    pub fn at(&self, i: usize) -> f64 {
        self.values[i]
    }

    /// Sum of all values.
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Replace every value, keeping the current label order.
    ///
    /// The replacement must itself be a valid distribution; on error the
    /// vector is left untouched.
    pub fn replace_values(&mut self, values: Vec<f64>) -> ProbabilityResult<()> {
        check_distribution(&self.labels, &values)?;
        self.values = values;
        Ok(())
    }
}

/// A row-stochastic matrix with labeled rows and columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityMatrix {
    row_labels: Vec<String>,
    column_labels: Vec<String>,
    rows: Vec<ProbabilityVector>,
}

impl ProbabilityMatrix {
    /// Build from explicit row values (one inner vec per row label).
    pub fn new(
        row_labels: Vec<String>,
        column_labels: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> ProbabilityResult<Self> {
        check_labels(&row_labels)?;
        check_labels(&column_labels)?;
        let rows = Self::build_rows(&row_labels, &column_labels, values)?;
        Ok(Self {
            row_labels,
            column_labels,
            rows,
        })
    }

    /// Every row uniform over the columns.
    pub fn uniform(row_labels: Vec<String>, column_labels: Vec<String>) -> ProbabilityResult<Self> {
        check_labels(&row_labels)?;
        let rows = row_labels
            .iter()
            .map(|_| ProbabilityVector::uniform(column_labels.clone()))
            .collect::<ProbabilityResult<Vec<_>>>()?;
        Ok(Self {
            row_labels,
            column_labels,
            rows,
        })
    }

    /// Every row an independent random draw from the simplex.
    pub fn random<R: Rng + ?Sized>(
        row_labels: Vec<String>,
        column_labels: Vec<String>,
        rng: &mut R,
    ) -> ProbabilityResult<Self> {
        check_labels(&row_labels)?;
        let rows = row_labels
            .iter()
            .map(|_| ProbabilityVector::random(column_labels.clone(), rng))
            .collect::<ProbabilityResult<Vec<_>>>()?;
        Ok(Self {
            row_labels,
            column_labels,
            rows,
        })
    }

    fn build_rows(
        row_labels: &[String],
        column_labels: &[String],
        values: Vec<Vec<f64>>,
    ) -> ProbabilityResult<Vec<ProbabilityVector>> {
        if values.len() != row_labels.len() {
            return Err(ProbabilityError::ShapeMismatch {
                expected: row_labels.len(),
                actual: values.len(),
            });
        }
        row_labels
            .iter()
            .zip(values)
            .map(|(row, row_values)| {
                ProbabilityVector::from_parts(column_labels.to_vec(), row_values).map_err(|e| {
                    ProbabilityError::Row {
                        row: row.clone(),
                        source: Box::new(e),
                    }
                })
            })
            .collect()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.column_labels.len()
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn column_labels(&self) -> &[String] {
        &self.column_labels
    }

    pub fn rows(&self) -> &[ProbabilityVector] {
        &self.rows
    }

    /// Row at position `i`.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    pub fn row(&self, i: usize) -> &ProbabilityVector {
        &self.rows[i]
    }

    /// Entry by labels, if both exist.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.row_labels.iter().position(|l| l == row)?;
        self.rows[i].get(column)
    }

    /// Entry by position.
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.rows[i].at(j)
    }

    /// Copy of the values as nested rows.
    pub fn to_values(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.values().to_vec()).collect()
    }

    /// Replace every row at once, keeping label order.
    ///
    /// All rows are validated before any is assigned, so a failed replacement
    /// leaves the matrix untouched.
    pub fn replace_values(&mut self, values: Vec<Vec<f64>>) -> ProbabilityResult<()> {
        self.rows = Self::build_rows(&self.row_labels, &self.column_labels, values)?;
        Ok(())
    }
}
