//! Flat Dirichlet sampling for random HMM initialization.
//!
//! A draw from `Dirichlet(1, ..., 1)` is uniform over the probability simplex.
//! It is generated by normalizing independent `Exp(1)` variates:
//! - `x_i = -ln(U_i)` with `U_i ~ Uniform(0, 1]`
//! - `p_i = x_i / Σ_j x_j`

use rand::Rng;

/// Smallest value an exponential draw may take, so every component stays positive.
const MIN_DRAW: f64 = f64::MIN_POSITIVE;

/// Draw one point uniformly from the (k-1)-simplex.
///
/// Every component is strictly positive and the components sum to 1.
/// Returns an empty vector for `k == 0`.
pub fn sample_flat<R: Rng + ?Sized>(k: usize, rng: &mut R) -> Vec<f64> {
    if k == 0 {
        return Vec::new();
    }
    let draws: Vec<f64> = (0..k)
        .map(|_| {
            let u: f64 = rng.random();
            (-(1.0 - u).ln()).max(MIN_DRAW)
        })
        .collect();
    let total: f64 = draws.iter().sum();
    draws.into_iter().map(|x| x / total).collect()
}
