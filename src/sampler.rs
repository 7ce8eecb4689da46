//! # Miss-distance sampling
//!
//! Draws simulated miss distances from a Gaussian centred on the nominal miss distance.
//! The random source is always passed in explicitly, so a seeded
//! [`StdRng`](rand::rngs::StdRng) gives bit-identical trials across runs.
//!
//! Draws are **not** truncated at zero. With a large sigma some trials come out negative;
//! those still count as impacts (they are below any positive critical radius), which keeps
//! the lower tail mass of the distribution in the estimate.
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::{constants::Kilometer, impactor_errors::ImpactorError};

/// Draw `n_trials` i.i.d. miss distances from `Normal(miss_distance_km, sigma_km)`.
///
/// Arguments
/// -----------------
/// * `rng`: Random source; each call advances it by `n_trials` normal draws.
/// * `miss_distance_km`: Nominal miss distance (mean of the distribution).
/// * `sigma_km`: Standard deviation (km), must be finite and >= 0.
/// * `n_trials`: Number of trials, must be >= 1.
///
/// Return
/// ----------
/// * The sampled distances, in draw order.
///
/// Errors
/// ----------
/// * [`ImpactorError::InvalidTrialCount`] when `n_trials == 0`.
/// * [`ImpactorError::NonFiniteInput`] when the mean or sigma is NaN or infinite.
/// * [`ImpactorError::InvalidSigma`] when sigma is negative (negative miss distance).
pub fn sample_miss_distances(
    rng: &mut impl Rng,
    miss_distance_km: Kilometer,
    sigma_km: Kilometer,
    n_trials: usize,
) -> Result<Vec<Kilometer>, ImpactorError> {
    if n_trials == 0 {
        return Err(ImpactorError::InvalidTrialCount(n_trials));
    }
    for (field, value) in [("miss_distance_km", miss_distance_km), ("sigma_km", sigma_km)] {
        if !value.is_finite() {
            return Err(ImpactorError::NonFiniteInput { field, value });
        }
    }
    // Normal::new accepts a negative std_dev and mirrors the draws
    if sigma_km < 0.0 {
        return Err(ImpactorError::InvalidSigma(sigma_km));
    }
    let normal = Normal::new(miss_distance_km, sigma_km)?;
    Ok(normal.sample_iter(rng).take(n_trials).collect())
}
