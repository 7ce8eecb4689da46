//! # Impact probability estimation
//!
//! Reduces a set of sampled miss distances and a critical radius into a binomial proportion
//! estimate with its uncertainty.
//!
//! Statistics
//! -----------------
//! * **Point estimate** – `p = #{d_i < r_critical} / n` (strict inequality: a trial exactly on
//!   the radius is a miss).
//! * **Wilson score interval** at 95 % (`z = 1.96`):
//!
//!   ```text
//!   denom  = 1 + z²/n
//!   center = (p + z²/(2n)) / denom
//!   margin = z · sqrt(p(1-p)/n + z²/(4n²)) / denom
//!   [max(0, center - margin), min(1, center + margin)]
//!   ```
//!
//!   Impact probabilities are usually tiny, and the Wilson interval keeps a non-zero width
//!   at `p = 0` where the normal approximation collapses to a point.
//! * **Standard error** – normal-approximation `sqrt(p(1-p)/n)`, reported alongside.
//! * **Relative error** – `se / p`, or `+∞` when no impact was observed.
//!
//! A zero probability is a valid outcome ("no evidence of risk at this sample size"),
//! never an error.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    constants::{Kilometer, Probability, Z_95},
    impactor_errors::ImpactorError,
};

/// Two-sided confidence interval for a probability, both bounds in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: Probability,
    pub upper: Probability,
}

impl ConfidenceInterval {
    /// `true` if `p` lies inside the closed interval.
    pub fn contains(&self, p: Probability) -> bool {
        self.lower <= p && p <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl fmt::Display for ConfidenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.8}, {:.8}]", self.lower, self.upper)
    }
}

/// Point estimate and error statistics of one Monte Carlo run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactEstimate {
    pub probability: Probability,
    pub impact_count: usize,
    pub n_trials: usize,
    pub confidence_interval_95: ConfidenceInterval,
    pub standard_error: f64,
    /// `standard_error / probability`, `f64::INFINITY` when `probability == 0`.
    pub relative_error: f64,
}

impl ImpactEstimate {
    /// Build the statistics from an impact count.
    ///
    /// Arguments
    /// -----------------
    /// * `impact_count`: Number of trials inside the critical radius.
    /// * `n_trials`: Total number of trials, must be >= 1 and >= `impact_count`.
    ///
    /// Return
    /// ----------
    /// * The estimate, or [`ImpactorError::InvalidTrialCount`] when `n_trials == 0`.
    pub fn from_counts(impact_count: usize, n_trials: usize) -> Result<Self, ImpactorError> {
        if n_trials == 0 {
            return Err(ImpactorError::InvalidTrialCount(n_trials));
        }
        if impact_count > n_trials {
            return Err(ImpactorError::InvalidParameter(format!(
                "impact count {impact_count} exceeds trial count {n_trials}"
            )));
        }

        let probability = impact_count as f64 / n_trials as f64;
        let standard_error = binomial_standard_error(probability, n_trials);
        let relative_error = if probability > 0.0 {
            standard_error / probability
        } else {
            f64::INFINITY
        };

        Ok(ImpactEstimate {
            probability,
            impact_count,
            n_trials,
            confidence_interval_95: wilson_interval(probability, n_trials, Z_95),
            standard_error,
            relative_error,
        })
    }

    /// `true` when no trial hit: the relative error is undefined (infinite).
    pub fn is_degenerate(&self) -> bool {
        self.impact_count == 0
    }
}

/// Wilson score interval for a binomial proportion.
///
/// Arguments
/// -----------------
/// * `p`: Observed proportion in [0, 1].
/// * `n`: Sample size (>= 1; callers validate this).
/// * `z`: Normal quantile (1.96 for a two-sided 95 % interval).
///
/// Return
/// ----------
/// * The interval, clamped to [0, 1].
pub fn wilson_interval(p: Probability, n: usize, z: f64) -> ConfidenceInterval {
    let n = n as f64;
    let z2 = z * z;

    let denominator = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denominator;
    let margin = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denominator;

    // The interval always brackets p; min/max only absorb rounding at p = 0 or 1
    ConfidenceInterval {
        lower: (center - margin).max(0.0).min(p),
        upper: (center + margin).min(1.0).max(p),
    }
}

/// Normal-approximation binomial standard error `sqrt(p(1-p)/n)`.
pub fn binomial_standard_error(p: Probability, n: usize) -> f64 {
    (p * (1.0 - p) / n as f64).sqrt()
}

/// Count the trials strictly inside `r_critical` and compute the statistics.
///
/// Arguments
/// -----------------
/// * `sampled_distances`: Simulated miss distances (km).
/// * `r_critical`: Capture radius (km).
///
/// Return
/// ----------
/// * The [`ImpactEstimate`], or [`ImpactorError::InvalidTrialCount`] on an empty sample.
///
/// See also
/// ------------
/// * [`classify_impacts`] – Per-trial impact flags with the same comparison.
pub fn estimate(
    sampled_distances: &[Kilometer],
    r_critical: Kilometer,
) -> Result<ImpactEstimate, ImpactorError> {
    let impact_count = sampled_distances
        .iter()
        .filter(|d| **d < r_critical)
        .count();
    ImpactEstimate::from_counts(impact_count, sampled_distances.len())
}

/// Per-trial impact flags, parallel to `sampled_distances`.
pub fn classify_impacts(sampled_distances: &[Kilometer], r_critical: Kilometer) -> Vec<bool> {
    sampled_distances.iter().map(|d| *d < r_critical).collect()
}
