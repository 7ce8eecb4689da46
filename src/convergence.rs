//! # Monte Carlo convergence analysis
//!
//! Characterizes how the impact-probability estimate stabilizes as the number of trials
//! grows. Every trial size is an **independent, from-scratch** simulation: no samples are
//! reused between sizes, so each point of the curve is statistically independent of the
//! others. Estimates are therefore not expected to be monotonic in value, only to tighten
//! around the large-sample estimate.
//!
//! The stability criterion follows the usual reading of a convergence curve: each
//! estimate is compared with the estimate at the **largest** trial size, as an absolute
//! percentage deviation.
//!
//! ```text
//! deviation(n) = |p(n) - p(n_max)| / p(n_max) × 100
//! ```
//!
//! Two entry points exist:
//!
//! * [`analyze_convergence`] – sequential, draws every run from one caller-provided `Rng`.
//! * [`analyze_convergence_parallel`] – runs the sizes on the `rayon` pool; each run gets
//!   its own `StdRng` derived from a base seed and the point index, so parallel branches
//!   never share a random stream.
use std::fmt;

use itertools::Itertools;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    constants::Probability, impactor::Impactor, impactor_errors::ImpactorError,
    simulation::SimulationInput,
};

/// One point of the convergence curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePoint {
    pub n_trials: usize,
    pub probability: Probability,
}

/// Ordered convergence curve, one point per requested trial size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    pub points: Vec<ConvergencePoint>,
}

impl ConvergenceReport {
    /// Estimate at the last trial size (the reference of the deviations).
    pub fn final_probability(&self) -> Option<Probability> {
        self.points.last().map(|p| p.probability)
    }

    /// Absolute percentage deviation of every point from the final estimate.
    ///
    /// Return
    /// ----------
    /// * One entry per point; `None` for every entry when the final estimate is zero
    ///   (the relative deviation is undefined).
    pub fn percent_deviations(&self) -> Vec<Option<f64>> {
        let final_p = self.final_probability().unwrap_or(0.0);
        self.points
            .iter()
            .map(|p| {
                if final_p > 0.0 {
                    Some(((p.probability - final_p) / final_p).abs() * 100.0)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Smallest trial size from which every later deviation stays below `threshold_percent`.
    ///
    /// Return
    /// ----------
    /// * `None` if the deviations are undefined (final estimate zero) or the report is empty.
    pub fn stabilized_at(&self, threshold_percent: f64) -> Option<usize> {
        let deviations = self.percent_deviations();
        let mut stable_from = None;
        for (point, dev) in self.points.iter().zip(&deviations).rev() {
            match dev {
                Some(d) if *d < threshold_percent => stable_from = Some(point.n_trials),
                _ => break,
            }
        }
        stable_from
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl fmt::Display for ConvergenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12}  {:>14}  {:>12}", "n_trials", "probability", "|% diff|")?;
        let rows = self
            .points
            .iter()
            .zip(self.percent_deviations())
            .map(|(p, dev)| {
                let dev = dev.map_or_else(|| "n/a".to_string(), |d| format!("{d:.3}"));
                format!("{:>12}  {:>14.6e}  {:>12}", p.n_trials, p.probability, dev)
            })
            .join("\n");
        write!(f, "{rows}")
    }
}

fn validate_trial_sizes(trial_sizes: &[usize]) -> Result<(), ImpactorError> {
    if trial_sizes.is_empty() {
        return Err(ImpactorError::InvalidTrialSizes(
            "at least one trial size is required".into(),
        ));
    }
    if let Some(zero) = trial_sizes.iter().find(|n| **n == 0) {
        return Err(ImpactorError::InvalidTrialCount(*zero));
    }
    Ok(())
}

/// Run one independent simulation per trial size, in order.
///
/// Arguments
/// -----------------
/// * `impactor`: Model and uncertainty table to simulate with.
/// * `input`: Base input; its `n_trials` and `seed` are ignored.
/// * `trial_sizes`: Trial counts, in the order the points are reported.
/// * `rng`: Random source shared sequentially by all runs.
///
/// Return
/// ----------
/// * The [`ConvergenceReport`], or the first simulation error.
pub fn analyze_convergence(
    impactor: &Impactor,
    input: &SimulationInput,
    trial_sizes: &[usize],
    rng: &mut impl Rng,
) -> Result<ConvergenceReport, ImpactorError> {
    validate_trial_sizes(trial_sizes)?;

    let mut points = Vec::with_capacity(trial_sizes.len());
    for n in trial_sizes {
        let run_input = input.with_n_trials(*n)?;
        let result = impactor.simulate_with_rng(&run_input, rng)?;
        info!(
            n_trials = n,
            probability = result.probability,
            "convergence point"
        );
        points.push(ConvergencePoint {
            n_trials: *n,
            probability: result.probability,
        });
    }
    Ok(ConvergenceReport { points })
}

/// Seed of the `index`-th parallel run (SplitMix64 finalizer over base seed and index).
fn stream_seed(base_seed: u64, index: usize) -> u64 {
    let mut z = base_seed.wrapping_add((index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Parallel variant of [`analyze_convergence`] on the `rayon` pool.
///
/// Each trial size is simulated with its own `StdRng` seeded from `base_seed` and the
/// point index, so the result is reproducible and independent of thread scheduling.
pub fn analyze_convergence_parallel(
    impactor: &Impactor,
    input: &SimulationInput,
    trial_sizes: &[usize],
    base_seed: u64,
) -> Result<ConvergenceReport, ImpactorError> {
    validate_trial_sizes(trial_sizes)?;

    let points = trial_sizes
        .par_iter()
        .enumerate()
        .map(|(idx, n)| -> Result<ConvergencePoint, ImpactorError> {
            let run_input = input.with_n_trials(*n)?;
            let mut rng = StdRng::seed_from_u64(stream_seed(base_seed, idx));
            let result = impactor.simulate_with_rng(&run_input, &mut rng)?;
            Ok(ConvergencePoint {
                n_trials: *n,
                probability: result.probability,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(points = points.len(), base_seed, "parallel convergence done");
    Ok(ConvergenceReport { points })
}
