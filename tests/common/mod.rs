#![allow(dead_code)]

use approx::assert_relative_eq;
use impactor::{estimator::ConfidenceInterval, SimulationInput, SimulationResult};

pub fn input(miss_km: f64, velocity_km_s: f64, class: i64, n_trials: usize) -> SimulationInput {
    SimulationInput::builder()
        .miss_distance_km(miss_km)
        .velocity_km_s(velocity_km_s)
        .orbit_uncertainty(class)
        .n_trials(n_trials)
        .build()
        .unwrap()
}

/// Structural invariants every result must satisfy.
pub fn assert_result_consistent(result: &SimulationResult) {
    assert!((0.0..=1.0).contains(&result.probability));
    assert_interval_brackets(&result.confidence_interval_95, result.probability);
    assert_eq!(result.sampled_distances.len(), result.n_trials);
    assert_eq!(result.impacts.len(), result.n_trials);
    assert!(result.sigma >= 0.0);
    assert!(result.r_critical >= result.body_radius_km);

    let impacts = result.impacts.iter().filter(|i| **i).count();
    assert_eq!(impacts, result.impact_count);
    assert_relative_eq!(
        result.probability,
        impacts as f64 / result.n_trials as f64,
        epsilon = 1e-15
    );
    for (d, hit) in result.sampled_distances.iter().zip(&result.impacts) {
        assert_eq!(*hit, *d < result.r_critical);
    }
}

pub fn assert_interval_brackets(ci: &ConfidenceInterval, p: f64) {
    assert!(0.0 <= ci.lower, "lower bound below 0: {ci}");
    assert!(ci.upper <= 1.0, "upper bound above 1: {ci}");
    assert!(ci.lower <= p && p <= ci.upper, "{ci} does not bracket {p}");
}
