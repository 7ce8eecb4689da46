//! # Monte Carlo impact simulation
//!
//! This module defines the validated input of one simulation ([`SimulationInput`]), its
//! fluent builder, the immutable output ([`SimulationResult`]) and the pipeline that links
//! the physical model, the uncertainty resolver, the sampler and the estimator.
//!
//! ## Pipeline
//!
//! 1. **Critical radius** – [`PhysicalModel::critical_radius`] from the relative velocity.
//! 2. **Sigma** – [`UncertaintyTable::resolve`] gives the fractional uncertainty;
//!    `sigma = miss_distance_km × coefficient`.
//! 3. **Sampling** – [`sample_miss_distances`] draws `n_trials` Gaussian miss distances.
//! 4. **Estimation** – [`estimate`] counts trials strictly inside the radius and derives
//!    the Wilson interval, standard error and relative error.
//!
//! ## Example
//!
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use impactor::simulation::SimulationInput;
//! use impactor::impactor::Impactor;
//!
//! let input = SimulationInput::builder()
//!     .miss_distance_km(31_600.0)
//!     .velocity_km_s(7.4)
//!     .orbit_uncertainty(4_i64)
//!     .n_trials(10_000)
//!     .build()
//!     .unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let result = Impactor::new().simulate_with_rng(&input, &mut rng).unwrap();
//! assert_eq!(result.sampled_distances.len(), 10_000);
//! ```
//!
//! ## See also
//! ------------
//! * [`crate::impactor::Impactor`] – Façade owning the model and table.
//! * [`crate::convergence`] – Repeated independent runs at increasing trial counts.
use std::cmp::Ordering::Greater;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    constants::{Kilometer, KmPerSec, Probability, DEFAULT_N_TRIALS},
    estimator::{classify_impacts, estimate, ConfidenceInterval, ImpactEstimate},
    impactor_errors::ImpactorError,
    physical_model::PhysicalModel,
    sampler::sample_miss_distances,
    uncertainty::{OrbitUncertainty, ResolvedUncertainty, UncertaintyTable},
};

/// Validated inputs of one impact simulation.
///
/// Instances are only obtained through [`SimulationInput::builder`] (or
/// [`SimulationInput::new`]); deserialization goes through the same builder, so the
/// numeric constraints below always hold:
///
/// * `miss_distance_km` is finite (its sign is not checked),
/// * `velocity_km_s` is finite and > 0,
/// * `n_trials >= 1`.
///
/// The orbit uncertainty is kept as delivered; unknown classes are resolved to the
/// default coefficient at simulation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimulationInputFields")]
pub struct SimulationInput {
    miss_distance_km: Kilometer,
    velocity_km_s: KmPerSec,
    orbit_uncertainty: OrbitUncertainty,
    n_trials: usize,
    seed: Option<u64>,
}

impl SimulationInput {
    /// Shortcut for the builder with the default trial count and no seed.
    pub fn new(
        miss_distance_km: Kilometer,
        velocity_km_s: KmPerSec,
        orbit_uncertainty: impl Into<OrbitUncertainty>,
    ) -> Result<Self, ImpactorError> {
        Self::builder()
            .miss_distance_km(miss_distance_km)
            .velocity_km_s(velocity_km_s)
            .orbit_uncertainty(orbit_uncertainty)
            .build()
    }

    /// Create a new [`SimulationInputBuilder`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use impactor::simulation::SimulationInput;
    ///
    /// let input = SimulationInput::builder()
    ///     .miss_distance_km(5_000.0)
    ///     .velocity_km_s(10.0)
    ///     .orbit_uncertainty("9")
    ///     .n_trials(1_000)
    ///     .seed(7)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(input.n_trials(), 1_000);
    /// ```
    pub fn builder() -> SimulationInputBuilder {
        SimulationInputBuilder::new()
    }

    pub fn miss_distance_km(&self) -> Kilometer {
        self.miss_distance_km
    }

    pub fn velocity_km_s(&self) -> KmPerSec {
        self.velocity_km_s
    }

    pub fn orbit_uncertainty(&self) -> &OrbitUncertainty {
        &self.orbit_uncertainty
    }

    pub fn n_trials(&self) -> usize {
        self.n_trials
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Copy of this input with another trial count (used by the convergence analysis).
    pub fn with_n_trials(&self, n_trials: usize) -> Result<Self, ImpactorError> {
        if n_trials == 0 {
            return Err(ImpactorError::InvalidTrialCount(n_trials));
        }
        Ok(SimulationInput {
            n_trials,
            ..self.clone()
        })
    }

    /// Copy of this input with another seed.
    pub fn with_seed(&self, seed: Option<u64>) -> Self {
        SimulationInput {
            seed,
            ..self.clone()
        }
    }
}

/// Serialized form of [`SimulationInput`], validated through the builder on the way in.
#[derive(Deserialize)]
struct SimulationInputFields {
    miss_distance_km: Kilometer,
    velocity_km_s: KmPerSec,
    orbit_uncertainty: OrbitUncertainty,
    #[serde(default = "default_n_trials")]
    n_trials: usize,
    #[serde(default)]
    seed: Option<u64>,
}

fn default_n_trials() -> usize {
    DEFAULT_N_TRIALS
}

impl TryFrom<SimulationInputFields> for SimulationInput {
    type Error = ImpactorError;

    fn try_from(fields: SimulationInputFields) -> Result<Self, Self::Error> {
        let input = SimulationInput::builder()
            .miss_distance_km(fields.miss_distance_km)
            .velocity_km_s(fields.velocity_km_s)
            .orbit_uncertainty(fields.orbit_uncertainty)
            .n_trials(fields.n_trials)
            .build()?;
        Ok(input.with_seed(fields.seed))
    }
}

/// Builder for [`SimulationInput`], with validation.
#[derive(Debug, Clone)]
pub struct SimulationInputBuilder {
    miss_distance_km: Option<Kilometer>,
    velocity_km_s: Option<KmPerSec>,
    orbit_uncertainty: Option<OrbitUncertainty>,
    n_trials: usize,
    seed: Option<u64>,
}

impl Default for SimulationInputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationInputBuilder {
    /// Create a new builder; `n_trials` defaults to [`DEFAULT_N_TRIALS`].
    pub fn new() -> Self {
        Self {
            miss_distance_km: None,
            velocity_km_s: None,
            orbit_uncertainty: None,
            n_trials: DEFAULT_N_TRIALS,
            seed: None,
        }
    }

    pub fn miss_distance_km(mut self, v: Kilometer) -> Self {
        self.miss_distance_km = Some(v);
        self
    }
    pub fn velocity_km_s(mut self, v: KmPerSec) -> Self {
        self.velocity_km_s = Some(v);
        self
    }
    pub fn orbit_uncertainty(mut self, v: impl Into<OrbitUncertainty>) -> Self {
        self.orbit_uncertainty = Some(v.into());
        self
    }
    pub fn n_trials(mut self, v: usize) -> Self {
        self.n_trials = v;
        self
    }
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = Some(v);
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Finalize the builder and produce a [`SimulationInput`].
    ///
    /// Validation rules
    /// -----------------
    /// * `miss_distance_km`, `velocity_km_s` and `orbit_uncertainty` must be set.
    /// * `miss_distance_km` and `velocity_km_s` must be finite.
    /// * `velocity_km_s > 0.0` – the focusing factor divides by it.
    /// * `n_trials >= 1` – the estimator divides by it.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(SimulationInput)` if all values are valid.
    /// * `Err(ImpactorError)` naming the offending field and value otherwise.
    pub fn build(self) -> Result<SimulationInput, ImpactorError> {
        let miss_distance_km = self.miss_distance_km.ok_or_else(|| {
            ImpactorError::InvalidParameter("miss_distance_km is required".into())
        })?;
        let velocity_km_s = self
            .velocity_km_s
            .ok_or_else(|| ImpactorError::InvalidParameter("velocity_km_s is required".into()))?;
        let orbit_uncertainty = self.orbit_uncertainty.ok_or_else(|| {
            ImpactorError::InvalidParameter("orbit_uncertainty is required".into())
        })?;

        if !miss_distance_km.is_finite() {
            return Err(ImpactorError::NonFiniteInput {
                field: "miss_distance_km",
                value: miss_distance_km,
            });
        }
        if !velocity_km_s.is_finite() {
            return Err(ImpactorError::NonFiniteInput {
                field: "velocity_km_s",
                value: velocity_km_s,
            });
        }
        if !Self::gt0(velocity_km_s) {
            return Err(ImpactorError::InvalidVelocity(velocity_km_s));
        }
        if self.n_trials == 0 {
            return Err(ImpactorError::InvalidTrialCount(self.n_trials));
        }

        Ok(SimulationInput {
            miss_distance_km,
            velocity_km_s,
            orbit_uncertainty,
            n_trials: self.n_trials,
            seed: self.seed,
        })
    }
}

/// Outcome of one Monte Carlo run.
///
/// Invariants
/// -----------------
/// * `0 ≤ probability ≤ 1` and `confidence_interval_95` brackets it,
/// * `sampled_distances.len() == impacts.len() == n_trials`,
/// * `sigma ≥ 0`, `r_critical ≥` the body radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub probability: Probability,
    pub r_critical: Kilometer,
    pub sampled_distances: Vec<Kilometer>,
    pub impacts: Vec<bool>,
    pub sigma: Kilometer,
    pub confidence_interval_95: ConfidenceInterval,
    pub standard_error: f64,
    pub relative_error: f64,
    pub impact_count: usize,
    pub n_trials: usize,
    pub nominal_miss_km: Kilometer,
    pub velocity_km_s: KmPerSec,
    pub orbit_uncertainty: OrbitUncertainty,
    pub uncertainty: ResolvedUncertainty,
    /// Body radius the critical radius was derived from.
    pub body_radius_km: Kilometer,
}

impl SimulationResult {
    /// Fractional uncertainty as a percentage (e.g. 15.0 for class 4).
    pub fn uncertainty_percent(&self) -> f64 {
        self.uncertainty.percent()
    }

    /// `r_critical / body_radius`.
    pub fn focusing_factor(&self) -> f64 {
        self.r_critical / self.body_radius_km
    }

    /// Number of trials outside the critical radius.
    pub fn miss_count(&self) -> usize {
        self.n_trials - self.impact_count
    }

    /// Statistics part of the result.
    pub fn estimate(&self) -> ImpactEstimate {
        ImpactEstimate {
            probability: self.probability,
            impact_count: self.impact_count,
            n_trials: self.n_trials,
            confidence_interval_95: self.confidence_interval_95,
            standard_error: self.standard_error,
            relative_error: self.relative_error,
        }
    }
}

/// Run the full pipeline for one input with the given model, table and random source.
///
/// Arguments
/// -----------------
/// * `model`: Body constants for the critical radius.
/// * `table`: Orbit-class → coefficient lookup.
/// * `input`: Validated simulation input (its `seed` is ignored here).
/// * `rng`: Random source for the Gaussian draws.
///
/// Return
/// ----------
/// * The [`SimulationResult`], or the first error raised by a pipeline stage.
///
/// See also
/// ------------
/// * [`crate::impactor::Impactor::simulate`] – Seeds the random source from the input.
pub fn run_simulation(
    model: &PhysicalModel,
    table: &UncertaintyTable,
    input: &SimulationInput,
    rng: &mut impl Rng,
) -> Result<SimulationResult, ImpactorError> {
    let r_critical = model.critical_radius(input.velocity_km_s)?;
    let uncertainty = table.resolve(&input.orbit_uncertainty);
    let sigma = input.miss_distance_km * uncertainty.coefficient;

    let sampled_distances =
        sample_miss_distances(rng, input.miss_distance_km, sigma, input.n_trials)?;
    let stats = estimate(&sampled_distances, r_critical)?;
    let impacts = classify_impacts(&sampled_distances, r_critical);

    debug!(
        miss_distance_km = input.miss_distance_km,
        velocity_km_s = input.velocity_km_s,
        orbit_uncertainty = %input.orbit_uncertainty,
        n_trials = input.n_trials,
        r_critical,
        sigma,
        probability = stats.probability,
        "impact simulation done"
    );

    Ok(SimulationResult {
        probability: stats.probability,
        r_critical,
        sampled_distances,
        impacts,
        sigma,
        confidence_interval_95: stats.confidence_interval_95,
        standard_error: stats.standard_error,
        relative_error: stats.relative_error,
        impact_count: stats.impact_count,
        n_trials: stats.n_trials,
        nominal_miss_km: input.miss_distance_km,
        velocity_km_s: input.velocity_km_s,
        orbit_uncertainty: input.orbit_uncertainty.clone(),
        uncertainty,
        body_radius_km: model.body_radius_km(),
    })
}

#[cfg(test)]
mod simulation_test {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn run(input: &SimulationInput, seed: u64) -> SimulationResult {
        let mut rng = StdRng::seed_from_u64(seed);
        run_simulation(
            &PhysicalModel::default(),
            &UncertaintyTable::default(),
            input,
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn test_builder_defaults_and_validation() {
        let input = SimulationInput::new(1.0e5, 12.0, 2_i64).unwrap();
        assert_eq!(input.n_trials(), DEFAULT_N_TRIALS);
        assert_eq!(input.seed(), None);

        let missing = SimulationInput::builder().velocity_km_s(1.0).build();
        assert_eq!(
            missing,
            Err(ImpactorError::InvalidParameter(
                "miss_distance_km is required".into()
            ))
        );

        let base = SimulationInput::builder()
            .miss_distance_km(1.0e5)
            .velocity_km_s(12.0)
            .orbit_uncertainty(2_i64);

        assert_eq!(
            base.clone().velocity_km_s(0.0).build(),
            Err(ImpactorError::InvalidVelocity(0.0))
        );
        assert_eq!(
            base.clone().velocity_km_s(-4.0).build(),
            Err(ImpactorError::InvalidVelocity(-4.0))
        );
        assert_eq!(
            base.clone().n_trials(0).build(),
            Err(ImpactorError::InvalidTrialCount(0))
        );
        assert!(matches!(
            base.clone().miss_distance_km(f64::NAN).build(),
            Err(ImpactorError::NonFiniteInput {
                field: "miss_distance_km",
                ..
            })
        ));
        assert!(matches!(
            base.velocity_km_s(f64::INFINITY).build(),
            Err(ImpactorError::NonFiniteInput {
                field: "velocity_km_s",
                ..
            })
        ));
    }

    #[test]
    fn test_result_shapes_and_sigma() {
        let input = SimulationInput::builder()
            .miss_distance_km(31_600.0)
            .velocity_km_s(7.4)
            .orbit_uncertainty(4_i64)
            .n_trials(5_000)
            .build()
            .unwrap();
        let result = run(&input, 42);

        assert_eq!(result.sampled_distances.len(), 5_000);
        assert_eq!(result.impacts.len(), 5_000);
        assert_relative_eq!(result.sigma, 4_740.0, epsilon = 1e-9);
        assert_relative_eq!(result.uncertainty_percent(), 15.0, epsilon = 1e-9);
        assert!(result.r_critical >= 6_378.0);
        assert_relative_eq!(result.focusing_factor(), result.r_critical / 6_378.0);
        assert_eq!(
            result.impacts.iter().filter(|i| **i).count(),
            result.impact_count
        );
        assert_eq!(result.miss_count() + result.impact_count, 5_000);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let input = SimulationInput::builder()
            .miss_distance_km(5_000.0)
            .velocity_km_s(10.0)
            .orbit_uncertainty(9_i64)
            .n_trials(2_000)
            .build()
            .unwrap();
        let a = run(&input, 1234);
        let b = run(&input, 1234);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_miss_distance() {
        // sigma = 0: every trial sits at 0 km, well inside the radius
        let input = SimulationInput::builder()
            .miss_distance_km(0.0)
            .velocity_km_s(20.0)
            .orbit_uncertainty(9_i64)
            .n_trials(1_000)
            .build()
            .unwrap();
        let result = run(&input, 3);
        assert_eq!(result.sigma, 0.0);
        assert_eq!(result.probability, 1.0);
        assert_eq!(result.confidence_interval_95.upper, 1.0);
    }

    #[test]
    fn test_negative_miss_distance_is_rejected_by_sampler() {
        let input = SimulationInput::new(-10_000.0, 10.0, 3_i64).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let err = run_simulation(
            &PhysicalModel::default(),
            &UncertaintyTable::default(),
            &input,
            &mut rng,
        )
        .unwrap_err();
        match err {
            ImpactorError::InvalidSigma(sigma) => assert_relative_eq!(sigma, -1_000.0),
            other => panic!("expected InvalidSigma, got {other:?}"),
        }

        // the same input through the façade never yields a negative-sigma result
        let result = crate::impactor::Impactor::new().simulate(&input.with_seed(Some(1)));
        assert!(matches!(result, Err(ImpactorError::InvalidSigma(_))));
    }

    #[test]
    fn test_deserialization_goes_through_the_builder() {
        let input: SimulationInput = serde_json::from_str(
            r#"{ "miss_distance_km": 31600.0, "velocity_km_s": 7.4, "orbit_uncertainty": "4" }"#,
        )
        .unwrap();
        assert_eq!(input.n_trials(), DEFAULT_N_TRIALS);
        assert_eq!(input.orbit_uncertainty(), &OrbitUncertainty::Label("4".into()));

        let zero_velocity = serde_json::from_str::<SimulationInput>(
            r#"{ "miss_distance_km": 1.0, "velocity_km_s": 0.0, "orbit_uncertainty": 1 }"#,
        )
        .unwrap_err();
        assert!(zero_velocity.to_string().contains("Invalid relative velocity"));

        let no_trials = serde_json::from_str::<SimulationInput>(
            r#"{ "miss_distance_km": 1.0, "velocity_km_s": 3.0,
                 "orbit_uncertainty": 1, "n_trials": 0 }"#,
        )
        .unwrap_err();
        assert!(no_trials.to_string().contains("Invalid number of trials"));

        // csv parses "inf" as a float, the builder still rejects it by name
        let data = "miss_distance_km,velocity_km_s,orbit_uncertainty,n_trials\n\
                    inf,10.0,3,100\n";
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let err = rdr
            .deserialize::<SimulationInput>()
            .next()
            .unwrap()
            .unwrap_err();
        assert!(err.to_string().contains("miss_distance_km"), "{err}");

        let seeded = SimulationInput::new(2.0e4, 9.0, 6_i64)
            .unwrap()
            .with_seed(Some(3));
        let back: SimulationInput =
            serde_json::from_str(&serde_json::to_string(&seeded).unwrap()).unwrap();
        assert_eq!(back, seeded);
    }

    #[test]
    fn test_unknown_class_flags_default() {
        let input = SimulationInput::builder()
            .miss_distance_km(50_000.0)
            .velocity_km_s(15.0)
            .orbit_uncertainty("U")
            .n_trials(100)
            .build()
            .unwrap();
        let result = run(&input, 9);
        assert!(result.uncertainty.used_default);
        assert_relative_eq!(result.sigma, 5_000.0, epsilon = 1e-9);
    }
}
