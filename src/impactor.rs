//! # Impactor: physical model, uncertainty table and simulation entry points
//!
//! This module defines the [`Impactor`](crate::impactor::Impactor) struct, the central façade
//! that wires together:
//!
//! 1. **Physical model** ([`PhysicalModel`]) – body radius and escape velocity used for the
//!    gravitationally focused capture radius.
//! 2. **Uncertainty table** ([`UncertaintyTable`]) – orbit class → fractional position
//!    uncertainty, with the default fallback.
//! 3. **Simulation entry points** – single runs ([`Impactor::simulate`],
//!    [`Impactor::simulate_with_rng`]) and convergence studies
//!    ([`Impactor::analyze_convergence`], [`Impactor::analyze_convergence_parallel`]).
//!
//! Both configuration pieces are immutable once the façade is built, so one instance can be
//! shared by reference between threads.
//!
//! ## Typical usage
//!
//! ```rust
//! use impactor::impactor::Impactor;
//! use impactor::simulation::SimulationInput;
//!
//! let impactor = Impactor::new();
//! let input = SimulationInput::builder()
//!     .miss_distance_km(31_600.0)
//!     .velocity_km_s(7.4)
//!     .orbit_uncertainty(4_i64)
//!     .n_trials(20_000)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let result = impactor.simulate(&input).unwrap();
//! println!("p = {:.3e} (95% CI {})", result.probability, result.confidence_interval_95);
//! ```
//!
//! ## Randomness
//!
//! [`Impactor::simulate`] seeds a `StdRng` from [`SimulationInput::seed`] when present and
//! from the operating system otherwise. Use [`Impactor::simulate_with_rng`] to drive several
//! runs from one caller-owned generator.
//!
//! ## See also
//! ------------
//! * [`crate::simulation::run_simulation`] – The pipeline itself.
//! * [`crate::convergence`] – Convergence reports.
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    constants::{Kilometer, KmPerSec},
    convergence::{self, ConvergenceReport},
    impactor_errors::ImpactorError,
    physical_model::PhysicalModel,
    simulation::{run_simulation, SimulationInput, SimulationResult},
    uncertainty::{OrbitUncertainty, UncertaintyTable},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Impactor {
    model: PhysicalModel,
    uncertainty_table: UncertaintyTable,
}

impl Impactor {
    /// Construct an [`Impactor`] with Earth's constants and the default uncertainty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct an [`Impactor`] with injected configuration.
    ///
    /// Arguments
    /// -----------------
    /// * `model`: Body constants (e.g. a custom radius for sensitivity studies).
    /// * `uncertainty_table`: Alternate orbit-class table.
    pub fn with_model(model: PhysicalModel, uncertainty_table: UncertaintyTable) -> Self {
        Impactor {
            model,
            uncertainty_table,
        }
    }

    pub fn model(&self) -> &PhysicalModel {
        &self.model
    }

    pub fn uncertainty_table(&self) -> &UncertaintyTable {
        &self.uncertainty_table
    }

    /// Critical radius for a velocity, with this façade's model.
    pub fn critical_radius(&self, velocity_km_s: KmPerSec) -> Result<Kilometer, ImpactorError> {
        self.model.critical_radius(velocity_km_s)
    }

    /// Run one simulation, seeding the generator from the input.
    ///
    /// Arguments
    /// -----------------
    /// * `input`: Validated simulation input.
    ///
    /// Return
    /// ----------
    /// * The [`SimulationResult`]; with a seed set, repeated calls are bit-identical.
    ///
    /// See also
    /// ------------
    /// * [`Impactor::simulate_with_rng`] – Caller-owned generator.
    pub fn simulate(&self, input: &SimulationInput) -> Result<SimulationResult, ImpactorError> {
        let mut rng = match input.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.simulate_with_rng(input, &mut rng)
    }

    /// Run one simulation drawing from `rng` (the input seed is ignored).
    pub fn simulate_with_rng(
        &self,
        input: &SimulationInput,
        rng: &mut impl Rng,
    ) -> Result<SimulationResult, ImpactorError> {
        run_simulation(&self.model, &self.uncertainty_table, input, rng)
    }

    /// Sequential convergence analysis.
    ///
    /// The generator is seeded from the input seed when present (OS entropy otherwise) and
    /// shared sequentially by all runs.
    ///
    /// See also
    /// ------------
    /// * [`convergence::analyze_convergence`] – Same with a caller-owned generator.
    pub fn analyze_convergence(
        &self,
        input: &SimulationInput,
        trial_sizes: &[usize],
    ) -> Result<ConvergenceReport, ImpactorError> {
        let mut rng = match input.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        convergence::analyze_convergence(self, input, trial_sizes, &mut rng)
    }

    /// Parallel convergence analysis with independent per-size streams.
    ///
    /// The base seed is the input seed when present, a random one otherwise.
    pub fn analyze_convergence_parallel(
        &self,
        input: &SimulationInput,
        trial_sizes: &[usize],
    ) -> Result<ConvergenceReport, ImpactorError> {
        let base_seed = input.seed().unwrap_or_else(|| rand::rng().random());
        convergence::analyze_convergence_parallel(self, input, trial_sizes, base_seed)
    }
}

/// One-call simulation with the default configuration and an OS-seeded generator.
///
/// Arguments
/// -----------------
/// * `miss_distance_km`: Nominal miss distance (km).
/// * `velocity_km_s`: Relative velocity at close approach (km/s), > 0.
/// * `orbit_uncertainty`: Class 0–9 as integer or numeric string.
/// * `n_trials`: Number of Monte Carlo trials, >= 1.
pub fn simulate(
    miss_distance_km: Kilometer,
    velocity_km_s: KmPerSec,
    orbit_uncertainty: impl Into<OrbitUncertainty>,
    n_trials: usize,
) -> Result<SimulationResult, ImpactorError> {
    let input = SimulationInput::builder()
        .miss_distance_km(miss_distance_km)
        .velocity_km_s(velocity_km_s)
        .orbit_uncertainty(orbit_uncertainty)
        .n_trials(n_trials)
        .build()?;
    Impactor::new().simulate(&input)
}

/// Same as [`simulate`] with a caller-owned generator.
pub fn simulate_with_rng(
    miss_distance_km: Kilometer,
    velocity_km_s: KmPerSec,
    orbit_uncertainty: impl Into<OrbitUncertainty>,
    n_trials: usize,
    rng: &mut impl Rng,
) -> Result<SimulationResult, ImpactorError> {
    let input = SimulationInput::builder()
        .miss_distance_km(miss_distance_km)
        .velocity_km_s(velocity_km_s)
        .orbit_uncertainty(orbit_uncertainty)
        .n_trials(n_trials)
        .build()?;
    Impactor::new().simulate_with_rng(&input, rng)
}

/// One-call convergence analysis with the default configuration.
pub fn analyze_convergence(
    miss_distance_km: Kilometer,
    velocity_km_s: KmPerSec,
    orbit_uncertainty: impl Into<OrbitUncertainty>,
    trial_sizes: &[usize],
) -> Result<ConvergenceReport, ImpactorError> {
    let input = SimulationInput::new(miss_distance_km, velocity_km_s, orbit_uncertainty)?;
    Impactor::new().analyze_convergence(&input, trial_sizes)
}

#[cfg(test)]
mod impactor_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_seed_from_input_is_reproducible() {
        let input = SimulationInput::builder()
            .miss_distance_km(20_000.0)
            .velocity_km_s(9.0)
            .orbit_uncertainty(6_i64)
            .n_trials(3_000)
            .seed(99)
            .build()
            .unwrap();
        let impactor = Impactor::new();
        let a = impactor.simulate(&input).unwrap();
        let b = impactor.simulate(&input).unwrap();
        assert_eq!(a.sampled_distances, b.sampled_distances);
        assert_eq!(a.probability, b.probability);
    }

    #[test]
    fn test_injected_model_changes_radius() {
        let small = PhysicalModel::new(1_000.0, 0.0).unwrap();
        let impactor = Impactor::with_model(small, UncertaintyTable::default());
        assert_relative_eq!(impactor.critical_radius(5.0).unwrap(), 1_000.0);
        assert!(Impactor::new().critical_radius(5.0).unwrap() > 6_378.0);
    }

    #[test]
    fn test_free_functions_validate_inputs() {
        assert_eq!(
            simulate(1.0e4, 0.0, 3_i64, 10).unwrap_err(),
            ImpactorError::InvalidVelocity(0.0)
        );
        assert_eq!(
            simulate(1.0e4, 5.0, 3_i64, 0).unwrap_err(),
            ImpactorError::InvalidTrialCount(0)
        );
        assert!(matches!(
            analyze_convergence(1.0e4, 5.0, 3_i64, &[]),
            Err(ImpactorError::InvalidTrialSizes(_))
        ));
    }

    #[test]
    fn test_parallel_convergence_is_reproducible() {
        let input = SimulationInput::builder()
            .miss_distance_km(5_000.0)
            .velocity_km_s(10.0)
            .orbit_uncertainty(9_i64)
            .seed(5)
            .build()
            .unwrap();
        let impactor = Impactor::new();
        let sizes = [100, 1_000, 10_000];
        let a = impactor.analyze_convergence_parallel(&input, &sizes).unwrap();
        let b = impactor.analyze_convergence_parallel(&input, &sizes).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.points.iter().map(|p| p.n_trials).collect::<Vec<_>>(),
            sizes.to_vec()
        );
    }
}
