//! # Constants and type definitions for Impactor
//!
//! This module centralizes the **physical constants**, **statistical constants**, and
//! **common type aliases** used throughout the `Impactor` library.
//!
//! ## Overview
//!
//! - Geophysical constants used by the gravitational-focusing model
//! - The default orbit-uncertainty table (class → fractional position uncertainty)
//! - Monte Carlo defaults (trial count, convergence trial sizes)
//! - Core type aliases used across the crate
//!
//! These definitions are consumed by the physical model, the uncertainty resolver,
//! the estimator and the convergence analysis.

// -------------------------------------------------------------------------------------------------
// Physical constants
// -------------------------------------------------------------------------------------------------

/// Earth radius in kilometers used for the capture cross-section
pub const R_EARTH: Kilometer = 6378.0;

/// Earth escape velocity in km/s
pub const V_ESCAPE: KmPerSec = 11.2;

// -------------------------------------------------------------------------------------------------
// Orbit uncertainty
// -------------------------------------------------------------------------------------------------

/// Fractional position uncertainty per orbit-uncertainty class (index = class, 0..=9).
///
/// These are coarse values chosen for the simulation, not a calibrated mapping.
pub const UNCERTAINTY_COEFFICIENTS: [f64; 10] =
    [0.01, 0.02, 0.05, 0.10, 0.15, 0.20, 0.30, 0.40, 0.50, 0.60];

/// Coefficient substituted for any class missing from the table
pub const DEFAULT_UNCERTAINTY_COEFFICIENT: f64 = 0.10;

// -------------------------------------------------------------------------------------------------
// Monte Carlo / statistics
// -------------------------------------------------------------------------------------------------

/// Default number of Monte Carlo trials per simulation
pub const DEFAULT_N_TRIALS: usize = 100_000;

/// Two-sided 95 % normal quantile
pub const Z_95: f64 = 1.96;

/// Default trial sizes used by the convergence analysis
pub const DEFAULT_TRIAL_SIZES: [usize; 5] = [1_000, 5_000, 10_000, 50_000, 100_000];

/// Probability above which an object is reported as high risk
pub const HIGH_RISK_PROBABILITY: Probability = 1e-2;

/// Probability above which an object is reported as medium risk
pub const MEDIUM_RISK_PROBABILITY: Probability = 1e-4;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Distance in kilometers
pub type Kilometer = f64;
/// Velocity in kilometers per second
pub type KmPerSec = f64;
/// Probability in [0, 1]
pub type Probability = f64;
