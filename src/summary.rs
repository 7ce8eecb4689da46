//! # Simulation summary and risk assessment
//!
//! Condenses a [`SimulationResult`] into the figures a report needs: impact and miss
//! counts, descriptive statistics of the sampled distances, the closest sampled approach
//! and its margin to the critical radius, and a coarse risk level.
//!
//! Display
//! -----------------
//! * `format!("{}", summary)` – compact single line for logs.
//! * `format!("{:#}", summary)` – multi-line report.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    constants::{Kilometer, Probability, HIGH_RISK_PROBABILITY, MEDIUM_RISK_PROBABILITY},
    estimator::ConfidenceInterval,
    simulation::SimulationResult,
};

/// Coarse risk level derived from the impact probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// `High` above 1e-2, `Medium` above 1e-4, `Low` otherwise (thresholds exclusive).
    pub fn from_probability(p: Probability) -> Self {
        if p > HIGH_RISK_PROBABILITY {
            RiskLevel::High
        } else if p > MEDIUM_RISK_PROBABILITY {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        };
        write!(f, "{s}")
    }
}

/// Descriptive statistics of the sampled miss distances (km).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceStats {
    pub min: Kilometer,
    pub max: Kilometer,
    pub mean: Kilometer,
    pub median: Kilometer,
    /// Population standard deviation.
    pub std_dev: Kilometer,
}

impl DistanceStats {
    /// Compute the statistics, `None` on an empty or non-finite sample.
    pub fn from_samples(samples: &[Kilometer]) -> Option<Self> {
        if samples.is_empty() || samples.iter().any(|x| !x.is_finite()) {
            return None;
        }
        let n = samples.len() as f64;

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            0.5 * (sorted[mid - 1] + sorted[mid])
        } else {
            sorted[mid]
        };

        Some(DistanceStats {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean,
            median,
            std_dev: var.sqrt(),
        })
    }
}

/// Report-ready view of one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub probability: Probability,
    pub confidence_interval_95: ConfidenceInterval,
    pub standard_error: f64,
    pub impact_count: usize,
    pub miss_count: usize,
    pub n_trials: usize,
    pub nominal_miss_km: Kilometer,
    pub sigma_km: Kilometer,
    pub orbit_uncertainty: String,
    pub uncertainty_percent: f64,
    pub used_default_uncertainty: bool,
    pub body_radius_km: Kilometer,
    pub r_critical_km: Kilometer,
    pub focusing_factor: f64,
    pub distances: DistanceStats,
    /// `distances.min - r_critical`; negative when at least one trial breached the radius.
    pub safety_margin_km: Kilometer,
    pub risk_level: RiskLevel,
}

impl SimulationSummary {
    /// Summarize a result.
    ///
    /// Return
    /// ----------
    /// * `None` if the sampled distances are empty or contain non-finite values.
    pub fn from_result(result: &SimulationResult) -> Option<Self> {
        let distances = DistanceStats::from_samples(&result.sampled_distances)?;
        Some(SimulationSummary {
            probability: result.probability,
            confidence_interval_95: result.confidence_interval_95,
            standard_error: result.standard_error,
            impact_count: result.impact_count,
            miss_count: result.miss_count(),
            n_trials: result.n_trials,
            nominal_miss_km: result.nominal_miss_km,
            sigma_km: result.sigma,
            orbit_uncertainty: result.orbit_uncertainty.to_string(),
            uncertainty_percent: result.uncertainty_percent(),
            used_default_uncertainty: result.uncertainty.used_default,
            body_radius_km: result.body_radius_km,
            r_critical_km: result.r_critical,
            focusing_factor: result.focusing_factor(),
            safety_margin_km: distances.min - result.r_critical,
            distances,
            risk_level: RiskLevel::from_probability(result.probability),
        })
    }

    /// `true` when the closest sampled trial lies inside the critical radius.
    pub fn is_breached(&self) -> bool {
        self.safety_margin_km < 0.0
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            let margin = if self.is_breached() {
                format!("BREACH by {:.0} km", -self.safety_margin_km)
            } else {
                format!("safe by {:.0} km", self.safety_margin_km)
            };
            let default_note = if self.used_default_uncertainty {
                " (default)"
            } else {
                ""
            };

            writeln!(f, "Impact simulation summary")?;
            writeln!(f, "-------------------------")?;
            writeln!(
                f,
                "probability        : {:.8} ({:.6}%)",
                self.probability,
                self.probability * 100.0
            )?;
            writeln!(f, "95% confidence     : {}", self.confidence_interval_95)?;
            writeln!(f, "standard error     : {:.8}", self.standard_error)?;
            writeln!(f, "impacts            : {} / {}", self.impact_count, self.n_trials)?;
            writeln!(f, "nominal miss       : {:.0} km", self.nominal_miss_km)?;
            writeln!(
                f,
                "orbit uncertainty  : {} ({:.0}%){default_note}",
                self.orbit_uncertainty, self.uncertainty_percent
            )?;
            writeln!(f, "position sigma     : ±{:.0} km", self.sigma_km)?;
            writeln!(f, "physical radius    : {:.0} km", self.body_radius_km)?;
            writeln!(f, "critical radius    : {:.0} km", self.r_critical_km)?;
            writeln!(f, "focusing factor    : {:.2}x", self.focusing_factor)?;
            writeln!(
                f,
                "min / max distance : {:.0} / {:.0} km",
                self.distances.min, self.distances.max
            )?;
            writeln!(
                f,
                "mean / median      : {:.0} / {:.0} km",
                self.distances.mean, self.distances.median
            )?;
            writeln!(f, "std dev            : {:.0} km", self.distances.std_dev)?;
            writeln!(f, "safety margin      : {margin}")?;
            write!(f, "risk level         : {}", self.risk_level)
        } else {
            write!(
                f,
                "p={:.3e}, ci95={}, impacts={}/{}, r_crit={:.0} km, sigma={:.0} km, risk={}",
                self.probability,
                self.confidence_interval_95,
                self.impact_count,
                self.n_trials,
                self.r_critical_km,
                self.sigma_km,
                self.risk_level
            )
        }
    }
}
