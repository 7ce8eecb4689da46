//! # Orbit uncertainty resolution
//!
//! Maps a coarse orbit-uncertainty class (0 = best determined, 9 = worst) to a fractional
//! positional uncertainty. The simulation uses that fraction of the nominal miss distance
//! as the standard deviation of the sampled miss distances.
//!
//! Upstream feeds deliver the class either as an integer or as a numeric string (NeoWs
//! returns `"0"`..`"9"`), so the input side is modelled by [`OrbitUncertainty`].
//!
//! Resolution never fails: any value that is not a key of the table (unparsable text,
//! negative or out-of-range class) falls back to
//! [`DEFAULT_UNCERTAINTY_COEFFICIENT`](crate::constants::DEFAULT_UNCERTAINTY_COEFFICIENT).
//! The substitution is recorded in [`ResolvedUncertainty::used_default`] so callers can
//! tell a genuine class 3 (also 0.10) from an unknown class.
//!
//! ```rust
//! use impactor::uncertainty::{OrbitUncertainty, UncertaintyTable};
//!
//! let table = UncertaintyTable::default();
//! assert_eq!(table.resolve(&OrbitUncertainty::from(4_i64)).coefficient, 0.15);
//! assert!(table.resolve(&"bogus".into()).used_default);
//! ```
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{DEFAULT_UNCERTAINTY_COEFFICIENT, UNCERTAINTY_COEFFICIENTS};

/// Orbit uncertainty class as delivered by an upstream source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrbitUncertainty {
    /// Integer class (expected 0..=9)
    Class(i64),
    /// Raw text, coerced to an integer on resolution
    Label(String),
}

impl OrbitUncertainty {
    /// Integer value of the class, if it can be coerced.
    ///
    /// Labels are trimmed before parsing; anything that is not an integer yields `None`.
    pub fn as_class(&self) -> Option<i64> {
        match self {
            OrbitUncertainty::Class(c) => Some(*c),
            OrbitUncertainty::Label(s) => s.trim().parse::<i64>().ok(),
        }
    }
}

impl fmt::Display for OrbitUncertainty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrbitUncertainty::Class(c) => write!(f, "{c}"),
            OrbitUncertainty::Label(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for OrbitUncertainty {
    fn from(c: i64) -> Self {
        OrbitUncertainty::Class(c)
    }
}

impl From<i32> for OrbitUncertainty {
    fn from(c: i32) -> Self {
        OrbitUncertainty::Class(c as i64)
    }
}

impl From<u8> for OrbitUncertainty {
    fn from(c: u8) -> Self {
        OrbitUncertainty::Class(c as i64)
    }
}

impl From<&str> for OrbitUncertainty {
    fn from(s: &str) -> Self {
        OrbitUncertainty::Label(s.to_string())
    }
}

impl From<String> for OrbitUncertainty {
    fn from(s: String) -> Self {
        OrbitUncertainty::Label(s)
    }
}

impl FromStr for OrbitUncertainty {
    type Err = std::convert::Infallible;

    /// - Integer text → `Class(i64)`
    /// - Otherwise    → `Label(String)` (resolved to the default later)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i64>() {
            Ok(c) => Ok(OrbitUncertainty::Class(c)),
            Err(_) => Ok(OrbitUncertainty::Label(s.to_string())),
        }
    }
}

/// Outcome of an uncertainty lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedUncertainty {
    /// Table class that matched, `None` when the default was substituted.
    pub class: Option<u8>,
    /// Fractional position uncertainty (sigma = coefficient × miss distance).
    pub coefficient: f64,
    /// `true` when the input was not a key of the table.
    pub used_default: bool,
}

impl ResolvedUncertainty {
    /// Coefficient expressed as a percentage.
    pub fn percent(&self) -> f64 {
        self.coefficient * 100.0
    }
}

/// Immutable lookup table from orbit class to fractional position uncertainty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyTable {
    coefficients: Vec<f64>,
    default_coefficient: f64,
}

impl Default for UncertaintyTable {
    fn default() -> Self {
        UncertaintyTable {
            coefficients: UNCERTAINTY_COEFFICIENTS.to_vec(),
            default_coefficient: DEFAULT_UNCERTAINTY_COEFFICIENT,
        }
    }
}

impl UncertaintyTable {
    /// Build a custom table; index `i` of `coefficients` is class `i`.
    ///
    /// Arguments
    /// -----------------
    /// * `coefficients`: Per-class fractional uncertainties (at most 256 classes).
    /// * `default_coefficient`: Value substituted for unknown classes.
    ///
    /// Return
    /// ----------
    /// * `None` if any coefficient is negative or not finite, or if more than 256 classes
    ///   are given.
    pub fn new(coefficients: Vec<f64>, default_coefficient: f64) -> Option<Self> {
        let valid = |c: &f64| c.is_finite() && *c >= 0.0;
        if coefficients.len() > u8::MAX as usize + 1
            || !coefficients.iter().all(valid)
            || !valid(&default_coefficient)
        {
            return None;
        }
        Some(UncertaintyTable {
            coefficients,
            default_coefficient,
        })
    }

    /// Number of classes in the table.
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn default_coefficient(&self) -> f64 {
        self.default_coefficient
    }

    /// Coefficient of an exact table class, if present.
    pub fn coefficient(&self, class: u8) -> Option<f64> {
        self.coefficients.get(class as usize).copied()
    }

    /// Resolve an orbit uncertainty into a coefficient, falling back to the default.
    ///
    /// Arguments
    /// -----------------
    /// * `orbit_uncertainty`: Integer class or numeric label.
    ///
    /// Return
    /// ----------
    /// * A [`ResolvedUncertainty`]; `used_default` is set when no table class matched.
    pub fn resolve(&self, orbit_uncertainty: &OrbitUncertainty) -> ResolvedUncertainty {
        let matched = orbit_uncertainty
            .as_class()
            .and_then(|c| u8::try_from(c).ok())
            .and_then(|c| self.coefficient(c).map(|coef| (c, coef)));

        match matched {
            Some((class, coefficient)) => ResolvedUncertainty {
                class: Some(class),
                coefficient,
                used_default: false,
            },
            None => {
                debug!(
                    orbit_uncertainty = %orbit_uncertainty,
                    default = self.default_coefficient,
                    "unrecognized orbit uncertainty class, using default coefficient"
                );
                ResolvedUncertainty {
                    class: None,
                    coefficient: self.default_coefficient,
                    used_default: true,
                }
            }
        }
    }
}

/// Resolve a class against the default table and return only the coefficient.
///
/// See also
/// ------------
/// * [`UncertaintyTable::resolve`] – Full lookup, including the default flag.
pub fn resolve_uncertainty(orbit_uncertainty: impl Into<OrbitUncertainty>) -> f64 {
    UncertaintyTable::default()
        .resolve(&orbit_uncertainty.into())
        .coefficient
}

#[cfg(test)]
mod uncertainty_test {
    use super::*;

    #[test]
    fn test_table_values() {
        let table = UncertaintyTable::default();
        let expected = [0.01, 0.02, 0.05, 0.10, 0.15, 0.20, 0.30, 0.40, 0.50, 0.60];
        for (class, coef) in expected.iter().enumerate() {
            let r = table.resolve(&OrbitUncertainty::Class(class as i64));
            assert_eq!(r.coefficient, *coef);
            assert_eq!(r.class, Some(class as u8));
            assert!(!r.used_default);
        }
    }

    #[test]
    fn test_table_is_monotonic() {
        let table = UncertaintyTable::default();
        let coefs: Vec<f64> = (0..10).map(|c| table.coefficient(c).unwrap()).collect();
        assert!(coefs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_string_classes_are_coerced() {
        let table = UncertaintyTable::default();
        assert_eq!(table.resolve(&"7".into()).coefficient, 0.40);
        assert_eq!(table.resolve(&" 0 ".into()).coefficient, 0.01);
        assert_eq!(table.resolve(&"7".into()).class, Some(7));
    }

    #[test]
    fn test_default_fallback() {
        assert_eq!(resolve_uncertainty(11_i64), 0.10);
        assert_eq!(resolve_uncertainty("bogus"), 0.10);
        assert_eq!(resolve_uncertainty(-1_i64), 0.10);
        assert_eq!(resolve_uncertainty(""), 0.10);
        assert_eq!(resolve_uncertainty(11_i64), resolve_uncertainty("bogus"));

        // Same coefficient as class 3, but distinguishable
        let table = UncertaintyTable::default();
        let unknown = table.resolve(&11_i64.into());
        let three = table.resolve(&3_i64.into());
        assert_eq!(unknown.coefficient, three.coefficient);
        assert!(unknown.used_default);
        assert!(!three.used_default);
        assert_eq!(unknown.class, None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "4".parse::<OrbitUncertainty>().unwrap(),
            OrbitUncertainty::Class(4)
        );
        assert_eq!(
            "x".parse::<OrbitUncertainty>().unwrap(),
            OrbitUncertainty::Label("x".into())
        );
    }

    #[test]
    fn test_custom_table() {
        let table = UncertaintyTable::new(vec![0.5, 0.25], 0.9).unwrap();
        assert_eq!(table.resolve(&1_i64.into()).coefficient, 0.25);
        assert_eq!(table.resolve(&2_i64.into()).coefficient, 0.9);
        assert!(UncertaintyTable::new(vec![-0.1], 0.1).is_none());
        assert!(UncertaintyTable::new(vec![0.1], f64::NAN).is_none());
    }
}
