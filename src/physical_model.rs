//! # Gravitational focusing model
//!
//! A body passing Earth on an unperturbed (straight-line) trajectory is bent inward by
//! Earth's gravity. The effective capture radius is therefore larger than the physical
//! radius, by the classic two-body focusing factor:
//!
//! ```text
//! r_critical = R_earth · sqrt(1 + (v_esc / v_rel)²)
//! ```
//!
//! where `v_rel` is the relative velocity at close approach. Any object whose
//! unperturbed miss distance falls below `r_critical` is eventually deflected into
//! the planet.
//!
//! The constants are carried by [`PhysicalModel`] rather than read from globals so that
//! alternate bodies or alternate values can be injected (tests, sensitivity studies).
//!
//! ## See also
//! ------------
//! * [`crate::constants::R_EARTH`] / [`crate::constants::V_ESCAPE`] – Default constants.
//! * [`crate::impactor::Impactor`] – Façade owning one model instance.
use serde::{Deserialize, Serialize};

use crate::{
    constants::{Kilometer, KmPerSec, R_EARTH, V_ESCAPE},
    impactor_errors::ImpactorError,
};

/// Physical constants of the target body used to compute its capture radius.
///
/// Only built through [`PhysicalModel::new`] or [`Default`]; deserialized models are
/// validated the same way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PhysicalModelFields")]
pub struct PhysicalModel {
    /// Physical radius of the body (km).
    body_radius_km: Kilometer,
    /// Escape velocity at the surface (km/s).
    escape_velocity_km_s: KmPerSec,
}

#[derive(Deserialize)]
struct PhysicalModelFields {
    body_radius_km: Kilometer,
    escape_velocity_km_s: KmPerSec,
}

impl TryFrom<PhysicalModelFields> for PhysicalModel {
    type Error = ImpactorError;

    fn try_from(fields: PhysicalModelFields) -> Result<Self, Self::Error> {
        PhysicalModel::new(fields.body_radius_km, fields.escape_velocity_km_s)
    }
}

impl Default for PhysicalModel {
    fn default() -> Self {
        PhysicalModel {
            body_radius_km: R_EARTH,
            escape_velocity_km_s: V_ESCAPE,
        }
    }
}

impl PhysicalModel {
    /// Build a model for an arbitrary body.
    ///
    /// Arguments
    /// -----------------
    /// * `body_radius_km`: Physical radius (km), must be finite and > 0.
    /// * `escape_velocity_km_s`: Surface escape velocity (km/s), must be finite and >= 0.
    ///
    /// Return
    /// ----------
    /// * The model, or [`ImpactorError::InvalidParameter`] if a constant is out of range.
    pub fn new(
        body_radius_km: Kilometer,
        escape_velocity_km_s: KmPerSec,
    ) -> Result<Self, ImpactorError> {
        if !(body_radius_km.is_finite() && body_radius_km > 0.0) {
            return Err(ImpactorError::InvalidParameter(format!(
                "body radius must be finite and > 0, got {body_radius_km}"
            )));
        }
        if !(escape_velocity_km_s.is_finite() && escape_velocity_km_s >= 0.0) {
            return Err(ImpactorError::InvalidParameter(format!(
                "escape velocity must be finite and >= 0, got {escape_velocity_km_s}"
            )));
        }
        Ok(PhysicalModel {
            body_radius_km,
            escape_velocity_km_s,
        })
    }

    pub fn body_radius_km(&self) -> Kilometer {
        self.body_radius_km
    }

    pub fn escape_velocity_km_s(&self) -> KmPerSec {
        self.escape_velocity_km_s
    }

    /// Gravitational focusing factor `sqrt(1 + (v_esc / v)²)`, always >= 1.
    ///
    /// Arguments
    /// -----------------
    /// * `velocity_km_s`: Relative velocity at close approach (km/s).
    ///
    /// Return
    /// ----------
    /// * The dimensionless factor, or an error if the velocity is not finite or not > 0.
    pub fn focusing_factor(&self, velocity_km_s: KmPerSec) -> Result<f64, ImpactorError> {
        if !velocity_km_s.is_finite() {
            return Err(ImpactorError::NonFiniteInput {
                field: "velocity_km_s",
                value: velocity_km_s,
            });
        }
        if velocity_km_s <= 0.0 {
            return Err(ImpactorError::InvalidVelocity(velocity_km_s));
        }

        let ratio = self.escape_velocity_km_s / velocity_km_s;
        let factor = (1.0 + ratio * ratio).sqrt();

        // Tiny positive velocities overflow the ratio
        if !factor.is_finite() {
            return Err(ImpactorError::InvalidVelocity(velocity_km_s));
        }
        Ok(factor)
    }

    /// Effective (gravitationally focused) capture radius in km.
    ///
    /// Arguments
    /// -----------------
    /// * `velocity_km_s`: Relative velocity at close approach (km/s).
    ///
    /// Return
    /// ----------
    /// * `r_critical >= body_radius_km`, strictly decreasing with velocity.
    ///
    /// Errors
    /// ----------
    /// * [`ImpactorError::NonFiniteInput`] for NaN / infinite velocities.
    /// * [`ImpactorError::InvalidVelocity`] for `velocity_km_s <= 0`.
    /// * [`ImpactorError::NonFiniteInput`] on `r_critical_km` if the product overflows.
    pub fn critical_radius(&self, velocity_km_s: KmPerSec) -> Result<Kilometer, ImpactorError> {
        let r_critical = self.body_radius_km * self.focusing_factor(velocity_km_s)?;
        if !r_critical.is_finite() {
            return Err(ImpactorError::NonFiniteInput {
                field: "r_critical_km",
                value: r_critical,
            });
        }
        Ok(r_critical)
    }
}

/// Critical radius of Earth with the default constants.
///
/// See also
/// ------------
/// * [`PhysicalModel::critical_radius`] – Same computation with injectable constants.
pub fn critical_radius(velocity_km_s: KmPerSec) -> Result<Kilometer, ImpactorError> {
    PhysicalModel::default().critical_radius(velocity_km_s)
}

#[cfg(test)]
mod physical_model_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_critical_radius_apophis_velocity() {
        let r = critical_radius(7.4).unwrap();
        let expected = 6378.0 * (1.0_f64 + (11.2_f64 / 7.4).powi(2)).sqrt();
        assert_relative_eq!(r, expected, epsilon = 1e-9);
        assert_relative_eq!(r, 11_570.0, max_relative = 1e-3);
    }

    #[test]
    fn test_critical_radius_ten_km_s() {
        let r = critical_radius(10.0).unwrap();
        assert_relative_eq!(r, 6378.0 * 2.2544_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_critical_radius_is_bounded_below_and_decreasing() {
        let velocities = [0.5, 1.0, 5.0, 11.2, 20.0, 42.0, 72.0, 1e4];
        let radii: Vec<f64> = velocities
            .iter()
            .map(|v| critical_radius(*v).unwrap())
            .collect();

        for r in &radii {
            assert!(*r >= R_EARTH);
        }
        for w in radii.windows(2) {
            assert!(w[0] > w[1], "radius must strictly decrease: {w:?}");
        }
        assert_relative_eq!(radii[radii.len() - 1], R_EARTH, max_relative = 1e-5);
    }

    #[test]
    fn test_invalid_velocities() {
        assert_eq!(
            critical_radius(0.0),
            Err(ImpactorError::InvalidVelocity(0.0))
        );
        assert_eq!(
            critical_radius(-3.0),
            Err(ImpactorError::InvalidVelocity(-3.0))
        );
        assert!(matches!(
            critical_radius(f64::NAN),
            Err(ImpactorError::NonFiniteInput {
                field: "velocity_km_s",
                ..
            })
        ));
        assert!(matches!(
            critical_radius(f64::INFINITY),
            Err(ImpactorError::NonFiniteInput { .. })
        ));
        assert_eq!(
            critical_radius(1e-300),
            Err(ImpactorError::InvalidVelocity(1e-300))
        );
    }

    #[test]
    fn test_custom_model() {
        let no_gravity = PhysicalModel::new(1737.4, 0.0).unwrap();
        assert_relative_eq!(no_gravity.critical_radius(3.0).unwrap(), 1737.4);
        assert_relative_eq!(no_gravity.focusing_factor(3.0).unwrap(), 1.0);

        assert!(PhysicalModel::new(0.0, 11.2).is_err());
        assert!(PhysicalModel::new(f64::NAN, 11.2).is_err());
        assert!(PhysicalModel::new(6378.0, f64::NAN).is_err());
        assert_eq!(no_gravity.body_radius_km(), 1737.4);
        assert_eq!(no_gravity.escape_velocity_km_s(), 0.0);
    }

    #[test]
    fn test_deserialized_model_is_validated() {
        let moon: PhysicalModel =
            serde_json::from_str(r#"{ "body_radius_km": 1737.4, "escape_velocity_km_s": 2.38 }"#)
                .unwrap();
        assert_eq!(moon, PhysicalModel::new(1737.4, 2.38).unwrap());

        let err = serde_json::from_str::<PhysicalModel>(
            r#"{ "body_radius_km": -1.0, "escape_velocity_km_s": 11.2 }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("body radius"), "{err}");

        let round_trip: PhysicalModel =
            serde_json::from_str(&serde_json::to_string(&PhysicalModel::default()).unwrap())
                .unwrap();
        assert_eq!(round_trip, PhysicalModel::default());
    }

    #[test]
    fn test_overflowing_radius_is_reported() {
        let huge = PhysicalModel::new(f64::MAX, 11.2).unwrap();
        assert!(matches!(
            huge.critical_radius(1.0),
            Err(ImpactorError::NonFiniteInput {
                field: "r_critical_km",
                ..
            })
        ));
    }
}
