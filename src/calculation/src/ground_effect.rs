/// In-ground-effect thrust correction `T_ige = T / (1 − r² / (16 h²))`.
///
/// The denominator vanishes at `h = r/4`. No clamp is applied: heights at or
/// below the singularity are rejected, heights close to it are logged.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ensure_finite, ensure_positive, Result, RotorError};
use crate::geometry::RotorGeometry;

/// Heights below this multiple of `r/4` are reported as near-singular.
const NEAR_SINGULARITY_FACTOR: f64 = 2.0;

/// Thrust in ground effect for rotor radius `radius` at height `height` (m).
pub fn ground_effect(thrust: f64, radius: f64, height: f64) -> Result<f64> {
    let thrust = ensure_finite("thrust", thrust)?;
    let radius = ensure_positive("rotor radius", radius)?;
    let height = ensure_finite("rotor height", height)?;

    let singular_height = radius / 4.0;
    if height <= singular_height {
        return Err(RotorError::DivisionSingularity {
            what: format!("rotor height {height} m is at or below r/4 = {singular_height} m"),
        });
    }
    if height < NEAR_SINGULARITY_FACTOR * singular_height {
        warn!(height, singular_height, "rotor height is close to the ground-effect singularity");
    }

    Ok(thrust / (1.0 - radius * radius / (16.0 * height * height)))
}

/// One sample of a ground-effect curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundEffectPoint {
    pub height: f64,      // Rotor height above ground (m)
    pub thrust_ige: f64,  // Thrust in ground effect (N)
}

/// Ground-effect thrust at each height. Fails on the first invalid height.
pub fn ground_effect_curve(
    thrust: f64,
    geometry: &RotorGeometry,
    heights: &[f64],
) -> Result<Vec<GroundEffectPoint>> {
    heights
        .iter()
        .map(|&height| {
            Ok(GroundEffectPoint {
                height,
                thrust_ige: ground_effect(thrust, geometry.radius, height)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RotorSpec;
    use approx::assert_relative_eq;

    const RADIUS: f64 = 10.645;
    const THRUST: f64 = 127_530.0;

    #[test]
    fn test_formula() {
        // h = r/2 → 1 − 1/4
        let t = ground_effect(THRUST, RADIUS, RADIUS / 2.0).unwrap();
        assert_relative_eq!(t, THRUST / 0.75, max_relative = 1e-12);
    }

    #[test]
    fn test_always_above_free_air_thrust() {
        for i in 1..=200 {
            let h = RADIUS / 4.0 + i as f64 * 0.25;
            let t = ground_effect(THRUST, RADIUS, h).unwrap();
            assert!(t > THRUST, "h={h}");
        }
    }

    #[test]
    fn test_tends_to_free_air_thrust() {
        let mut previous = f64::INFINITY;
        for h in [5.0, 10.0, 50.0, 100.0, 1_000.0, 100_000.0] {
            let t = ground_effect(THRUST, RADIUS, h).unwrap();
            assert!(t < previous);
            previous = t;
        }
        assert_relative_eq!(previous, THRUST, max_relative = 1e-9);
    }

    #[test]
    fn test_singularity_is_an_error() {
        assert!(matches!(
            ground_effect(THRUST, RADIUS, RADIUS / 4.0),
            Err(RotorError::DivisionSingularity { .. })
        ));
        assert!(matches!(
            ground_effect(THRUST, RADIUS, 1.0),
            Err(RotorError::DivisionSingularity { .. })
        ));
        assert!(matches!(
            ground_effect(THRUST, RADIUS, f64::NAN),
            Err(RotorError::InvalidInput { .. })
        ));
        assert!(ground_effect(THRUST, 0.0, 10.0).is_err());
    }

    #[test]
    fn test_curve() {
        let geometry = RotorGeometry::from_spec(&RotorSpec::reference_utility()).unwrap();
        let heights: Vec<f64> = (0..50).map(|i| 5.65 + i as f64 * (50.0 - 5.65) / 49.0).collect();
        let curve = ground_effect_curve(THRUST, &geometry, &heights).unwrap();
        assert_eq!(curve.len(), 50);
        assert_eq!(curve[0].height, 5.65);
        for pair in curve.windows(2) {
            assert!(pair[1].thrust_ige < pair[0].thrust_ige);
        }
        assert!(ground_effect_curve(THRUST, &geometry, &[10.0, 2.0]).is_err());
    }
}
