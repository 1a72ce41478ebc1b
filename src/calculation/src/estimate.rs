/// First-order rotor sizing from a single blade lift and drag coefficient.
///
/// No blade-element integration, no iteration: thrust `ρ·N·c·r³·ω²·cl/6`,
/// power from momentum theory plus blade profile drag. Good enough for
/// quick trade studies on small rotors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::WATTS_TO_SHP;
use crate::error::{ensure_finite, ensure_positive, Result, RotorError};
use crate::geometry::RotorGeometry;

/// Default tip-loss coefficient of the quick estimate.
pub const DEFAULT_TIP_LOSS: f64 = 0.95;

/// Blade-loading estimate for one rotor and one pair of section coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuickEstimate {
    geometry: RotorGeometry,
    cl: f64,        // Blade lift coefficient
    cd: f64,        // Blade drag coefficient
    tip_loss: f64,  // Tip-loss coefficient in (0, 1]
}

impl QuickEstimate {
    pub fn new(geometry: RotorGeometry, cl: f64, cd: f64, tip_loss: f64) -> Result<Self> {
        ensure_finite("lift coefficient", cl)?;
        ensure_finite("drag coefficient", cd)?;
        let tip_loss = ensure_positive("tip loss", tip_loss)?;
        if tip_loss > 1.0 {
            return Err(RotorError::invalid("tip loss", format!("must not exceed 1, got {tip_loss}")));
        }
        Ok(Self { geometry, cl, cd, tip_loss })
    }

    /// Rotor thrust (N)
    pub fn thrust(&self, density: f64) -> f64 {
        let g = &self.geometry;
        density * g.num_blades as f64 * g.chord * g.radius.powi(3) * g.omega.powi(2) * self.cl / 6.0
    }

    /// Induced plus profile power (W)
    pub fn power(&self, density: f64) -> f64 {
        let g = &self.geometry;
        let induced = self.thrust(density).max(0.0).powf(1.5) / (self.tip_loss * (2.0 * density * g.disk_area).sqrt());
        induced + g.profile_power_factor(density) * self.cd
    }

    /// Shaft horsepower.
    pub fn horsepower(&self, density: f64) -> f64 {
        self.power(density) * WATTS_TO_SHP
    }

    /// Get a summary of the estimate for reporting.
    pub fn summary(&self, density: f64) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("tip speed (m/s)".to_string(), format!("{:.2}", self.geometry.tip_speed));
        map.insert("disk area (m²)".to_string(), format!("{:.4}", self.geometry.disk_area));
        map.insert("thrust (N)".to_string(), format!("{:.3}", self.thrust(density)));
        map.insert("power (W)".to_string(), format!("{:.3}", self.power(density)));
        map.insert("horsepower".to_string(), format!("{:.4}", self.horsepower(density)));
        map
    }
}
