/// Static rotor geometry derived once from the user's sizing inputs.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants::SPEED_OF_SOUND;
use crate::error::{Result, RotorError};

/// User-facing rotor description, before any derived quantity is computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotorSpec {
    pub num_blades: u32,       // Number of blades
    pub chord: f64,            // Blade chord (m)
    pub diameter: f64,         // Rotor diameter (m)
    pub tip_mach: f64,         // Tip Mach number in hover
    pub speed_of_sound: f64,   // (m/s)
    pub washout_deg: f64,      // Linear twist, root minus tip pitch (deg)
    pub root_cutout: f64,      // Root cutout as a fraction of radius [0, 1)
}

impl RotorSpec {
    /// Reference utility helicopter: 21.29 m five-bladed rotor at tip Mach 0.624.
    pub const fn reference_utility() -> Self {
        Self {
            num_blades: 5,
            chord: 0.53,
            diameter: 21.29,
            tip_mach: 0.624,
            speed_of_sound: SPEED_OF_SOUND,
            washout_deg: 0.0,
            root_cutout: 0.1,
        }
    }
}

impl Default for RotorSpec {
    fn default() -> Self {
        Self::reference_utility()
    }
}

/// Immutable rotor geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotorGeometry {
    /// Rotor radius (m)
    pub radius: f64,
    /// Angular speed (rad/s)
    pub omega: f64,
    /// Blade tip speed ω·r (m/s)
    pub tip_speed: f64,
    /// Annular disk area, full disk minus the root cutout hole (m²)
    pub disk_area: f64,
    /// Blade area over annular disk area, both outboard of the root cutout
    pub solidity: f64,
    /// Number of blades
    pub num_blades: u32,
    /// Blade chord (m)
    pub chord: f64,
    /// Linear washout from root to tip (deg)
    pub washout_deg: f64,
    /// Root cutout as a fraction of radius
    pub root_cutout: f64,
}

impl RotorGeometry {
    /// Derive geometry from a sizing spec.
    pub fn from_spec(spec: &RotorSpec) -> Result<Self> {
        if !(spec.speed_of_sound.is_finite() && spec.speed_of_sound > 0.0) {
            return Err(RotorError::InvalidGeometry("speed of sound must be positive".to_string()));
        }
        if !(spec.tip_mach.is_finite() && spec.tip_mach > 0.0) {
            return Err(RotorError::InvalidGeometry("tip Mach must be positive".to_string()));
        }
        let radius = spec.diameter / 2.0;
        let tip_speed = spec.tip_mach * spec.speed_of_sound;
        Self::build(spec.num_blades, spec.chord, radius, tip_speed / radius, spec.washout_deg, spec.root_cutout)
    }

    /// Derive geometry from a shaft speed in rpm instead of a tip Mach number.
    pub fn from_rpm(
        num_blades: u32,
        chord: f64,
        diameter: f64,
        rpm: f64,
        washout_deg: f64,
        root_cutout: f64,
    ) -> Result<Self> {
        Self::build(num_blades, chord, diameter / 2.0, rpm * PI / 30.0, washout_deg, root_cutout)
    }

    fn build(
        num_blades: u32,
        chord: f64,
        radius: f64,
        omega: f64,
        washout_deg: f64,
        root_cutout: f64,
    ) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(RotorError::InvalidGeometry(format!("radius must be positive, got {radius}")));
        }
        if num_blades == 0 {
            return Err(RotorError::InvalidGeometry("at least one blade is required".to_string()));
        }
        if !(chord.is_finite() && chord > 0.0) {
            return Err(RotorError::InvalidGeometry(format!("chord must be positive, got {chord}")));
        }
        if !(omega.is_finite() && omega > 0.0) {
            return Err(RotorError::InvalidGeometry(format!("rotor speed must be positive, got {omega}")));
        }
        if !(0.0..1.0).contains(&root_cutout) {
            return Err(RotorError::InvalidGeometry(format!(
                "root cutout must lie in [0, 1), got {root_cutout}"
            )));
        }
        if !washout_deg.is_finite() {
            return Err(RotorError::InvalidGeometry("washout must be finite".to_string()));
        }

        let disk_area = PI * radius.powi(2) - PI * (radius * root_cutout).powi(2);
        let blade_span = radius * (1.0 - root_cutout);
        let solidity = num_blades as f64 * chord * blade_span / disk_area;

        Ok(Self {
            radius,
            omega,
            tip_speed: omega * radius,
            disk_area,
            solidity,
            num_blades,
            chord,
            washout_deg,
            root_cutout,
        })
    }

    /// Radius of the root cutout (m)
    #[inline]
    pub fn root_radius(&self) -> f64 {
        self.radius * self.root_cutout
    }

    /// Equal-width annular stations from the root cutout to the tip.
    pub fn stations(&self, count: usize) -> BladeStations {
        let root = self.root_radius();
        let width = (self.radius - root) / count as f64;
        let radii = (0..count).map(|i| root + (i as f64 + 0.5) * width).collect();
        BladeStations { radii, width }
    }

    /// Washout pitch offset at radius `r` (deg), zero at the root and `-washout` at the tip.
    #[inline]
    pub fn twist_offset_deg(&self, r: f64) -> f64 {
        let root = self.root_radius();
        -self.washout_deg * (r - root) / (self.radius - root)
    }

    /// `ρ·N·c·r⁴·ω³ / 8`, the profile-power factor multiplied by a drag coefficient.
    #[inline]
    pub fn profile_power_factor(&self, density: f64) -> f64 {
        density * self.num_blades as f64 * self.chord * self.radius.powi(4) * self.omega.powi(3) / 8.0
    }
}

/// Midpoint radii of the blade elements.
#[derive(Debug, Clone, PartialEq)]
pub struct BladeStations {
    pub radii: Vec<f64>, // Station midpoint radius (m)
    pub width: f64,      // Element width dr (m)
}
