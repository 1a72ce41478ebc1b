/// Physical constants, empirical correlations and solver settings.
///
/// Every literal in this module is part of the external contract of the
/// solvers: changing one changes the numbers a user compares against
/// previously published rotor studies. Tunable iteration limits live in
/// [`SolverSettings`] rather than as bare literals inside the solvers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RotorError;

/// Gravitational acceleration (m/s²)
pub const GRAVITY: f64 = 9.81;

/// Watts to shaft horsepower.
pub const WATTS_TO_SHP: f64 = 0.00134102209;

/// Forward-flight profile-power growth with advance ratio: `1 + 4.65 μ²`.
pub const FORWARD_PROFILE_COEFF: f64 = 4.65;

/// Tip-loss factor folded into the blade-element thrust integral.
pub const HOVER_TIP_LOSS_FACTOR: f64 = 0.97;

/// Standard sea-level air density (kg/m³)
pub const SEA_LEVEL_DENSITY: f64 = 1.225;

/// Speed of sound used to turn tip Mach into tip speed (m/s)
pub const SPEED_OF_SOUND: f64 = 343.0;

/// Local angle-of-attack floor before any polar lookup (deg)
pub const ALPHA_FLOOR_DEG: f64 = -1.0;

/// Local angle-of-attack ceiling before any polar lookup (deg)
pub const ALPHA_CEILING_DEG: f64 = 20.0;

/// Power multiplier for the tail rotor, applied by performance callers only.
pub const TAIL_ROTOR_POWER_FACTOR: f64 = 1.13;

/// Breguet range constant for kilometres (366 instead of 325 for nautical miles).
pub const BREGUET_KM_CONSTANT: f64 = 366.0;

/// Coefficients of the NACA 0012 mean drag correlation `c0 + c1·α + c2·α²`.
pub mod drag_correlation {
    /// Zero-lift drag
    pub const C0: f64 = 0.0087;
    /// Linear term (per radian)
    pub const C1: f64 = -0.0216;
    /// Quadratic term (per radian²)
    pub const C2: f64 = 0.4;
}

/// Mean blade drag coefficient from the NACA 0012 correlation.
///
/// Applied to every airfoil regardless of the polar in use; `alpha_rad` is the
/// mean blade angle of attack in radians.
#[inline]
pub fn naca0012_drag(alpha_rad: f64) -> f64 {
    drag_correlation::C0 + drag_correlation::C1 * alpha_rad + drag_correlation::C2 * alpha_rad * alpha_rad
}

/// Most pitches a search grid may hold.
pub const MAX_PITCH_GRID_POINTS: usize = 10_000;

/// Starting point of the induced-velocity iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InductionSeed {
    /// `v = 0` at every station
    Zero,
    /// Root of the momentum balance with a linear lift curve and no drag
    LinearLift,
}

/// Integrand of the blade-element thrust sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThrustIntegrand {
    /// `r·v²`
    Squared,
    /// `r·v·|v|`; stations with reversed flow subtract thrust
    Signed,
}

/// Iteration limits and grids shared by the hover and Wald solvers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Number of radial blade-element stations
    pub stations: usize,

    /// L2 tolerance between successive induced-velocity vectors (m/s)
    pub inner_tolerance: f64,

    /// Cap on inner induced-velocity iterations per pitch
    pub inner_max_iterations: usize,

    /// Fraction of each inner update that is applied (1.0 = plain substitution)
    pub inner_relaxation: f64,

    /// Starting induced velocity of the inner iteration
    pub inner_seed: InductionSeed,

    /// How station induced velocities are summed into thrust
    pub thrust_integrand: ThrustIntegrand,

    /// First collective pitch tried (deg)
    pub pitch_start_deg: f64,

    /// Last collective pitch tried (deg)
    pub pitch_end_deg: f64,

    /// Collective pitch increment (deg)
    pub pitch_step_deg: f64,

    /// Damping step of the Wald's equation iteration
    pub wald_step: f64,

    /// Fixed number of Wald's equation iterations
    pub wald_iterations: usize,
}

impl SolverSettings {
    /// Settings matching the published reference outputs.
    ///
    /// Plain substitution from `v = 0` with `r·v²` thrust. At inboard stations
    /// the update oscillates, so thrust is not strictly monotonic in pitch
    /// (on the reference rotor it dips between 3.0° and 3.5°).
    pub const fn new() -> Self {
        Self {
            stations: 10,
            inner_tolerance: 1e-12,
            inner_max_iterations: 10,
            inner_relaxation: 1.0,
            inner_seed: InductionSeed::Zero,
            thrust_integrand: ThrustIntegrand::Squared,
            pitch_start_deg: 0.0,
            pitch_end_deg: 15.0,
            pitch_step_deg: 0.5,
            wald_step: 0.02,
            wald_iterations: 100,
        }
    }

    /// Damped variant: linear-lift start, half-step updates, signed thrust.
    ///
    /// Thrust rises monotonically with pitch. Numbers differ from [`SolverSettings::new`]
    /// by a few percent.
    pub const fn stabilized() -> Self {
        let mut settings = Self::new();
        settings.inner_relaxation = 0.5;
        settings.inner_seed = InductionSeed::LinearLift;
        settings.thrust_integrand = ThrustIntegrand::Signed;
        settings
    }

    /// Reject settings the solvers cannot run with.
    pub fn validate(&self) -> Result<(), RotorError> {
        if self.stations == 0 {
            return Err(RotorError::invalid("stations", "at least one blade station is required"));
        }
        if self.inner_max_iterations == 0 {
            return Err(RotorError::invalid("inner_max_iterations", "must be at least 1"));
        }
        if !(self.inner_tolerance >= 0.0) {
            return Err(RotorError::invalid("inner_tolerance", "must be a non-negative number"));
        }
        if !(self.inner_relaxation > 0.0 && self.inner_relaxation <= 1.0) {
            return Err(RotorError::invalid("inner_relaxation", "must lie in (0, 1]"));
        }
        if !self.pitch_start_deg.is_finite() || !self.pitch_end_deg.is_finite() {
            return Err(RotorError::invalid("pitch grid", "start and end must be finite"));
        }
        if !(self.pitch_step_deg > 0.0) || !self.pitch_step_deg.is_finite() {
            return Err(RotorError::invalid("pitch_step_deg", "must be positive"));
        }
        if !(self.pitch_end_deg >= self.pitch_start_deg) {
            return Err(RotorError::invalid("pitch_end_deg", "pitch grid is empty"));
        }
        let steps = (self.pitch_end_deg - self.pitch_start_deg) / self.pitch_step_deg;
        if !(steps < MAX_PITCH_GRID_POINTS as f64) {
            return Err(RotorError::invalid(
                "pitch grid",
                format!("more than {MAX_PITCH_GRID_POINTS} pitches"),
            ));
        }
        if !(self.wald_step > 0.0 && self.wald_step.is_finite()) {
            return Err(RotorError::invalid("wald_step", "must be positive"));
        }
        Ok(())
    }

    /// Collective pitch grid, inclusive of both ends.
    ///
    /// Values are built as `start + i·step` so the grid does not accumulate
    /// rounding error across steps. Never longer than [`MAX_PITCH_GRID_POINTS`];
    /// a grid that fails [`SolverSettings::validate`] collapses to its start.
    pub fn pitch_grid(&self) -> Vec<f64> {
        let steps = (self.pitch_end_deg - self.pitch_start_deg) / self.pitch_step_deg;
        let count = if steps.is_finite() && steps >= 0.0 {
            ((steps + 1e-9).floor() as usize).min(MAX_PITCH_GRID_POINTS - 1) + 1
        } else {
            1
        };
        (0..count)
            .map(|i| self.pitch_start_deg + i as f64 * self.pitch_step_deg)
            .collect()
    }

    /// Get a summary of the settings for reporting.
    pub fn summary(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("stations".to_string(), self.stations.to_string());
        map.insert("inner tolerance".to_string(), format!("{:.1e}", self.inner_tolerance));
        map.insert("inner cap".to_string(), self.inner_max_iterations.to_string());
        map.insert("inner relaxation".to_string(), format!("{:.2}", self.inner_relaxation));
        map.insert("inner seed".to_string(), format!("{:?}", self.inner_seed));
        map.insert("thrust integrand".to_string(), format!("{:?}", self.thrust_integrand));
        map.insert(
            "pitch grid (deg)".to_string(),
            format!("{}..={} step {}", self.pitch_start_deg, self.pitch_end_deg, self.pitch_step_deg),
        );
        map.insert("wald step".to_string(), format!("{}", self.wald_step));
        map.insert("wald iterations".to_string(), self.wald_iterations.to_string());
        map
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_contract_literals() {
        assert_eq!(GRAVITY, 9.81);
        assert_eq!(WATTS_TO_SHP, 0.00134102209);
        assert_eq!(FORWARD_PROFILE_COEFF, 4.65);
        assert_eq!(HOVER_TIP_LOSS_FACTOR, 0.97);
    }

    #[test]
    fn test_default_settings() {
        let s = SolverSettings::default();
        assert_eq!(s.stations, 10);
        assert_eq!(s.inner_tolerance, 1e-12);
        assert_eq!(s.inner_max_iterations, 10);
        assert_eq!(s.wald_step, 0.02);
        assert_eq!(s.wald_iterations, 100);
        assert_eq!(s.inner_relaxation, 1.0);
        assert_eq!(s.inner_seed, InductionSeed::Zero);
        assert_eq!(s.thrust_integrand, ThrustIntegrand::Squared);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_stabilized_settings() {
        let s = SolverSettings::stabilized();
        assert_eq!(s.inner_relaxation, 0.5);
        assert_eq!(s.inner_seed, InductionSeed::LinearLift);
        assert_eq!(s.thrust_integrand, ThrustIntegrand::Signed);
        assert_eq!(s.pitch_grid(), SolverSettings::new().pitch_grid());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_unbounded_pitch_grid_is_rejected() {
        let mut s = SolverSettings::new();
        s.pitch_end_deg = f64::INFINITY;
        assert!(s.validate().is_err());
        assert_eq!(s.pitch_grid(), vec![0.0]);

        let mut s = SolverSettings::new();
        s.pitch_start_deg = f64::NAN;
        assert!(s.validate().is_err());
        assert_eq!(s.pitch_grid().len(), 1);

        let mut s = SolverSettings::new();
        s.pitch_end_deg = 1e12;
        assert!(s.validate().is_err());
        assert_eq!(s.pitch_grid().len(), MAX_PITCH_GRID_POINTS);

        let mut s = SolverSettings::new();
        s.pitch_step_deg = f64::INFINITY;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_pitch_grid() {
        let grid = SolverSettings::new().pitch_grid();
        assert_eq!(grid.len(), 31);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[1], 0.5);
        assert_eq!(grid[30], 15.0);
    }

    #[test]
    fn test_naca0012_drag() {
        assert_relative_eq!(naca0012_drag(0.0), 0.0087);
        // 0.0087 - 0.0216 * 0.1 + 0.4 * 0.01
        assert_relative_eq!(naca0012_drag(0.1), 0.01054, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_settings() {
        let mut s = SolverSettings::new();
        s.stations = 0;
        assert!(s.validate().is_err());

        let mut s = SolverSettings::new();
        s.inner_relaxation = 0.0;
        assert!(s.validate().is_err());

        let mut s = SolverSettings::new();
        s.pitch_end_deg = -1.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_summary() {
        let summary = SolverSettings::new().summary();
        assert_eq!(summary.get("stations").map(String::as_str), Some("10"));
        assert!(summary.contains_key("pitch grid (deg)"));
    }
}
