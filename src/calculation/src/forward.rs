/// Steady level forward-flight power breakdown on top of a hover solution.
///
/// Induced power follows the hover value scaled by the Wald's equation
/// downwash ratio, profile power grows as `1 + 4.65 μ²`, and parasite power is
/// flat-plate drag times speed.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{SolverSettings, FORWARD_PROFILE_COEFF, WATTS_TO_SHP};
use crate::error::{ensure_finite, ensure_positive, Result, RotorError};
use crate::hover::HoverState;
use crate::walds::WaldsEquationSolver;

/// Forward-flight operating point derived from exactly one [`HoverState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardFlightState {
    pub velocity: f64,           // Free-stream velocity (m/s)
    pub density: f64,            // Air density (kg/m³)
    pub flat_plate_area: f64,    // Equivalent parasite area (m²)
    pub advance_ratio: f64,      // μ = V / (ω r)
    pub normalized_speed: f64,   // λ = V / v0
    pub downwash_ratio: f64,     // v / v0 from Wald's equation
    pub induced_power: f64,      // (W)
    pub profile_power: f64,      // (W)
    pub parasite_power: f64,     // (W)
    pub total_power: f64,        // (W)
    pub horsepower: f64,         // Total shaft horsepower
    pub induced_drag: f64,       // (N)
    pub profile_drag: f64,       // Equivalent profile drag P0 / V (N)
    pub body_drag: f64,          // Parasite drag (N)
}

impl ForwardFlightState {
    /// Sum of induced, profile and body drag (N)
    pub fn effective_drag(&self) -> f64 {
        self.induced_drag + self.profile_drag + self.body_drag
    }

    /// Induced power in shaft horsepower.
    pub fn induced_shp(&self) -> f64 {
        self.induced_power * WATTS_TO_SHP
    }

    /// Profile power in shaft horsepower.
    pub fn profile_shp(&self) -> f64 {
        self.profile_power * WATTS_TO_SHP
    }

    /// Parasite power in shaft horsepower.
    pub fn parasite_shp(&self) -> f64 {
        self.parasite_power * WATTS_TO_SHP
    }
}

/// Forward-flight power model. Stateless apart from the Wald solver settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ForwardFlightModel {
    walds: WaldsEquationSolver,
}

impl ForwardFlightModel {
    pub fn new(settings: &SolverSettings) -> Self {
        Self { walds: WaldsEquationSolver::from_settings(settings) }
    }

    /// Power breakdown at `velocity` for the rotor trimmed in `hover`.
    pub fn evaluate(
        &self,
        hover: &HoverState,
        velocity: f64,
        density: f64,
        flat_plate_area: f64,
    ) -> Result<ForwardFlightState> {
        let velocity = ensure_finite("velocity", velocity)?;
        if velocity < 0.0 {
            return Err(RotorError::invalid("velocity", format!("must not be negative, got {velocity}")));
        }
        ensure_positive("air density", density)?;
        let flat_plate_area = ensure_finite("flat plate area", flat_plate_area)?;
        if flat_plate_area < 0.0 {
            return Err(RotorError::invalid("flat plate area", "must not be negative"));
        }

        let v0 = hover.mean_induced_velocity;
        if v0 == 0.0 {
            return Err(RotorError::DivisionSingularity {
                what: "hover induced velocity is zero".to_string(),
            });
        }
        if !(v0 > 0.0) {
            return Err(RotorError::invalid("hover induced velocity", format!("must be positive, got {v0}")));
        }

        let g = &hover.geometry;
        let advance_ratio = velocity / (g.omega * g.radius);
        let normalized_speed = velocity / v0;
        let downwash_ratio = self.walds.solve(velocity, v0, 0.0)?;

        // The unconverged Wald iterate can go negative.
        let induced_power = (downwash_ratio * hover.induced_power).max(0.0);
        let induced_drag = induced_power / (2.0 * v0);

        let profile_power = g.profile_power_factor(density)
            * hover.cd_mean
            * (1.0 + FORWARD_PROFILE_COEFF * advance_ratio * advance_ratio);
        let profile_drag = if velocity > 0.0 { profile_power / velocity } else { 0.0 };

        let body_drag = density * velocity * velocity * flat_plate_area / 2.0;
        let parasite_power = body_drag * velocity;

        let total_power = induced_power + profile_power + parasite_power;

        Ok(ForwardFlightState {
            velocity,
            density,
            flat_plate_area,
            advance_ratio,
            normalized_speed,
            downwash_ratio,
            induced_power,
            profile_power,
            parasite_power,
            total_power,
            horsepower: total_power * WATTS_TO_SHP,
            induced_drag,
            profile_drag,
            body_drag,
        })
    }

    /// Evaluate many velocities in parallel. Results keep the input order.
    pub fn sweep(
        &self,
        hover: &HoverState,
        velocities: &[f64],
        density: f64,
        flat_plate_area: f64,
    ) -> Vec<Result<ForwardFlightState>> {
        velocities
            .par_iter()
            .map(|&v| self.evaluate(hover, v, density, flat_plate_area))
            .collect()
    }
}
