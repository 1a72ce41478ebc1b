/// Performance curves derived from a hover state and the forward-flight model.
///
/// This module turns a velocity sweep into the quantities used to size a
/// mission: power breakdown, effective drag and lift-to-drag ratio, fuel and
/// electric endurance and range, plus the downwash and figure-of-merit curves.
/// Samples where Wald's equation blows up are dropped with a warning instead of
/// failing the whole curve.

use std::collections::HashMap;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{BREGUET_KM_CONSTANT, TAIL_ROTOR_POWER_FACTOR};
use crate::error::{ensure_positive, Result, RotorError};
use crate::forward::{ForwardFlightModel, ForwardFlightState};
use crate::hover::HoverState;
use crate::walds::WaldsEquationSolver;

/// m/s to km/h
const MS_TO_KMH: f64 = 3.6;

/// Aircraft-level inputs for endurance and range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissionProfile {
    pub gross_kg: f64,           // Take-off mass (kg)
    pub fuel_kg: f64,            // Usable fuel (kg)
    pub sfc: f64,                // Specific fuel consumption (kg/kWh)
    pub transmission_loss: f64,  // Fraction of engine power lost in the drive train
    pub battery_kwh: f64,        // Battery capacity for the electric variant (kWh)
}

impl MissionProfile {
    /// Reject profiles the range and endurance formulas cannot use.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("gross weight", self.gross_kg)?;
        ensure_positive("specific fuel consumption", self.sfc)?;
        if !(self.fuel_kg >= 0.0 && self.fuel_kg < self.gross_kg) {
            return Err(RotorError::invalid("fuel", "must lie in [0, gross weight)"));
        }
        if !(0.0..1.0).contains(&self.transmission_loss) {
            return Err(RotorError::invalid("transmission loss", "must lie in [0, 1)"));
        }
        if !(self.battery_kwh >= 0.0 && self.battery_kwh.is_finite()) {
            return Err(RotorError::invalid("battery capacity", "must be a non-negative number"));
        }
        Ok(())
    }

    /// Shaft power needed from the engine, tail rotor and drive train included (kW)
    pub fn engine_power_kw(&self, rotor_power_w: f64) -> f64 {
        TAIL_ROTOR_POWER_FACTOR * rotor_power_w / 1000.0 / (1.0 - self.transmission_loss)
    }

    /// SFC referred to main-rotor power, used by the Breguet estimate.
    pub fn effective_sfc(&self) -> f64 {
        TAIL_ROTOR_POWER_FACTOR * self.sfc / (1.0 - self.transmission_loss)
    }
}

/// One velocity of a performance sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    /// Forward-flight state at this velocity
    pub state: ForwardFlightState,
    /// Induced + profile + body drag (N)
    pub effective_drag: f64,
    /// Hover thrust over effective drag
    pub lift_to_drag: f64,
}

impl PerformancePoint {
    pub fn velocity_kmh(&self) -> f64 {
        self.state.velocity * MS_TO_KMH
    }
}

/// Fuel-burning aircraft performance at one velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelPerformance {
    pub velocity_kmh: f64,    // (km/h)
    pub engine_power_kw: f64, // (kW)
    pub fuel_flow: f64,       // (kg/h)
    pub endurance_h: f64,     // (h)
    pub specific_range: f64,  // (km/kg)
    pub breguet_range_km: f64, // (km)
}

/// Battery-powered aircraft performance at one velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElectricPerformance {
    pub velocity_kmh: f64,   // (km/h)
    pub motor_power_kw: f64, // (kW)
    pub endurance_h: f64,    // (h)
    pub range_km: f64,       // (km)
}

/// Forward-flight sweep over a velocity grid for one hover state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceCurve {
    /// Hover thrust used as lift (N)
    pub lift: f64,
    /// Evaluated points, in input order
    pub points: Vec<PerformancePoint>,
    /// Velocities dropped because Wald's equation diverged (m/s)
    pub skipped: Vec<f64>,
}

impl PerformanceCurve {
    /// Evaluate `velocities` in parallel. Diverged samples are skipped; any other
    /// error aborts the curve.
    pub fn compute(
        model: &ForwardFlightModel,
        hover: &HoverState,
        velocities: &[f64],
        density: f64,
        flat_plate_area: f64,
    ) -> Result<Self> {
        let lift = hover.thrust;
        let mut points = Vec::with_capacity(velocities.len());
        let mut skipped = Vec::new();

        for (&velocity, result) in velocities
            .iter()
            .zip(model.sweep(hover, velocities, density, flat_plate_area))
        {
            match result {
                Ok(state) => {
                    let effective_drag = state.effective_drag();
                    points.push(PerformancePoint {
                        state,
                        effective_drag,
                        lift_to_drag: lift / effective_drag,
                    });
                }
                Err(RotorError::Diverged { what }) => {
                    warn!(velocity, what, "skipping sample: solver diverged");
                    skipped.push(velocity);
                }
                Err(e) => return Err(e),
            }
        }

        debug!(points = points.len(), skipped = skipped.len(), "performance curve computed");
        Ok(Self { lift, points, skipped })
    }

    /// Velocities of the kept points (m/s)
    pub fn velocities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.state.velocity).collect()
    }

    /// Total rotor power of the kept points (W)
    pub fn total_powers(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.state.total_power).collect()
    }

    /// Fuel aircraft endurance and range along the curve.
    pub fn fuel_performance(&self, mission: &MissionProfile) -> Result<Vec<FuelPerformance>> {
        mission.validate()?;
        let sfc_eff = mission.effective_sfc();
        let log_weight_ratio = (mission.gross_kg / (mission.gross_kg - mission.fuel_kg)).ln();

        Ok(self
            .points
            .iter()
            .map(|p| {
                let velocity_kmh = p.velocity_kmh();
                let engine_power_kw = mission.engine_power_kw(p.state.total_power);
                let fuel_flow = engine_power_kw * mission.sfc;
                FuelPerformance {
                    velocity_kmh,
                    engine_power_kw,
                    fuel_flow,
                    endurance_h: mission.fuel_kg / fuel_flow,
                    specific_range: velocity_kmh / fuel_flow,
                    breguet_range_km: BREGUET_KM_CONSTANT / sfc_eff * p.lift_to_drag * log_weight_ratio,
                }
            })
            .collect())
    }

    /// Battery aircraft endurance and range along the curve.
    pub fn electric_performance(&self, mission: &MissionProfile) -> Result<Vec<ElectricPerformance>> {
        mission.validate()?;
        Ok(self
            .points
            .iter()
            .map(|p| {
                let velocity_kmh = p.velocity_kmh();
                let motor_power_kw = mission.engine_power_kw(p.state.total_power);
                let endurance_h = mission.battery_kwh / motor_power_kw;
                ElectricPerformance {
                    velocity_kmh,
                    motor_power_kw,
                    endurance_h,
                    range_km: endurance_h * velocity_kmh,
                }
            })
            .collect())
    }

    /// Point with the lowest total power, i.e. the longest endurance.
    pub fn best_endurance(&self) -> Option<&PerformancePoint> {
        self.points
            .iter()
            .min_by(|a, b| a.state.total_power.total_cmp(&b.state.total_power))
    }

    /// Point with the highest velocity per unit power, i.e. the longest range.
    pub fn best_range(&self) -> Option<&PerformancePoint> {
        self.points
            .iter()
            .filter(|p| p.state.velocity > 0.0)
            .max_by(|a, b| {
                let ra = a.state.velocity / a.state.total_power;
                let rb = b.state.velocity / b.state.total_power;
                ra.total_cmp(&rb)
            })
    }

    /// Get a summary of the curve for reporting.
    pub fn summary(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("points".to_string(), self.points.len().to_string());
        map.insert("skipped".to_string(), self.skipped.len().to_string());
        if let Some(p) = self.best_endurance() {
            map.insert(
                "best endurance speed".to_string(),
                format!("{:.1} km/h ({:.0} SHP)", p.velocity_kmh(), p.state.horsepower),
            );
        }
        if let Some(p) = self.best_range() {
            map.insert(
                "best range speed".to_string(),
                format!("{:.1} km/h ({:.0} SHP)", p.velocity_kmh(), p.state.horsepower),
            );
        }
        if let Some(p) = self.points.iter().max_by(|a, b| a.lift_to_drag.total_cmp(&b.lift_to_drag)) {
            map.insert("max L/D".to_string(), format!("{:.2}", p.lift_to_drag));
        }
        map
    }
}

/// One sample of the Wald's equation curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownwashPoint {
    pub velocity: f64,         // (m/s)
    pub normalized_speed: f64, // V / v0
    pub downwash_ratio: f64,   // v / v0
}

/// Downwash velocity ratio against normalized flight speed in level flight.
pub fn downwash_curve(
    solver: &WaldsEquationSolver,
    hover: &HoverState,
    velocities: &[f64],
) -> Result<Vec<DownwashPoint>> {
    let v0 = hover.mean_induced_velocity;
    let mut curve = Vec::with_capacity(velocities.len());
    for &velocity in velocities {
        match solver.solve(velocity, v0, 0.0) {
            Ok(downwash_ratio) => curve.push(DownwashPoint {
                velocity,
                normalized_speed: velocity / v0,
                downwash_ratio,
            }),
            Err(RotorError::Diverged { what }) => {
                warn!(velocity, what, "skipping sample: solver diverged");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(curve)
}

/// One sample of the maximum figure of merit curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureOfMeritPoint {
    pub ct: f64,                  // Thrust coefficient
    pub ct_over_sigma: f64,       // Blade loading Ct/σ
    pub max_figure_of_merit: f64,
}

/// Maximum figure of merit over `[ct/2, 3ct/2]` around the hover thrust coefficient.
pub fn figure_of_merit_curve(hover: &HoverState, samples: usize) -> Vec<FigureOfMeritPoint> {
    let sigma = hover.geometry.solidity;
    Array1::linspace(0.5 * hover.ct, 1.5 * hover.ct, samples)
        .iter()
        .map(|&ct| FigureOfMeritPoint {
            ct,
            ct_over_sigma: ct / sigma,
            max_figure_of_merit: hover.max_figure_of_merit_at(ct),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airfoil::PolarTable;
    use crate::geometry::{RotorGeometry, RotorSpec};
    use crate::hover::HoverSolver;
    use approx::assert_relative_eq;

    const RHO: f64 = 1.225;
    const FLAT_PLATE: f64 = 1.5;

    fn reference_hover() -> HoverState {
        let geometry = RotorGeometry::from_spec(&RotorSpec::reference_utility()).unwrap();
        let polar = PolarTable::thin_airfoil(0.1 * 180.0 / std::f64::consts::PI, -5.0, 25.0, 0.5).unwrap();
        HoverSolver::new(&geometry, &polar).solve(13000.0, RHO).unwrap().state
    }

    fn mission() -> MissionProfile {
        MissionProfile {
            gross_kg: 13000.0,
            fuel_kg: 2000.0,
            sfc: 0.3,
            transmission_loss: 0.05,
            battery_kwh: 800.0,
        }
    }

    fn curve(hover: &HoverState) -> PerformanceCurve {
        let velocities = Array1::linspace(10.0, 60.0, 25).to_vec();
        PerformanceCurve::compute(&ForwardFlightModel::default(), hover, &velocities, RHO, FLAT_PLATE).unwrap()
    }

    #[test]
    fn test_curve_points() {
        let hover = reference_hover();
        let curve = curve(&hover);
        assert_eq!(curve.points.len(), 25);
        assert!(curve.skipped.is_empty());
        assert_eq!(curve.lift, hover.thrust);
        for p in &curve.points {
            assert_relative_eq!(p.effective_drag, p.state.induced_drag + p.state.profile_drag + p.state.body_drag);
            assert_relative_eq!(p.lift_to_drag, hover.thrust / p.effective_drag);
        }
    }

    #[test]
    fn test_diverged_samples_are_skipped() {
        let hover = reference_hover();
        // λ = 12 blows up the Wald iteration.
        let fast = 12.0 * hover.mean_induced_velocity;
        let velocities = [20.0, fast, 40.0];
        let curve = PerformanceCurve::compute(&ForwardFlightModel::default(), &hover, &velocities, RHO, FLAT_PLATE)
            .unwrap();
        assert_eq!(curve.velocities(), vec![20.0, 40.0]);
        assert_eq!(curve.skipped, vec![fast]);

        let downwash = downwash_curve(&WaldsEquationSolver::default(), &hover, &velocities).unwrap();
        assert_eq!(downwash.len(), 2);
    }

    #[test]
    fn test_invalid_sample_aborts_curve() {
        let hover = reference_hover();
        let result = PerformanceCurve::compute(&ForwardFlightModel::default(), &hover, &[20.0, -1.0], RHO, FLAT_PLATE);
        assert!(matches!(result, Err(RotorError::InvalidInput { .. })));
    }

    #[test]
    fn test_fuel_performance() {
        let hover = reference_hover();
        let curve = curve(&hover);
        let m = mission();
        let fuel = curve.fuel_performance(&m).unwrap();
        assert_eq!(fuel.len(), curve.points.len());

        let p = &curve.points[5];
        let f = &fuel[5];
        let engine_kw = 1.13 * p.state.total_power / 1000.0 / 0.95;
        assert_relative_eq!(f.engine_power_kw, engine_kw, max_relative = 1e-12);
        assert_relative_eq!(f.fuel_flow, engine_kw * 0.3, max_relative = 1e-12);
        assert_relative_eq!(f.endurance_h, 2000.0 / (engine_kw * 0.3), max_relative = 1e-12);
        assert_relative_eq!(f.specific_range, p.state.velocity * 3.6 / (engine_kw * 0.3), max_relative = 1e-12);
        let sfc_eff = 1.13 * 0.3 / 0.95;
        let breguet = 366.0 / sfc_eff * p.lift_to_drag * (13000.0_f64 / 11000.0).ln();
        assert_relative_eq!(f.breguet_range_km, breguet, max_relative = 1e-12);
    }

    #[test]
    fn test_electric_performance() {
        let hover = reference_hover();
        let curve = curve(&hover);
        let electric = curve.electric_performance(&mission()).unwrap();
        for (p, e) in curve.points.iter().zip(&electric) {
            assert_relative_eq!(e.endurance_h, 800.0 / e.motor_power_kw);
            assert_relative_eq!(e.range_km, e.endurance_h * p.velocity_kmh());
        }
    }

    #[test]
    fn test_invalid_mission() {
        let hover = reference_hover();
        let curve = curve(&hover);
        let mut m = mission();
        m.fuel_kg = 13000.0;
        assert!(curve.fuel_performance(&m).is_err());
        let mut m = mission();
        m.transmission_loss = 1.0;
        assert!(curve.electric_performance(&m).is_err());
    }

    #[test]
    fn test_best_speeds() {
        let hover = reference_hover();
        let curve = curve(&hover);
        let endurance = curve.best_endurance().unwrap();
        let range = curve.best_range().unwrap();
        // Minimum power comes no later than minimum power per unit speed.
        assert!(range.state.velocity >= endurance.state.velocity);
        for p in &curve.points {
            assert!(p.state.total_power >= endurance.state.total_power);
        }
        let fuel = curve.fuel_performance(&mission()).unwrap();
        let best_sr = fuel.iter().map(|f| f.specific_range).fold(f64::MIN, f64::max);
        assert_relative_eq!(best_sr, range.velocity_kmh() / mission().engine_power_kw(range.state.total_power) / 0.3);

        let summary = curve.summary();
        assert_eq!(summary.get("points").map(String::as_str), Some("25"));
        assert!(summary.contains_key("best range speed"));
    }

    #[test]
    fn test_downwash_curve() {
        let hover = reference_hover();
        let velocities = Array1::linspace(0.0, 50.0, 50).to_vec();
        let curve = downwash_curve(&WaldsEquationSolver::default(), &hover, &velocities).unwrap();
        assert_eq!(curve.len(), 50);
        assert_eq!(curve[0].downwash_ratio, 1.0);
        for pair in curve.windows(2) {
            assert!(pair[1].normalized_speed > pair[0].normalized_speed);
            assert!(pair[1].downwash_ratio <= pair[0].downwash_ratio + 1e-12);
        }
    }

    #[test]
    fn test_figure_of_merit_curve() {
        let hover = reference_hover();
        let curve = figure_of_merit_curve(&hover, 50);
        assert_eq!(curve.len(), 50);
        assert_relative_eq!(curve[0].ct, 0.5 * hover.ct);
        assert_relative_eq!(curve[49].ct, 1.5 * hover.ct, max_relative = 1e-12);
        assert_relative_eq!(curve[10].ct_over_sigma, curve[10].ct / hover.geometry.solidity);
        for pair in curve.windows(2) {
            assert!(pair[1].max_figure_of_merit > pair[0].max_figure_of_merit);
        }
    }
}
