/// Blade-element / momentum hover solver.
///
/// For each collective pitch on the search grid the blade is cut into equal
/// annuli and the induced velocity at every station is found by fixed-point
/// iteration on the blade-element momentum balance
///
/// ```text
/// v = ±sqrt(|r·(cl·cos φ − cd·sin φ)|) · sqrt(N·c / 8π) · ω
/// ```
///
/// The thrust integral `4ρπ Σ r·v² dr · 0.97` is then compared against the
/// weight; the first pitch that meets it wins.
///
/// # Numerical behaviour
///
/// - By default the iteration starts from `v = 0` and applies each update in
///   full. At inboard stations the local update slope exceeds one, so the
///   iterate oscillates and thrust is not strictly monotonic in pitch: on the
///   reference rotor it drops about 1% between 3.0° and 3.5°. The first-pitch
///   search still lands on the published results.
/// - [`SolverSettings::stabilized`] starts from the closed-form linear-lift
///   solution, applies half of each update and sums `r·v|v|`, which keeps the
///   thrust curve monotonic at the cost of a few percent in thrust.
/// - The inner loop is capped (10 iterations by default) and frequently stops
///   above the 1e-12 tolerance. That output is accepted; the miss is reported
///   in [`HoverDiagnostics`].
/// - Running out of pitch grid is not an error either; the state at the last
///   pitch is returned with `target_reached == false`.

use std::f64::consts::{PI, SQRT_2};

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::airfoil::PolarProvider;
use crate::constants::{
    naca0012_drag, InductionSeed, SolverSettings, ThrustIntegrand, ALPHA_CEILING_DEG,
    ALPHA_FLOOR_DEG, GRAVITY, HOVER_TIP_LOSS_FACTOR, WATTS_TO_SHP,
};
use crate::error::{ensure_positive, Result, RotorError};
use crate::geometry::RotorGeometry;

/// Square root that keeps the sign of its argument.
#[inline(always)]
fn signed_sqrt(x: f64) -> f64 {
    if x >= 0.0 { x.sqrt() } else { -(-x).sqrt() }
}

/// Converged (or capped) blade-element solution at one collective pitch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BladeElementSolution {
    /// Collective pitch (deg)
    pub pitch_deg: f64,
    /// Integrated rotor thrust (N)
    pub thrust: f64,
    /// Station midpoint radii (m)
    pub station_radii: Vec<f64>,
    /// Induced velocity at each station (m/s)
    pub induced_velocity: Vec<f64>,
    /// Inner iterations performed
    pub iterations: usize,
    /// L2 norm of the last induced-velocity update (m/s)
    pub residual: f64,
    /// Whether the residual fell below the tolerance before the cap
    pub converged: bool,
}

/// Inner-loop miss at one pitch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InnerLoopReport {
    pub pitch_deg: f64,   // Collective pitch (deg)
    pub iterations: usize, // Iterations spent (the cap)
    pub residual: f64,    // Last update norm (m/s)
}

/// What happened during a hover search, beyond the numbers themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverDiagnostics {
    /// Thrust needed to carry the weight (N)
    pub required_thrust: f64,
    /// False when the pitch grid ran out before the weight was met
    pub target_reached: bool,
    /// Number of grid pitches evaluated
    pub pitches_evaluated: usize,
    /// Pitches whose inner loop hit the iteration cap
    pub non_converged: Vec<InnerLoopReport>,
}

impl HoverDiagnostics {
    /// Whether the inner loop met its tolerance at the returned pitch.
    pub fn final_pitch_converged(&self, pitch_deg: f64) -> bool {
        !self.non_converged.iter().any(|r| r.pitch_deg == pitch_deg)
    }
}

/// Hover operating point. One value per (geometry, polar, weight, density) query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverState {
    /// Geometry the state was solved for
    pub geometry: RotorGeometry,
    /// Air density used in the solve (kg/m³)
    pub density: f64,
    /// Gross weight requested (kg)
    pub weight_kg: f64,
    /// Collective pitch found (deg)
    pub pitch_deg: f64,
    /// Station midpoint radii (m)
    pub station_radii: Vec<f64>,
    /// Induced velocity distribution (m/s)
    pub induced_velocity: Vec<f64>,
    /// Mean of the station induced velocities, v0 (m/s)
    pub mean_induced_velocity: f64,
    /// Total thrust (N)
    pub thrust: f64,
    /// Thrust coefficient T / (ρ π r⁴ ω²)
    pub ct: f64,
    /// Tip-loss coefficient B = 1 − sqrt(2 ct) / N
    pub tip_loss: f64,
    /// Mean blade lift coefficient 6 ct / σ
    pub cl_mean: f64,
    /// Mean blade angle of attack (rad)
    pub alpha_mean: f64,
    /// Mean blade drag coefficient from the NACA 0012 correlation
    pub cd_mean: f64,
    /// Lift-curve slope (1/rad)
    pub lift_slope: f64,
    /// Induced power (W)
    pub induced_power: f64,
    /// Profile power (W)
    pub profile_power: f64,
    /// Induced plus profile power (W)
    pub total_power: f64,
    /// Power coefficient P / (ρ π r⁵ ω³)
    pub cp: f64,
    /// Figure of merit
    pub figure_of_merit: f64,
    /// Theoretical maximum figure of merit at this ct
    pub max_figure_of_merit: f64,
}

impl HoverState {
    /// Derive the hover coefficients and powers from a blade-element solution.
    fn derive(
        geometry: &RotorGeometry,
        lift_slope: f64,
        density: f64,
        weight_kg: f64,
        element: BladeElementSolution,
    ) -> Self {
        let g = geometry;
        let thrust = element.thrust;
        let ct = thrust / (density * PI * g.radius.powi(4) * g.omega.powi(2));
        let tip_loss = 1.0 - (2.0 * ct.max(0.0)).sqrt() / g.num_blades as f64;

        let cl_mean = 6.0 * ct / g.solidity;
        let alpha_mean = cl_mean / lift_slope;
        let cd_mean = naca0012_drag(alpha_mean);

        let induced_power = thrust.max(0.0).powf(1.5) / (tip_loss * (2.0 * density * g.disk_area).sqrt());
        let profile_power = g.profile_power_factor(density) * cd_mean;
        let total_power = induced_power + profile_power;
        let cp = total_power / (density * PI * g.radius.powi(5) * g.omega.powi(3));

        let ct_15 = ct.max(0.0).powf(1.5);
        let figure_of_merit = ct_15 / (SQRT_2 * cp);
        let max_figure_of_merit = max_figure_of_merit(ct, tip_loss, g.solidity, cd_mean);

        let mean_induced_velocity = Array1::from(element.induced_velocity.clone()).mean().unwrap_or(0.0);

        Self {
            geometry: *g,
            density,
            weight_kg,
            pitch_deg: element.pitch_deg,
            station_radii: element.station_radii,
            induced_velocity: element.induced_velocity,
            mean_induced_velocity,
            thrust,
            ct,
            tip_loss,
            cl_mean,
            alpha_mean,
            cd_mean,
            lift_slope,
            induced_power,
            profile_power,
            total_power,
            cp,
            figure_of_merit,
            max_figure_of_merit,
        }
    }

    /// Maximum figure of merit at another thrust coefficient, holding B and cd_mean.
    pub fn max_figure_of_merit_at(&self, ct: f64) -> f64 {
        max_figure_of_merit(ct, self.tip_loss, self.geometry.solidity, self.cd_mean)
    }

    /// Thrust expressed as supported mass (kg)
    pub fn thrust_kg(&self) -> f64 {
        self.thrust / GRAVITY
    }

    /// Induced power in shaft horsepower.
    pub fn induced_shp(&self) -> f64 {
        self.induced_power * WATTS_TO_SHP
    }

    /// Profile power in shaft horsepower.
    pub fn profile_shp(&self) -> f64 {
        self.profile_power * WATTS_TO_SHP
    }

    /// Total power in shaft horsepower.
    pub fn total_shp(&self) -> f64 {
        self.total_power * WATTS_TO_SHP
    }
}

/// `0.707·ct^1.5 / (ct^1.5 / (√2·B) + σ·cd/8)`
fn max_figure_of_merit(ct: f64, tip_loss: f64, solidity: f64, cd_mean: f64) -> f64 {
    let ct_15 = ct.max(0.0).powf(1.5);
    0.707 * ct_15 / (ct_15 / (SQRT_2 * tip_loss) + solidity * cd_mean / 8.0)
}

/// Hover state together with its search diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverSolution {
    pub state: HoverState,
    pub diagnostics: HoverDiagnostics,
}

impl HoverSolution {
    /// The hover state, or [`RotorError::UnreachableTarget`] if the grid ran out.
    pub fn require_target(self) -> Result<HoverState> {
        if self.diagnostics.target_reached {
            Ok(self.state)
        } else {
            Err(RotorError::UnreachableTarget {
                required: self.diagnostics.required_thrust,
                achieved: self.state.thrust,
                max_pitch_deg: self.state.pitch_deg,
            })
        }
    }
}

/// Collective-pitch search for a target weight.
pub struct HoverSolver<'a, P: PolarProvider + ?Sized> {
    geometry: &'a RotorGeometry,
    polar: &'a P,
    settings: SolverSettings,
}

impl<'a, P: PolarProvider + ?Sized> HoverSolver<'a, P> {
    /// Solver over `geometry` and `polar` with the default settings.
    pub fn new(geometry: &'a RotorGeometry, polar: &'a P) -> Self {
        Self { geometry, polar, settings: SolverSettings::new() }
    }

    /// Solver with explicit settings.
    pub fn with_settings(geometry: &'a RotorGeometry, polar: &'a P, settings: SolverSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { geometry, polar, settings })
    }

    /// Settings in use.
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Blade-element thrust at one collective pitch.
    pub fn thrust_at_pitch(&self, pitch_deg: f64, density: f64) -> Result<BladeElementSolution> {
        ensure_positive("air density", density)?;
        if !pitch_deg.is_finite() {
            return Err(RotorError::invalid("collective pitch", "must be finite"));
        }

        let g = self.geometry;
        let stations = g.stations(self.settings.stations);
        let radii = Array1::from(stations.radii);
        let pitches = radii.mapv(|r| pitch_deg + g.twist_offset_deg(r));

        let momentum_scale = (g.num_blades as f64 * g.chord / (8.0 * PI)).sqrt() * g.omega;
        let k2 = momentum_scale * momentum_scale;
        let mut v = match self.settings.inner_seed {
            InductionSeed::Zero => Array1::zeros(radii.len()),
            InductionSeed::LinearLift => {
                // v² + (k²a/ω)·v − k²·r·a·θ = 0, odd in θ.
                let a = self.polar.lift_slope();
                let b = k2 * a / g.omega;
                Array1::from_iter(radii.iter().zip(pitches.iter()).map(|(&r, &theta)| {
                    let c = k2 * r * a * theta.to_radians();
                    c.signum() * 0.5 * (-b + (b * b + 4.0 * c.abs()).sqrt())
                }))
            }
        };

        let relaxation = self.settings.inner_relaxation;
        let mut residual = f64::INFINITY;
        let mut iterations = 0;
        let mut converged = false;

        for _ in 0..self.settings.inner_max_iterations {
            let mut next = Array1::zeros(radii.len());
            for i in 0..radii.len() {
                let r = radii[i];
                let phi = (v[i] / (g.omega * r)).atan();
                let alpha = (pitches[i] - phi.to_degrees()).clamp(ALPHA_FLOOR_DEG, ALPHA_CEILING_DEG);
                let coeffs = self.polar.lookup(alpha)?;

                let balance = r * (coeffs.cl * phi.cos() - coeffs.cd * phi.sin());
                let target = signed_sqrt(balance) * momentum_scale;
                next[i] = v[i] + relaxation * (target - v[i]);
            }

            residual = (&next - &v).mapv(|d| d * d).sum().sqrt();
            v = next;
            iterations += 1;
            if residual < self.settings.inner_tolerance {
                converged = true;
                break;
            }
        }

        let integrand = self.settings.thrust_integrand;
        let weighted: f64 = radii
            .iter()
            .zip(v.iter())
            .map(|(&r, &vi)| match integrand {
                ThrustIntegrand::Squared => r * vi * vi,
                ThrustIntegrand::Signed => r * vi * vi.abs(),
            })
            .sum();
        let thrust = 4.0 * density * PI * weighted * stations.width * HOVER_TIP_LOSS_FACTOR;

        if !thrust.is_finite() {
            return Err(RotorError::Diverged { what: "blade-element induced velocity" });
        }

        Ok(BladeElementSolution {
            pitch_deg,
            thrust,
            station_radii: radii.to_vec(),
            induced_velocity: v.to_vec(),
            iterations,
            residual,
            converged,
        })
    }

    /// Thrust at every pitch of the search grid.
    pub fn thrust_curve(&self, density: f64) -> Result<Vec<(f64, f64)>> {
        self.settings
            .pitch_grid()
            .into_iter()
            .map(|pitch| Ok((pitch, self.thrust_at_pitch(pitch, density)?.thrust)))
            .collect()
    }

    /// Smallest grid pitch whose thrust carries `weight_kg`.
    pub fn solve(&self, weight_kg: f64, density: f64) -> Result<HoverSolution> {
        ensure_positive("gross weight", weight_kg)?;
        ensure_positive("air density", density)?;

        let required_thrust = weight_kg * GRAVITY;
        let mut non_converged = Vec::new();
        let mut pitches_evaluated = 0;
        let mut last: Option<BladeElementSolution> = None;

        for pitch in self.settings.pitch_grid() {
            let element = self.thrust_at_pitch(pitch, density)?;
            pitches_evaluated += 1;
            debug!(
                pitch_deg = pitch,
                thrust = element.thrust,
                iterations = element.iterations,
                residual = element.residual,
                "blade-element pass"
            );

            if !element.converged {
                non_converged.push(InnerLoopReport {
                    pitch_deg: pitch,
                    iterations: element.iterations,
                    residual: element.residual,
                });
            }

            let reached = element.thrust >= required_thrust;
            last = Some(element);
            if reached {
                break;
            }
        }

        let element = last.ok_or_else(|| RotorError::invalid("pitch grid", "no pitch to evaluate"))?;
        let target_reached = element.thrust >= required_thrust;

        if !target_reached {
            warn!(
                required = required_thrust,
                achieved = element.thrust,
                pitch_deg = element.pitch_deg,
                "hover target unreachable on the pitch grid; returning state at maximum pitch"
            );
        }
        if !element.converged {
            warn!(
                pitch_deg = element.pitch_deg,
                residual = element.residual,
                cap = self.settings.inner_max_iterations,
                "induced-velocity iteration stopped at its cap"
            );
        }

        let state = HoverState::derive(self.geometry, self.polar.lift_slope(), density, weight_kg, element);
        Ok(HoverSolution {
            state,
            diagnostics: HoverDiagnostics {
                required_thrust,
                target_reached,
                pitches_evaluated,
                non_converged,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airfoil::{PolarPoint, PolarTable};
    use crate::geometry::RotorSpec;
    use approx::assert_relative_eq;

    const RHO: f64 = 1.225;

    fn reference_polar() -> PolarTable {
        PolarTable::thin_airfoil(0.1 * 180.0 / PI, -5.0, 25.0, 0.5).unwrap()
    }

    fn reference_geometry(washout_deg: f64) -> RotorGeometry {
        let mut spec = RotorSpec::reference_utility();
        spec.washout_deg = washout_deg;
        RotorGeometry::from_spec(&spec).unwrap()
    }

    #[test]
    fn test_reference_helicopter_hover() {
        let geometry = reference_geometry(0.0);
        let polar = reference_polar();
        let solution = HoverSolver::new(&geometry, &polar).solve(13000.0, RHO).unwrap();
        let state = &solution.state;

        assert!(solution.diagnostics.target_reached);
        assert!(state.pitch_deg >= 0.0 && state.pitch_deg <= 15.0);
        assert!(state.thrust >= 13000.0 * GRAVITY);
        assert!(state.figure_of_merit > 0.0);
        assert!(state.figure_of_merit <= state.max_figure_of_merit + 1e-3);

        // Recorded reference values for this geometry and thin-airfoil polar.
        assert_relative_eq!(state.pitch_deg, 10.0);
        assert_relative_eq!(state.thrust, 128_917.9, max_relative = 1e-4);
        assert_relative_eq!(state.figure_of_merit, 0.767, epsilon = 5e-3);
        assert_relative_eq!(state.mean_induced_velocity, 8.71, epsilon = 0.05);

        let solver = HoverSolver::new(&geometry, &polar);
        let shallow = solver.thrust_at_pitch(0.5, RHO).unwrap();
        assert_relative_eq!(shallow.thrust, 25_612.2, max_relative = 1e-4);
    }

    #[test]
    fn test_stabilized_reference_hover() {
        let geometry = reference_geometry(0.0);
        let polar = reference_polar();
        let solver = HoverSolver::with_settings(&geometry, &polar, SolverSettings::stabilized()).unwrap();
        let solution = solver.solve(13000.0, RHO).unwrap();
        let state = &solution.state;

        assert!(solution.diagnostics.target_reached);
        assert_relative_eq!(state.pitch_deg, 10.0);
        assert_relative_eq!(state.thrust, 131_261.4, max_relative = 1e-4);
        assert_relative_eq!(state.figure_of_merit, 0.770, epsilon = 5e-3);
        assert_relative_eq!(state.mean_induced_velocity, 10.45, epsilon = 0.05);
    }

    #[test]
    fn test_plain_substitution_dips_once() {
        let geometry = reference_geometry(0.0);
        let polar = reference_polar();
        let curve = HoverSolver::new(&geometry, &polar).thrust_curve(RHO).unwrap();

        let drops: Vec<_> = curve.windows(2).filter(|pair| pair[1].1 < pair[0].1).collect();
        assert_eq!(drops.len(), 1);
        let (before, after) = (drops[0][0], drops[0][1]);
        assert_eq!((before.0, after.0), (3.0, 3.5));
        assert!((before.1 - after.1) / before.1 < 0.02);
    }

    #[test]
    fn test_derived_coefficients_are_consistent() {
        let geometry = reference_geometry(0.0);
        let polar = reference_polar();
        let state = HoverSolver::new(&geometry, &polar).solve(13000.0, RHO).unwrap().state;

        let ct = state.thrust / (RHO * PI * geometry.radius.powi(4) * geometry.omega.powi(2));
        assert_relative_eq!(state.ct, ct, max_relative = 1e-12);
        assert_relative_eq!(state.tip_loss, 1.0 - (2.0 * ct).sqrt() / 5.0, max_relative = 1e-12);
        assert_relative_eq!(state.cl_mean, 6.0 * ct / geometry.solidity, max_relative = 1e-12);
        assert_relative_eq!(state.cd_mean, naca0012_drag(state.cl_mean / state.lift_slope), max_relative = 1e-12);
        assert_relative_eq!(state.total_power, state.induced_power + state.profile_power);
        assert_relative_eq!(state.total_shp(), state.total_power * 0.00134102209);
        assert_eq!(state.station_radii.len(), 10);
        assert_eq!(state.induced_velocity.len(), 10);
    }

    #[test]
    fn test_stabilized_thrust_monotonic_in_pitch() {
        let polar = reference_polar();
        for washout in [0.0, 8.0] {
            let geometry = reference_geometry(washout);
            let solver = HoverSolver::with_settings(&geometry, &polar, SolverSettings::stabilized()).unwrap();
            let curve = solver.thrust_curve(RHO).unwrap();
            assert_eq!(curve.len(), 31);
            for pair in curve.windows(2) {
                assert!(
                    pair[1].1 >= pair[0].1,
                    "washout {washout}: thrust fell from {} at {}° to {} at {}°",
                    pair[0].1, pair[0].0, pair[1].1, pair[1].0
                );
            }
        }
    }

    #[test]
    fn test_unreachable_target_is_flagged() {
        let geometry = reference_geometry(8.0);
        let polar = reference_polar();
        let solution = HoverSolver::new(&geometry, &polar).solve(13000.0, RHO).unwrap();

        assert!(!solution.diagnostics.target_reached);
        assert_eq!(solution.diagnostics.pitches_evaluated, 31);
        assert_eq!(solution.state.pitch_deg, 15.0);
        assert!(solution.state.thrust < 13000.0 * GRAVITY);

        match solution.require_target() {
            Err(RotorError::UnreachableTarget { max_pitch_deg, .. }) => assert_eq!(max_pitch_deg, 15.0),
            other => panic!("expected UnreachableTarget, got {other:?}"),
        }
    }

    #[test]
    fn test_non_convergence_is_reported_not_fatal() {
        let geometry = reference_geometry(0.0);
        let polar = reference_polar();
        let solution = HoverSolver::new(&geometry, &polar).solve(13000.0, RHO).unwrap();

        // Ten iterations do not reach 1e-12 on this rotor.
        let last = solution.state.pitch_deg;
        assert!(!solution.diagnostics.final_pitch_converged(last));
        for report in &solution.diagnostics.non_converged {
            assert_eq!(report.iterations, 10);
            assert!(report.residual >= 1e-12);
        }
    }

    #[test]
    fn test_zero_pitch_untwisted_rotor_converges_immediately() {
        let geometry = reference_geometry(0.0);
        let polar = reference_polar();
        let element = HoverSolver::new(&geometry, &polar).thrust_at_pitch(0.0, RHO).unwrap();
        assert!(element.converged);
        assert_eq!(element.iterations, 1);
        assert_eq!(element.thrust, 0.0);
    }

    #[test]
    fn test_idempotent() {
        let geometry = reference_geometry(0.0);
        let polar = reference_polar();
        let solver = HoverSolver::new(&geometry, &polar);
        let first = solver.solve(13000.0, RHO).unwrap();
        let second = solver.solve(13000.0, RHO).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.state.thrust.to_bits(), second.state.thrust.to_bits());
    }

    #[test]
    fn test_polar_too_narrow_fails() {
        let geometry = reference_geometry(0.0);
        let narrow = PolarTable::new(vec![
            PolarPoint::new(2.0, 0.2, 0.0090),
            PolarPoint::new(6.0, 0.6, 0.0110),
            PolarPoint::new(12.0, 1.2, 0.0190),
        ])
        .unwrap();
        let result = HoverSolver::new(&geometry, &narrow).solve(13000.0, RHO);
        assert!(matches!(result, Err(RotorError::PolarOutOfRange { .. })));
    }

    #[test]
    fn test_invalid_inputs() {
        let geometry = reference_geometry(0.0);
        let polar = reference_polar();
        let solver = HoverSolver::new(&geometry, &polar);
        assert!(solver.solve(0.0, RHO).is_err());
        assert!(solver.solve(13000.0, -1.0).is_err());
        assert!(solver.thrust_at_pitch(f64::NAN, RHO).is_err());

        let mut settings = SolverSettings::new();
        settings.stations = 0;
        assert!(HoverSolver::with_settings(&geometry, &polar, settings).is_err());
    }

    #[test]
    fn test_station_count_is_configurable() {
        let geometry = reference_geometry(0.0);
        let polar = reference_polar();
        let mut settings = SolverSettings::new();
        settings.stations = 20;
        let solver = HoverSolver::with_settings(&geometry, &polar, settings).unwrap();
        let state = solver.solve(13000.0, RHO).unwrap().state;
        assert_eq!(state.induced_velocity.len(), 20);
        assert!(state.thrust >= 13000.0 * GRAVITY);
    }

    #[test]
    fn test_max_figure_of_merit_curve() {
        let geometry = reference_geometry(0.0);
        let polar = reference_polar();
        let state = HoverSolver::new(&geometry, &polar).solve(13000.0, RHO).unwrap().state;
        assert_relative_eq!(state.max_figure_of_merit_at(state.ct), state.max_figure_of_merit);
        assert!(state.max_figure_of_merit_at(1.5 * state.ct) > state.max_figure_of_merit_at(0.5 * state.ct));
    }
}
