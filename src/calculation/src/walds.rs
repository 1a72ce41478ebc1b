/// Wald's equation: downwash velocity ratio between hover and forward flight.
///
/// Solves `x⁴ − 2·x³·λ·sin(α) + λ²·x² = 1` for `x = v / v0`, with
/// `λ = V / v0`. The iteration is a damped fixed point with a fixed budget and
/// no convergence test; callers get whatever the last iterate is. Check
/// [`walds_residual`] when accuracy matters.
///
/// For level flight the iteration is well behaved up to roughly `λ ≈ 7.5`.
/// Past that the first correction overshoots below zero and the iterate can
/// blow up, which is reported as [`RotorError::Diverged`].

use crate::constants::SolverSettings;
use crate::error::{ensure_finite, Result, RotorError};

/// Left-hand side of Wald's equation.
#[inline(always)]
fn walds_lhs(x: f64, lambda: f64, sin_alpha: f64) -> f64 {
    let x2 = x * x;
    x2 * x2 - 2.0 * x2 * x * lambda * sin_alpha + lambda * lambda * x2
}

/// `f(x) − 1` for a given normalized speed `lambda` and pitch `alpha_deg`.
pub fn walds_residual(x: f64, lambda: f64, alpha_deg: f64) -> f64 {
    walds_lhs(x, lambda, alpha_deg.to_radians().sin()) - 1.0
}

/// Damped fixed-point solver for Wald's equation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaldsEquationSolver {
    step: f64,
    iterations: usize,
}

impl WaldsEquationSolver {
    /// Solver with an explicit damping step and iteration budget.
    pub const fn new(step: f64, iterations: usize) -> Self {
        Self { step, iterations }
    }

    /// Solver using the step and budget from `settings`.
    pub const fn from_settings(settings: &SolverSettings) -> Self {
        Self::new(settings.wald_step, settings.wald_iterations)
    }

    /// Downwash velocity ratio for an already-normalized speed `lambda = V / v0`.
    pub fn solve_normalized(&self, lambda: f64, alpha_deg: f64) -> Result<f64> {
        ensure_finite("normalized speed", lambda)?;
        ensure_finite("rotor pitch", alpha_deg)?;

        let sin_alpha = alpha_deg.to_radians().sin();
        let mut x = 1.0;
        for _ in 0..self.iterations {
            x -= self.step * (walds_lhs(x, lambda, sin_alpha) - 1.0);
        }

        if x.is_finite() {
            Ok(x)
        } else {
            Err(RotorError::Diverged { what: "Wald's equation iteration" })
        }
    }

    /// Downwash velocity ratio `v / v0` at free-stream speed `free_stream`.
    ///
    /// `hover_induced` normalizes the flight speed and must be positive; a
    /// zero value is reported as a singularity. `free_stream` must not be negative.
    pub fn solve(&self, free_stream: f64, hover_induced: f64, alpha_deg: f64) -> Result<f64> {
        ensure_finite("free-stream velocity", free_stream)?;
        ensure_finite("hover induced velocity", hover_induced)?;
        if hover_induced == 0.0 {
            return Err(RotorError::DivisionSingularity {
                what: "hover induced velocity is zero".to_string(),
            });
        }
        if hover_induced < 0.0 {
            return Err(RotorError::invalid(
                "hover induced velocity",
                format!("must be positive, got {hover_induced}"),
            ));
        }
        if free_stream < 0.0 {
            return Err(RotorError::invalid(
                "free-stream velocity",
                format!("must not be negative, got {free_stream}"),
            ));
        }
        self.solve_normalized(free_stream / hover_induced, alpha_deg)
    }
}

impl Default for WaldsEquationSolver {
    fn default() -> Self {
        Self::from_settings(&SolverSettings::new())
    }
}
