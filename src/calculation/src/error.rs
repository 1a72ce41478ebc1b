/// Error types for the rotor solvers.
///
/// Inner-loop non-convergence is not an error variant: it is reported as a
/// diagnostic next to a usable result (see `hover::HoverDiagnostics`).

use thiserror::Error;

/// Failure kinds raised by the geometry, polar and solver layers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RotorError {
    /// An argument is out of its domain (negative, NaN, infinite, ...)
    #[error("invalid input for {what}: {reason}")]
    InvalidInput {
        /// Name of the offending argument
        what: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// A denominator reached zero (hover induced velocity, ground height at r/4)
    #[error("division singularity: {what}")]
    DivisionSingularity {
        /// Which quantity hit the singularity
        what: String,
    },

    /// The pitch grid was exhausted before the thrust met the weight
    #[error(
        "target thrust {required:.1} N unreachable: {achieved:.1} N at maximum pitch {max_pitch_deg}°"
    )]
    UnreachableTarget {
        /// Thrust that was requested (N)
        required: f64,
        /// Thrust at the last grid pitch (N)
        achieved: f64,
        /// Last grid pitch (deg)
        max_pitch_deg: f64,
    },

    /// Polar lookup outside the sampled angle range
    #[error("angle of attack {alpha_deg}° outside polar range [{min_deg}°, {max_deg}°]")]
    PolarOutOfRange {
        /// Requested angle (deg)
        alpha_deg: f64,
        /// Smallest tabulated angle (deg)
        min_deg: f64,
        /// Largest tabulated angle (deg)
        max_deg: f64,
    },

    /// Polar samples violate the table invariants
    #[error("invalid polar table: {0}")]
    InvalidPolar(String),

    /// Rotor dimensions violate the geometry invariants
    #[error("invalid rotor geometry: {0}")]
    InvalidGeometry(String),

    /// An iteration produced NaN or infinity
    #[error("{what} diverged to a non-finite value")]
    Diverged {
        /// Which solver diverged
        what: &'static str,
    },
}

impl RotorError {
    /// Shorthand for [`RotorError::InvalidInput`].
    pub fn invalid(what: &'static str, reason: impl Into<String>) -> Self {
        RotorError::InvalidInput { what, reason: reason.into() }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RotorError>;

/// Check that `value` is a finite number.
pub(crate) fn ensure_finite(what: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RotorError::invalid(what, format!("expected a finite number, got {value}")))
    }
}

/// Check that `value` is finite and strictly positive.
pub(crate) fn ensure_positive(what: &'static str, value: f64) -> Result<f64> {
    let value = ensure_finite(what, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(RotorError::invalid(what, format!("must be positive, got {value}")))
    }
}
