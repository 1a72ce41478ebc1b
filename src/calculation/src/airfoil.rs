/// Airfoil section data: the polar lookup seam used by the blade-element solver.
///
/// The solver never generates polars itself. Anything that can answer
/// "angle of attack → (cl, cd)" implements [`PolarProvider`]; the crate ships
/// [`PolarTable`], a linearly interpolated table of samples that usually comes
/// from an external panel code run or a wind-tunnel data file.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::constants::naca0012_drag;
use crate::error::{Result, RotorError};

/// Attached-flow band used for the lift-slope fit (deg).
const LIFT_SLOPE_FIT_BAND_DEG: (f64, f64) = (-4.0, 10.0);

/// Section lift and drag coefficients at one angle of attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirfoilCoefficients {
    pub cl: f64, // Lift coefficient
    pub cd: f64, // Drag coefficient
}

/// Angle of attack → section coefficients.
pub trait PolarProvider {
    /// Coefficients at `alpha_deg`. Must fail outside the supported range.
    fn lookup(&self, alpha_deg: f64) -> Result<AirfoilCoefficients>;

    /// Lift-curve slope used to seed the induced-velocity iteration (1/rad).
    fn lift_slope(&self) -> f64;

    /// Smallest and largest supported angle of attack (deg).
    fn alpha_range(&self) -> (f64, f64);
}

/// One tabulated polar sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarPoint {
    pub alpha_deg: f64, // Angle of attack (deg)
    pub cl: f64,        // Lift coefficient
    pub cd: f64,        // Drag coefficient
}

impl PolarPoint {
    pub const fn new(alpha_deg: f64, cl: f64, cd: f64) -> Self {
        Self { alpha_deg, cl, cd }
    }
}

/// Immutable, linearly interpolated airfoil polar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarTable {
    samples: Vec<PolarPoint>,
    lift_slope: f64,
}

impl PolarTable {
    /// Build a table from samples ordered by strictly increasing angle.
    ///
    /// The lift slope is estimated by a least-squares fit over the
    /// attached-flow band; see [`PolarTable::with_lift_slope`] to override it.
    pub fn new(samples: Vec<PolarPoint>) -> Result<Self> {
        if samples.len() < 3 {
            return Err(RotorError::InvalidPolar(format!(
                "need at least 3 samples, got {}",
                samples.len()
            )));
        }

        for (i, p) in samples.iter().enumerate() {
            if !(p.alpha_deg.is_finite() && p.cl.is_finite() && p.cd.is_finite()) {
                return Err(RotorError::InvalidPolar(format!("sample {i} is not finite")));
            }
        }

        if let Some(w) = samples.windows(2).find(|w| w[1].alpha_deg <= w[0].alpha_deg) {
            return Err(RotorError::InvalidPolar(format!(
                "angles must strictly increase ({}° followed by {}°)",
                w[0].alpha_deg, w[1].alpha_deg
            )));
        }

        let lift_slope = fit_lift_slope(&samples)?;
        Ok(Self { samples, lift_slope })
    }

    /// Build a table from parallel columns, as read from a polar file.
    pub fn from_columns(alpha_deg: &[f64], cl: &[f64], cd: &[f64]) -> Result<Self> {
        if alpha_deg.len() != cl.len() || alpha_deg.len() != cd.len() {
            return Err(RotorError::InvalidPolar("columns must have the same length".to_string()));
        }
        let samples = alpha_deg
            .iter()
            .zip(cl)
            .zip(cd)
            .map(|((&a, &l), &d)| PolarPoint::new(a, l, d))
            .collect();
        Self::new(samples)
    }

    /// Synthetic thin-airfoil polar: `cl = a·α`, drag from the NACA 0012 correlation.
    ///
    /// Used when no measured polar is available. No stall is modelled.
    pub fn thin_airfoil(lift_slope: f64, min_deg: f64, max_deg: f64, step_deg: f64) -> Result<Self> {
        if !(step_deg > 0.0) || !(max_deg > min_deg) {
            return Err(RotorError::InvalidPolar("empty angle range".to_string()));
        }
        let count = ((max_deg - min_deg) / step_deg + 1e-9).floor() as usize + 1;
        let samples = (0..count)
            .map(|i| {
                let alpha_deg = min_deg + i as f64 * step_deg;
                let alpha = alpha_deg.to_radians();
                PolarPoint::new(alpha_deg, lift_slope * alpha, naca0012_drag(alpha))
            })
            .collect();
        Self::new(samples)
    }

    /// Replace the fitted lift slope (1/rad).
    pub fn with_lift_slope(mut self, lift_slope: f64) -> Result<Self> {
        if !(lift_slope.is_finite() && lift_slope > 0.0) {
            return Err(RotorError::InvalidPolar(format!("lift slope must be positive, got {lift_slope}")));
        }
        self.lift_slope = lift_slope;
        Ok(self)
    }

    /// Tabulated samples.
    pub fn samples(&self) -> &[PolarPoint] {
        &self.samples
    }
}

impl PolarProvider for PolarTable {
    fn lookup(&self, alpha_deg: f64) -> Result<AirfoilCoefficients> {
        let (min_deg, max_deg) = self.alpha_range();
        if !(alpha_deg >= min_deg && alpha_deg <= max_deg) {
            return Err(RotorError::PolarOutOfRange { alpha_deg, min_deg, max_deg });
        }

        // First sample strictly above alpha; clamped so the top end uses the last interval.
        let upper = self
            .samples
            .partition_point(|p| p.alpha_deg <= alpha_deg)
            .clamp(1, self.samples.len() - 1);
        let lo = &self.samples[upper - 1];
        let hi = &self.samples[upper];

        let t = (alpha_deg - lo.alpha_deg) / (hi.alpha_deg - lo.alpha_deg);
        Ok(AirfoilCoefficients {
            cl: lo.cl + t * (hi.cl - lo.cl),
            cd: lo.cd + t * (hi.cd - lo.cd),
        })
    }

    fn lift_slope(&self) -> f64 {
        self.lift_slope
    }

    fn alpha_range(&self) -> (f64, f64) {
        // Invariant: at least 3 samples.
        (self.samples[0].alpha_deg, self.samples[self.samples.len() - 1].alpha_deg)
    }
}

/// Least-squares slope of cl against angle of attack in radians.
fn fit_lift_slope(samples: &[PolarPoint]) -> Result<f64> {
    let (lo, hi) = LIFT_SLOPE_FIT_BAND_DEG;
    let mut band: Vec<&PolarPoint> = samples
        .iter()
        .filter(|p| p.alpha_deg >= lo && p.alpha_deg <= hi)
        .collect();
    if band.len() < 2 {
        band = samples.iter().collect();
    }

    let x = Array1::from_iter(band.iter().map(|p| p.alpha_deg.to_radians()));
    let y = Array1::from_iter(band.iter().map(|p| p.cl));
    let x_mean = x.mean().unwrap_or(0.0);
    let y_mean = y.mean().unwrap_or(0.0);
    let dx = &x - x_mean;
    let dy = &y - y_mean;

    let sxx = dx.dot(&dx);
    if sxx <= 0.0 {
        return Err(RotorError::InvalidPolar("cannot fit a lift slope".to_string()));
    }
    let slope = dx.dot(&dy) / sxx;
    if !(slope.is_finite() && slope > 0.0) {
        return Err(RotorError::InvalidPolar(format!("fitted lift slope {slope} is not positive")));
    }
    Ok(slope)
}
