//! Helicopter main-rotor performance library.
//!
//! This library provides the numerical core of a rotor performance study:
//! - Rotor geometry derived from blade count, chord, diameter and tip speed
//! - Airfoil polar lookup behind the [`PolarProvider`] trait
//! - Blade-element / momentum hover solution with search diagnostics
//! - Wald's equation for the forward-flight downwash ratio
//! - Forward-flight power breakdown and velocity sweeps
//! - Ground-effect thrust correction
//! - Endurance, range and figure-of-merit curves
//!
//! # Example
//!
//! ```no_run
//! use rotorperf_calc::{ForwardFlightModel, HoverSolver, PolarTable, RotorGeometry, RotorSpec};
//!
//! let geometry = RotorGeometry::from_spec(&RotorSpec::reference_utility())?;
//! let polar = PolarTable::thin_airfoil(5.73, -5.0, 25.0, 0.5)?;
//! let hover = HoverSolver::new(&geometry, &polar).solve(13000.0, 1.225)?.require_target()?;
//! let cruise = ForwardFlightModel::default().evaluate(&hover, 50.0, 1.225, 1.5)?;
//! println!("{:.0} SHP at 50 m/s", cruise.horsepower);
//! # Ok::<(), rotorperf_calc::RotorError>(())
//! ```
//!
//! All results are immutable values: a [`HoverState`] is computed once and
//! passed explicitly to the forward-flight and ground-effect layers.

#![warn(clippy::doc_markdown)]
#![allow(clippy::inconsistent_struct_constructor)]

pub mod airfoil;
pub mod constants;
pub mod error;
pub mod estimate;
pub mod forward;
pub mod geometry;
pub mod ground_effect;
pub mod hover;
pub mod metrics;
pub mod walds;

// Re-export key types and functions for easy use
pub use airfoil::{AirfoilCoefficients, PolarPoint, PolarProvider, PolarTable};
pub use constants::{naca0012_drag, InductionSeed, SolverSettings, ThrustIntegrand};
pub use error::{Result, RotorError};
pub use estimate::QuickEstimate;
pub use forward::{ForwardFlightModel, ForwardFlightState};
pub use geometry::{RotorGeometry, RotorSpec};
pub use ground_effect::{ground_effect, ground_effect_curve, GroundEffectPoint};
pub use hover::{HoverDiagnostics, HoverSolution, HoverSolver, HoverState};
pub use metrics::{MissionProfile, PerformanceCurve};
pub use walds::{walds_residual, WaldsEquationSolver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
