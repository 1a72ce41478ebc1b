mod data;

use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use ndarray::Array1;
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use rotorperf_calc::constants::{GRAVITY, SEA_LEVEL_DENSITY, SPEED_OF_SOUND};
use rotorperf_calc::estimate::DEFAULT_TIP_LOSS;
use rotorperf_calc::metrics::{downwash_curve, figure_of_merit_curve, MissionProfile};
use rotorperf_calc::{
    ground_effect_curve, ForwardFlightModel, HoverSolution, HoverSolver, PerformanceCurve,
    PolarProvider, PolarTable, QuickEstimate, RotorGeometry, RotorSpec, SolverSettings,
    WaldsEquationSolver,
};

/// Thin-airfoil lift slope used without a polar file: 0.1 per degree (1/rad)
const DEFAULT_LIFT_SLOPE: f64 = 5.729_577_951_308_232;

#[derive(Parser)]
#[command(name = "rotorperf")]
#[command(about = "Helicopter main-rotor hover and forward-flight performance", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    rotor: RotorArgs,

    #[command(flatten)]
    solver: SolverArgs,

    /// Airfoil polar CSV with columns alpha (deg), cl, cd
    #[arg(long, global = true)]
    polar: Option<PathBuf>,

    /// Lift slope of the thin-airfoil polar used without --polar (1/rad)
    #[arg(long, global = true, default_value_t = DEFAULT_LIFT_SLOPE)]
    lift_slope: f64,

    /// Air density (kg/m³)
    #[arg(long, global = true, default_value_t = SEA_LEVEL_DENSITY)]
    density: f64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RotorArgs {
    /// Number of blades
    #[arg(long, global = true, default_value_t = 5)]
    blades: u32,

    /// Blade chord (m)
    #[arg(long, global = true, default_value_t = 0.53)]
    chord: f64,

    /// Rotor diameter (m)
    #[arg(long, global = true, default_value_t = 21.29)]
    diameter: f64,

    /// Hover tip Mach number
    #[arg(long, global = true, default_value_t = 0.624)]
    tip_mach: f64,

    /// Linear washout, root minus tip pitch (deg)
    #[arg(long, global = true, default_value_t = 0.0)]
    washout: f64,

    /// Root cutout as a fraction of radius
    #[arg(long, global = true, default_value_t = 0.1)]
    root_cutout: f64,
}

impl RotorArgs {
    fn spec(&self) -> RotorSpec {
        RotorSpec {
            num_blades: self.blades,
            chord: self.chord,
            diameter: self.diameter,
            tip_mach: self.tip_mach,
            speed_of_sound: SPEED_OF_SOUND,
            washout_deg: self.washout,
            root_cutout: self.root_cutout,
        }
    }
}

#[derive(Args)]
struct SolverArgs {
    /// Number of blade-element stations
    #[arg(long, global = true)]
    stations: Option<usize>,

    /// Cap on induced-velocity iterations per pitch
    #[arg(long, global = true)]
    inner_iterations: Option<usize>,

    /// Fraction of each induced-velocity update applied
    #[arg(long, global = true)]
    relaxation: Option<f64>,

    /// Damped induced-velocity iteration with a monotonic thrust curve
    #[arg(long, global = true)]
    stabilized: bool,
}

impl SolverArgs {
    fn settings(&self) -> SolverSettings {
        let mut settings = if self.stabilized {
            SolverSettings::stabilized()
        } else {
            SolverSettings::new()
        };
        if let Some(stations) = self.stations {
            settings.stations = stations;
        }
        if let Some(cap) = self.inner_iterations {
            settings.inner_max_iterations = cap;
        }
        if let Some(relaxation) = self.relaxation {
            settings.inner_relaxation = relaxation;
        }
        settings
    }
}

#[derive(Args)]
struct MissionArgs {
    /// Usable fuel (kg)
    #[arg(long, default_value_t = 2000.0)]
    fuel: f64,

    /// Specific fuel consumption (kg/kWh)
    #[arg(long, default_value_t = 0.3)]
    sfc: f64,

    /// Drive-train loss fraction
    #[arg(long, default_value_t = 0.05)]
    transmission_loss: f64,

    /// Battery capacity for the electric variant (kWh)
    #[arg(long, default_value_t = 800.0)]
    battery: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the hover trim for a gross weight
    Hover {
        /// Gross weight (kg)
        #[arg(long, default_value_t = 13000.0)]
        weight: f64,

        /// Fail instead of reporting the state at maximum pitch when the weight is not reached
        #[arg(long)]
        strict: bool,
    },

    /// Forward-flight power breakdown at one speed
    Forward {
        /// Gross weight (kg)
        #[arg(long, default_value_t = 13000.0)]
        weight: f64,

        /// Free-stream velocity (m/s)
        #[arg(long)]
        velocity: f64,

        /// Equivalent flat-plate area (m²)
        #[arg(long, default_value_t = 1.5)]
        flat_plate_area: f64,
    },

    /// Velocity sweep with endurance and range, written to CSV
    Sweep {
        /// Gross weight (kg)
        #[arg(long, default_value_t = 13000.0)]
        weight: f64,

        /// Equivalent flat-plate area (m²)
        #[arg(long, default_value_t = 1.5)]
        flat_plate_area: f64,

        /// Lowest velocity (m/s)
        #[arg(long, default_value_t = 10.0)]
        v_min: f64,

        /// Highest velocity (m/s)
        #[arg(long, default_value_t = 80.0)]
        v_max: f64,

        /// Number of velocities
        #[arg(long, default_value_t = 50)]
        points: usize,

        #[command(flatten)]
        mission: MissionArgs,

        /// Output CSV file
        #[arg(short, long, default_value = "sweep.csv")]
        output: PathBuf,
    },

    /// Thrust in ground effect against rotor height
    GroundEffect {
        /// Gross weight (kg)
        #[arg(long, default_value_t = 13000.0)]
        weight: f64,

        /// Lowest rotor height (m)
        #[arg(long, default_value_t = 5.65)]
        h_min: f64,

        /// Highest rotor height (m)
        #[arg(long, default_value_t = 50.0)]
        h_max: f64,

        /// Number of heights
        #[arg(long, default_value_t = 50)]
        points: usize,
    },

    /// First-order thrust and power from one cl/cd pair at a shaft speed
    Estimate {
        /// Shaft speed (rpm)
        #[arg(long)]
        rpm: f64,

        /// Blade lift coefficient
        #[arg(long)]
        cl: f64,

        /// Blade drag coefficient
        #[arg(long)]
        cd: f64,

        /// Tip-loss coefficient
        #[arg(long, default_value_t = DEFAULT_TIP_LOSS)]
        tip_loss: f64,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match &cli.command {
        Commands::Hover { weight, strict } => run_hover(&cli, *weight, *strict),
        Commands::Forward { weight, velocity, flat_plate_area } => {
            run_forward(&cli, *weight, *velocity, *flat_plate_area)
        }
        Commands::Sweep { weight, flat_plate_area, v_min, v_max, points, mission, output } => {
            let mission = MissionProfile {
                gross_kg: *weight,
                fuel_kg: mission.fuel,
                sfc: mission.sfc,
                transmission_loss: mission.transmission_loss,
                battery_kwh: mission.battery,
            };
            run_sweep(&cli, &mission, *flat_plate_area, (*v_min, *v_max, *points), output)
        }
        Commands::GroundEffect { weight, h_min, h_max, points } => {
            run_ground_effect(&cli, *weight, (*h_min, *h_max, *points))
        }
        Commands::Estimate { rpm, cl, cd, tip_loss } => run_estimate(&cli, *rpm, *cl, *cd, *tip_loss),
    }
}

fn parse_level(level: &str) -> Result<Level, Box<dyn Error>> {
    level
        .parse::<Level>()
        .map_err(|e| format!("invalid --log-level {level:?}: {e}").into())
}

fn init_logging(level: &str) -> Result<(), Box<dyn Error>> {
    let level = parse_level(level)?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Polar from `--polar`, or the thin-airfoil table.
fn load_polar(cli: &Cli) -> Result<PolarTable, Box<dyn Error>> {
    match &cli.polar {
        Some(path) => data::read_polar(path),
        None => {
            info!(lift_slope = cli.lift_slope, "no polar file given, using thin-airfoil polar");
            Ok(PolarTable::thin_airfoil(cli.lift_slope, -5.0, 25.0, 0.5)?)
        }
    }
}

/// Geometry, polar and hover solution shared by most subcommands.
fn solve_hover(cli: &Cli, weight: f64) -> Result<(RotorGeometry, HoverSolution), Box<dyn Error>> {
    let geometry = RotorGeometry::from_spec(&cli.rotor.spec())?;
    let polar = load_polar(cli)?;
    let (alpha_min, alpha_max) = polar.alpha_range();
    info!(
        radius = geometry.radius,
        omega = geometry.omega,
        solidity = geometry.solidity,
        alpha_min,
        alpha_max,
        "rotor ready"
    );

    let solver = HoverSolver::with_settings(&geometry, &polar, cli.solver.settings())?;
    let solution = solver.solve(weight, cli.density)?;
    Ok((geometry, solution))
}

/// Print a serializable value as JSON, or a sorted key/value listing.
fn report<T: Serialize>(cli: &Cli, value: &T, summary: HashMap<String, String>) -> Result<(), Box<dyn Error>> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        for (key, text) in summary.into_iter().collect::<BTreeMap<_, _>>() {
            println!("{:<28} {}", key, text);
        }
    }
    Ok(())
}

fn run_hover(cli: &Cli, weight: f64, strict: bool) -> Result<(), Box<dyn Error>> {
    let (_, solution) = solve_hover(cli, weight)?;
    let s = &solution.state;

    let mut summary = HashMap::new();
    summary.insert("collective pitch (deg)".to_string(), format!("{:.1}", s.pitch_deg));
    summary.insert("thrust (kg)".to_string(), format!("{:.1}", s.thrust_kg()));
    summary.insert("target reached".to_string(), solution.diagnostics.target_reached.to_string());
    summary.insert("ct".to_string(), format!("{:.6}", s.ct));
    summary.insert("tip loss B".to_string(), format!("{:.5}", s.tip_loss));
    summary.insert("mean induced velocity (m/s)".to_string(), format!("{:.3}", s.mean_induced_velocity));
    summary.insert("induced power (SHP)".to_string(), format!("{:.1}", s.induced_shp()));
    summary.insert("profile power (SHP)".to_string(), format!("{:.1}", s.profile_shp()));
    summary.insert("total power (SHP)".to_string(), format!("{:.1}", s.total_shp()));
    summary.insert("figure of merit".to_string(), format!("{:.4}", s.figure_of_merit));
    summary.insert("max figure of merit".to_string(), format!("{:.4}", s.max_figure_of_merit));
    summary.insert(
        "non-converged pitches".to_string(),
        solution.diagnostics.non_converged.len().to_string(),
    );

    if cli.json {
        let fom = figure_of_merit_curve(s, 50);
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({
            "solution": &solution,
            "figure_of_merit_curve": fom,
        }))?);
    } else {
        report(cli, &solution, summary)?;
    }

    if strict {
        solution.require_target()?;
    }
    Ok(())
}

fn run_forward(cli: &Cli, weight: f64, velocity: f64, flat_plate_area: f64) -> Result<(), Box<dyn Error>> {
    let (_, solution) = solve_hover(cli, weight)?;
    if !solution.diagnostics.target_reached {
        warn!("forward flight computed from a hover state that does not carry the weight");
    }
    let hover = &solution.state;
    let model = ForwardFlightModel::new(&cli.solver.settings());
    let state = model.evaluate(hover, velocity, cli.density, flat_plate_area)?;

    let mut summary = HashMap::new();
    summary.insert("velocity (km/h)".to_string(), format!("{:.1}", velocity * 3.6));
    summary.insert("advance ratio".to_string(), format!("{:.4}", state.advance_ratio));
    summary.insert("downwash ratio".to_string(), format!("{:.4}", state.downwash_ratio));
    summary.insert("induced power (SHP)".to_string(), format!("{:.1}", state.induced_shp()));
    summary.insert("profile power (SHP)".to_string(), format!("{:.1}", state.profile_shp()));
    summary.insert("parasite power (SHP)".to_string(), format!("{:.1}", state.parasite_shp()));
    summary.insert("total power (SHP)".to_string(), format!("{:.1}", state.horsepower));
    summary.insert("effective drag (N)".to_string(), format!("{:.1}", state.effective_drag()));
    report(cli, &state, summary)
}

fn run_sweep(
    cli: &Cli,
    mission: &MissionProfile,
    flat_plate_area: f64,
    (v_min, v_max, points): (f64, f64, usize),
    output: &Path,
) -> Result<(), Box<dyn Error>> {
    mission.validate()?;
    let (_, solution) = solve_hover(cli, mission.gross_kg)?;
    let hover = &solution.state;

    let velocities = Array1::linspace(v_min, v_max, points).to_vec();
    let model = ForwardFlightModel::new(&cli.solver.settings());
    let curve = PerformanceCurve::compute(&model, hover, &velocities, cli.density, flat_plate_area)?;
    if !curve.skipped.is_empty() {
        warn!(skipped = curve.skipped.len(), "some velocities were dropped from the sweep");
    }

    let fuel = curve.fuel_performance(mission)?;
    let electric = curve.electric_performance(mission)?;
    data::write_sweep(output, &curve, &fuel, &electric)?;

    let downwash = downwash_curve(
        &WaldsEquationSolver::from_settings(&cli.solver.settings()),
        hover,
        &Array1::linspace(0.0, 50.0, 50).to_vec(),
    )?;

    let mut summary = curve.summary();
    summary.insert("output".to_string(), output.display().to_string());
    if let Some(best) = fuel.iter().max_by(|a, b| a.breguet_range_km.total_cmp(&b.breguet_range_km)) {
        summary.insert(
            "max Breguet range (km)".to_string(),
            format!("{:.0} at {:.0} km/h", best.breguet_range_km, best.velocity_kmh),
        );
    }
    if let Some(best) = fuel.iter().max_by(|a, b| a.endurance_h.total_cmp(&b.endurance_h)) {
        summary.insert(
            "max endurance (h)".to_string(),
            format!("{:.2} at {:.0} km/h", best.endurance_h, best.velocity_kmh),
        );
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({
            "curve": &curve,
            "fuel": fuel,
            "electric": electric,
            "downwash": downwash,
        }))?);
        Ok(())
    } else {
        report(cli, &curve, summary)
    }
}

fn run_ground_effect(cli: &Cli, weight: f64, (h_min, h_max, points): (f64, f64, usize)) -> Result<(), Box<dyn Error>> {
    let (geometry, solution) = solve_hover(cli, weight)?;
    let heights = Array1::linspace(h_min, h_max, points).to_vec();
    let curve = ground_effect_curve(solution.state.thrust, &geometry, &heights)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&curve)?);
    } else {
        println!("{:>10} {:>14}", "height (m)", "thrust (kg)");
        for p in &curve {
            println!("{:>10.2} {:>14.1}", p.height, p.thrust_ige / GRAVITY);
        }
        println!("free-air thrust: {:.1} kg", solution.state.thrust_kg());
    }
    Ok(())
}

fn run_estimate(cli: &Cli, rpm: f64, cl: f64, cd: f64, tip_loss: f64) -> Result<(), Box<dyn Error>> {
    let r = &cli.rotor;
    let geometry = RotorGeometry::from_rpm(r.blades, r.chord, r.diameter, rpm, r.washout, r.root_cutout)?;
    let estimate = QuickEstimate::new(geometry, cl, cd, tip_loss)?;
    report(cli, &estimate, estimate.summary(cli.density))
}
