//! Benchmarks for the rotor solvers on the critical path of a performance study.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rotorperf_calc::{
    ForwardFlightModel, HoverSolver, HoverState, PerformanceCurve, PolarTable, RotorGeometry,
    RotorSpec, SolverSettings, WaldsEquationSolver,
};

const RHO: f64 = 1.225;

/// Reference utility rotor
fn reference_geometry() -> RotorGeometry {
    RotorGeometry::from_spec(&RotorSpec::reference_utility()).unwrap()
}

/// Thin-airfoil polar with a 0.1/deg lift slope
fn reference_polar() -> PolarTable {
    PolarTable::thin_airfoil(0.1 * 180.0 / std::f64::consts::PI, -5.0, 25.0, 0.5).unwrap()
}

fn reference_hover() -> HoverState {
    HoverSolver::new(&reference_geometry(), &reference_polar())
        .solve(13000.0, RHO)
        .unwrap()
        .state
}

/// Velocity grid used by the performance plots
fn velocity_grid(n: usize) -> Vec<f64> {
    (0..n).map(|i| 10.0 + i as f64 * 60.0 / (n - 1) as f64).collect()
}

/// Benchmark a single blade-element pass and the full pitch search
fn bench_hover(c: &mut Criterion) {
    let geometry = reference_geometry();
    let polar = reference_polar();

    let mut group = c.benchmark_group("Hover");

    group.bench_function("thrust_at_pitch", |bencher| {
        let solver = HoverSolver::new(&geometry, &polar);
        bencher.iter(|| solver.thrust_at_pitch(10.0, RHO))
    });

    group.bench_function("solve_13000kg", |bencher| {
        let solver = HoverSolver::new(&geometry, &polar);
        bencher.iter(|| solver.solve(13000.0, RHO))
    });

    group.bench_function("solve_13000kg_stabilized", |bencher| {
        let solver = HoverSolver::with_settings(&geometry, &polar, SolverSettings::stabilized()).unwrap();
        bencher.iter(|| solver.solve(13000.0, RHO))
    });

    // Station count scaling
    for stations in [10usize, 20, 50] {
        let mut settings = SolverSettings::new();
        settings.stations = stations;
        let solver = HoverSolver::with_settings(&geometry, &polar, settings).unwrap();
        group.throughput(Throughput::Elements(stations as u64));
        group.bench_with_input(BenchmarkId::new("stations", stations), &solver, |bencher, solver| {
            bencher.iter(|| solver.solve(13000.0, RHO))
        });
    }

    group.finish();
}

/// Benchmark Wald's equation
fn bench_walds(c: &mut Criterion) {
    let solver = WaldsEquationSolver::default();
    c.bench_function("walds_solve", |bencher| bencher.iter(|| solver.solve(20.0, 10.0, 0.0)));
}

/// Benchmark forward-flight sweeps, sequential against parallel
fn bench_forward(c: &mut Criterion) {
    let hover = reference_hover();
    let model = ForwardFlightModel::default();

    let mut group = c.benchmark_group("ForwardFlight");
    for n in [50usize, 500] {
        let velocities = velocity_grid(n);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("sequential", n), &velocities, |bencher, v| {
            bencher.iter(|| {
                v.iter()
                    .map(|&vel| model.evaluate(&hover, vel, RHO, 1.5))
                    .collect::<Vec<_>>()
            })
        });

        group.bench_with_input(BenchmarkId::new("sweep", n), &velocities, |bencher, v| {
            bencher.iter(|| model.sweep(&hover, v, RHO, 1.5))
        });
    }
    group.finish();
}

/// Benchmark the end-to-end performance curve (hover + sweep + metrics)
fn bench_performance_curve(c: &mut Criterion) {
    let geometry = reference_geometry();
    let polar = reference_polar();
    let velocities = velocity_grid(50);

    c.bench_function("performance_curve_end_to_end", |bencher| {
        bencher.iter(|| {
            let hover = HoverSolver::new(&geometry, &polar).solve(13000.0, RHO).unwrap().state;
            PerformanceCurve::compute(&ForwardFlightModel::default(), &hover, &velocities, RHO, 1.5)
        })
    });
}

criterion_group!(benches, bench_hover, bench_walds, bench_forward, bench_performance_curve);

criterion_main!(benches);
