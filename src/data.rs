// CSV input and output through polars: airfoil polars in, sweep tables out.

use std::error::Error;
use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use rotorperf_calc::metrics::{ElectricPerformance, FuelPerformance, PerformanceCurve, PerformancePoint};
use rotorperf_calc::PolarTable;

/// Read a polar CSV with columns `alpha` (deg), `cl`, `cd`.
///
/// Rows with a missing value are dropped and the rest sorted by angle.
pub fn read_polar(path: &Path) -> Result<PolarTable, Box<dyn Error>> {
    let df = LazyCsvReader::new(path)
        .has_header(true)
        .finish()?
        .select([
            col("alpha").cast(DataType::Float64),
            col("cl").cast(DataType::Float64),
            col("cd").cast(DataType::Float64),
        ])
        .drop_nulls(None)
        .sort("alpha", SortOptions::default())
        .collect()?;

    let alpha = column_values(&df, "alpha")?;
    let cl = column_values(&df, "cl")?;
    let cd = column_values(&df, "cd")?;
    info!(path = %path.display(), samples = alpha.len(), "polar loaded");

    Ok(PolarTable::from_columns(&alpha, &cl, &cd)?)
}

fn column_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    Ok(df.column(name)?.f64()?.into_no_null_iter().collect())
}

/// Write one row per swept velocity: power breakdown, drag and mission figures.
pub fn write_sweep(
    path: &Path,
    curve: &PerformanceCurve,
    fuel: &[FuelPerformance],
    electric: &[ElectricPerformance],
) -> Result<(), Box<dyn Error>> {
    let field = |f: fn(&PerformancePoint) -> f64| -> Vec<f64> {
        curve.points.iter().map(f).collect()
    };

    let mut df = df!(
        "velocity" => field(|p| p.state.velocity),
        "velocity_kmh" => field(|p| p.velocity_kmh()),
        "advance_ratio" => field(|p| p.state.advance_ratio),
        "downwash_ratio" => field(|p| p.state.downwash_ratio),
        "induced_power" => field(|p| p.state.induced_power),
        "profile_power" => field(|p| p.state.profile_power),
        "parasite_power" => field(|p| p.state.parasite_power),
        "total_power" => field(|p| p.state.total_power),
        "horsepower" => field(|p| p.state.horsepower),
        "effective_drag" => field(|p| p.effective_drag),
        "lift_to_drag" => field(|p| p.lift_to_drag),
        "fuel_flow" => fuel.iter().map(|f| f.fuel_flow).collect::<Vec<_>>(),
        "endurance_h" => fuel.iter().map(|f| f.endurance_h).collect::<Vec<_>>(),
        "specific_range" => fuel.iter().map(|f| f.specific_range).collect::<Vec<_>>(),
        "breguet_range_km" => fuel.iter().map(|f| f.breguet_range_km).collect::<Vec<_>>(),
        "electric_endurance_h" => electric.iter().map(|e| e.endurance_h).collect::<Vec<_>>(),
        "electric_range_km" => electric.iter().map(|e| e.range_km).collect::<Vec<_>>()
    )?;

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;
    info!(path = %path.display(), rows = df.height(), "sweep written");
    Ok(())
}
