//! Shared fixture for integration tests: a small grid, a synthetic tidal
//! atlas, a synthetic ocean reanalysis and a multi-column time series file.

#![allow(dead_code)]

use std::io::Write;

use bctides::{
    AtlasReference, BoundaryConditionCompiler, BoundarySegment, CatalogProvider, CompiledBoundary, CompilerOptions,
    DataLocation, Dataset, Diagnostics, ExternalDataSource, Grid, LegacyAuxiliary, NodalPolicy, NodeIndex, Result,
    SourceVariable, TidalConfiguration, TimeWindow, VerticalGrid,
};
use bctides::boundary::TimeSeriesRef;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::NamedTempFile;

pub const LONS: [f64; 2] = [0.0, 20.0];
pub const LATS: [f64; 2] = [40.0, 60.0];
pub const DEPTHS: [f64; 2] = [0.0, 100.0];

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Harmonic field over the 2×2 atlas grid, dims `[lat, lon]`.
fn harmonic(value: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(4);
    for &lat in &LATS {
        for &lon in &LONS {
            out.push(value(lon, lat));
        }
    }
    out
}

/// Elevation and current atlases with M2 and S2.
pub fn atlas(scale: f64) -> Dataset {
    Dataset::new("atlas")
        .with_coordinate("lon", LONS.to_vec())
        .with_coordinate("lat", LATS.to_vec())
        .with_variable("m2_amp", &["lat", "lon"], harmonic(|lon, _| scale * (1.0 + 0.01 * lon)))
        .unwrap()
        .with_variable("m2_pha", &["lat", "lon"], harmonic(|_, lat| 30.0 + lat))
        .unwrap()
        .with_variable("s2_amp", &["lat", "lon"], harmonic(|_, _| scale * 0.3))
        .unwrap()
        .with_variable("s2_pha", &["lat", "lon"], harmonic(|lon, _| 120.0 + 2.0 * lon))
        .unwrap()
}

/// Hourly ocean state over the first 12 hours of 2024.
pub fn ocean() -> Dataset {
    let times: Vec<DateTime<Utc>> = (0..=12).map(|h| start() + Duration::hours(h)).collect();
    let n_times = times.len();
    let mut ssh = Vec::new();
    for k in 0..n_times {
        ssh.extend(harmonic(|lon, lat| 0.05 * k as f64 + 0.001 * lon - 0.002 * lat));
    }
    let profile = |f: &dyn Fn(usize, f64, f64, f64) -> f64| {
        let mut out = Vec::new();
        for k in 0..n_times {
            for &depth in &DEPTHS {
                out.extend(harmonic(|lon, lat| f(k, depth, lon, lat)));
            }
        }
        out
    };
    let temp = profile(&|k, d, lon, _| 12.0 - 0.05 * d + 0.1 * k as f64 + 0.01 * lon);
    let salt = profile(&|_, d, _, lat| 34.0 + 0.01 * d + 0.005 * lat);
    let u = profile(&|k, d, _, _| 0.2 - 0.001 * d + 0.01 * k as f64);
    let v = profile(&|_, d, lon, _| -0.1 + 0.0005 * d + 0.002 * lon);

    let dims = ["time", "depth", "lat", "lon"];
    Dataset::new("ocean")
        .with_coordinate("lon", LONS.to_vec())
        .with_coordinate("lat", LATS.to_vec())
        .with_coordinate("depth", DEPTHS.to_vec())
        .with_time_coordinate("time", times)
        .with_variable("zos", &["time", "lat", "lon"], ssh)
        .unwrap()
        .with_variable("thetao", &dims, temp)
        .unwrap()
        .with_variable("so", &dims, salt)
        .unwrap()
        .with_variable("uo", &dims, u)
        .unwrap()
        .with_variable("vo", &dims, v)
        .unwrap()
}

/// Source mapping every quantity to the `ocean` catalog entry.
pub fn ocean_source() -> ExternalDataSource {
    ExternalDataSource::new(DataLocation::catalog("ocean"))
        .with_variable(SourceVariable::Elevation, "zos")
        .with_variable(SourceVariable::U, "uo")
        .with_variable(SourceVariable::V, "vo")
        .with_variable(SourceVariable::Temperature, "thetao")
        .with_variable(SourceVariable::Salinity, "so")
}

pub fn tides() -> TidalConfiguration {
    TidalConfiguration::new(["M2", "S2"], "synthetic")
        .with_elevation(AtlasReference::new(DataLocation::catalog("tide_h")))
        .with_velocity(
            AtlasReference::new(DataLocation::catalog("tide_u")),
            AtlasReference::new(DataLocation::catalog("tide_v")),
        )
        .with_nodal(NodalPolicy::Schureman)
}

pub struct Fixture {
    pub grid: Grid,
    pub window: TimeWindow,
    pub tides: TidalConfiguration,
    pub provider: CatalogProvider,
    pub options: CompilerOptions,
    /// time, elevation, discharge, temperature, salinity
    pub series: NamedTempFile,
}

/// Route `tracing` output through the test harness; `RUST_LOG` selects levels.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let mut series = NamedTempFile::new().unwrap();
        writeln!(series, "# time elev flux temp salt").unwrap();
        for h in 0..=10 {
            let t = h as f64 * 3600.0;
            writeln!(series, "{t} {} {} {} {}", 0.1 * h as f64, -100.0 - h as f64, 8.0 + 0.1 * h as f64, 30.0).unwrap();
        }

        let provider = CatalogProvider::new()
            .with_entry("tide_h", atlas(1.0))
            .with_entry("tide_u", atlas(0.4))
            .with_entry("tide_v", atlas(0.2))
            .with_entry("ocean", ocean());

        Self {
            grid: Grid::new(
                vec![(10.0, 50.0), (10.5, 50.0), (11.0, 50.5)],
                vec![20.0, 40.0, 60.0],
                VerticalGrid::uniform_sigma(3),
            )
            .with_open_boundary(vec![NodeIndex::new(0), NodeIndex::new(1)])
            .with_open_boundary(vec![NodeIndex::new(2)]),
            window: TimeWindow::new(start(), start() + Duration::hours(3), Duration::hours(1)),
            tides: tides(),
            provider,
            options: CompilerOptions::default(),
            series,
        }
    }

    pub fn series(&self, column: usize) -> TimeSeriesRef {
        TimeSeriesRef::new(self.series.path()).with_column(column)
    }

    /// Every value a flag can refer to, sized for a two-node segment.
    pub fn auxiliary(&self) -> LegacyAuxiliary {
        LegacyAuxiliary {
            elevation_constant: Some(0.25),
            discharge: Some(-150.0),
            temperature_constant: Some(9.5),
            salinity_constant: Some(31.0),
            elevation_series: Some(self.series(0)),
            velocity_series: Some(self.series(1)),
            temperature_series: Some(self.series(2)),
            salinity_series: Some(self.series(3)),
            elevation_source: Some(ocean_source()),
            velocity_source: Some(ocean_source()),
            temperature_source: Some(ocean_source()),
            salinity_source: Some(ocean_source()),
            inflow_relax: Some(0.5),
            outflow_relax: Some(0.9),
            temperature_nudge: Some(0.8),
            salinity_nudge: None,
            mean_elevation: Some(vec![0.0, 0.1]),
            mean_velocity: Some(vec![0.05, 0.02]),
        }
    }

    pub fn compile(&self, segments: &[BoundarySegment]) -> Result<(CompiledBoundary, Diagnostics)> {
        BoundaryConditionCompiler::new(&self.provider, &self.options).compile_all(
            &self.grid,
            segments,
            Some(&self.tides),
            &self.window,
        )
    }
}

pub fn assert_close(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len(), "length mismatch");
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).abs() <= tol, "entry {i}: {x} vs {y}");
    }
}
