//! Integration tests for boundary compilation.
//!
//! Covers the flag/variant equivalence table, harmonic + external
//! additivity, determinism, coverage handling and fail-fast validation.

mod common;

use bctides::boundary::to_legacy;
use bctides::{
    BoundaryConditionCompiler, BoundaryConfig, BoundarySegment, CatalogProvider, CompileWarning, CompiledVelocity,
    CompilerOptions, CoverageDetail, DataLocation, Dataset, ElevationSpec, ErrorKind, ExternalDataSource, Grid,
    LegacyFlags, NodeIndex, SegmentIndex, SourceVariable, TimeWindow, TracerSpec, VelocitySpec, VerticalGrid,
};
use chrono::{Duration, TimeZone, Utc};
use common::{assert_close, ocean_source, Fixture};

fn seg0() -> BoundarySegment {
    BoundarySegment::new(SegmentIndex::new(0))
}

/// Flags → variants → flags must be the identity, and both variant
/// encodings must compile to the same output.
fn check_round_trip(fixture: &Fixture, flags: LegacyFlags) {
    let aux = fixture.auxiliary();
    let segment = flags.to_segment(SegmentIndex::new(0), &aux).unwrap();
    let (back_flags, back_aux) = to_legacy(&segment);
    assert_eq!(back_flags, flags, "flags changed for {flags}");
    let again = back_flags.to_segment(SegmentIndex::new(0), &back_aux).unwrap();
    assert_eq!(again, segment, "variants changed for {flags}");

    let (a, _) = fixture
        .compile(std::slice::from_ref(&segment))
        .unwrap_or_else(|e| panic!("flags {flags}: {e}"));
    let (b, _) = fixture.compile(&[again]).unwrap();
    assert_eq!(a, b, "compiled output differs for {flags}");
    assert_eq!(a.segments[0].flags, flags);
}

#[test]
fn test_legacy_flag_table_elevation_velocity() {
    let fixture = Fixture::new();
    for &elevation in &LegacyFlags::ELEVATION {
        for &velocity in &LegacyFlags::VELOCITY {
            check_round_trip(&fixture, LegacyFlags::new(elevation, velocity, 0, 0));
        }
    }
}

#[test]
fn test_legacy_flag_table_tracers() {
    let fixture = Fixture::new();
    for &temperature in &LegacyFlags::TRACER {
        for &salinity in &LegacyFlags::TRACER {
            check_round_trip(&fixture, LegacyFlags::new(3, 2, temperature, salinity));
        }
    }
}

#[test]
fn test_undocumented_flags_rejected() {
    let fixture = Fixture::new();
    let aux = fixture.auxiliary();
    for flags in [
        LegacyFlags::new(6, 0, 0, 0),
        LegacyFlags::new(0, -2, 0, 0),
        LegacyFlags::new(0, 0, 5, 0),
        LegacyFlags::new(0, 0, 0, -1),
    ] {
        let err = flags.to_segment(SegmentIndex::new(0), &aux).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration, "{flags}");
    }
}

#[test]
fn test_harmonic_plus_external_is_additive() {
    let fixture = Fixture::new();
    let source = ocean_source();
    let combined = seg0()
        .with_elevation(ElevationSpec::harmonic_plus_external(source.clone()))
        .with_velocity(VelocitySpec::harmonic_plus_external(source.clone()));
    let harmonic = seg0()
        .with_elevation(ElevationSpec::Harmonic)
        .with_velocity(VelocitySpec::Harmonic);
    let external = seg0()
        .with_elevation(ElevationSpec::external(source.clone()))
        .with_velocity(VelocitySpec::external(source));

    let (combined, _) = fixture.compile(&[combined]).unwrap();
    let (harmonic, _) = fixture.compile(&[harmonic]).unwrap();
    let (external, _) = fixture.compile(&[external]).unwrap();

    let elevation = |b: &bctides::CompiledBoundary| b.segments[0].elevation.clone().unwrap().values;
    let expected = elevation(&harmonic).try_add(&elevation(&external)).unwrap();
    assert_close(elevation(&combined).values(), expected.values(), 1e-12);

    let currents = |b: &bctides::CompiledBoundary| match b.segments[0].velocity.clone() {
        Some(CompiledVelocity::Components { u, v, .. }) => (u, v),
        other => panic!("expected velocity components, got {other:?}"),
    };
    let (u, v) = currents(&combined);
    let (hu, hv) = currents(&harmonic);
    let (eu, ev) = currents(&external);
    assert_eq!(u.shape(), (2, 3, 4));
    assert_close(u.values(), hu.try_add(&eu).unwrap().values(), 1e-12);
    assert_close(v.values(), hv.try_add(&ev).unwrap().values(), 1e-12);
}

#[test]
fn test_compilation_is_deterministic() {
    let fixture = Fixture::new();
    let source = ocean_source();
    let segments = vec![
        BoundarySegment::new(SegmentIndex::new(1))
            .with_elevation(ElevationSpec::constant(0.1))
            .with_velocity(VelocitySpec::time_series(fixture.series(1)))
            .with_temperature(TracerSpec::initial_profile())
            .with_salinity(TracerSpec::constant(0.5)),
        seg0()
            .with_elevation(ElevationSpec::harmonic_plus_external(source.clone()))
            .with_velocity(VelocitySpec::relaxed_tidal(source.clone(), 0.5, 0.9))
            .with_temperature(TracerSpec::external(source.clone()).with_nudge(0.7))
            .with_salinity(TracerSpec::external(source)),
    ];

    let (first, first_warnings) = fixture.compile(&segments).unwrap();
    let (second, second_warnings) = fixture.compile(&segments).unwrap();
    assert_eq!(first, second);
    assert_eq!(first_warnings, second_warnings);
    assert_eq!(
        serde_yaml::to_string(&first).unwrap(),
        serde_yaml::to_string(&second).unwrap()
    );
}

#[test]
fn test_constant_elevation_everywhere() {
    let fixture = Fixture::new();
    let segments = [seg0().with_elevation(ElevationSpec::constant(2.5))];
    let (compiled, warnings) = fixture.compile(&segments).unwrap();
    assert!(warnings.is_empty());
    let values = &compiled.segments[0].elevation.as_ref().unwrap().values;
    assert_eq!(values.shape(), (2, 1, 4));
    assert!(values.values().iter().all(|&v| v == 2.5));
}

fn january_source() -> (CatalogProvider, ExternalDataSource) {
    let day = |d| Utc.with_ymd_and_hms(2023, 1, d, 0, 0, 0).unwrap();
    let dataset = Dataset::new("january")
        .with_coordinate("lon", vec![0.0, 20.0])
        .with_coordinate("lat", vec![40.0, 60.0])
        .with_time_coordinate("time", vec![day(1), day(2)])
        .with_variable("ssh", &["time", "lat", "lon"], vec![0.1, 0.1, 0.1, 0.1, 0.3, 0.3, 0.3, 0.3])
        .unwrap();
    let provider = CatalogProvider::new().with_entry("january", dataset);
    let source = ExternalDataSource::new(DataLocation::catalog("january"))
        .with_variable(SourceVariable::Elevation, "ssh");
    (provider, source)
}

#[test]
fn test_request_far_outside_time_coverage_fails() {
    let fixture = Fixture::new();
    let (provider, source) = january_source();
    let options = CompilerOptions::default();
    let june = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
    let window = TimeWindow::new(june, june + Duration::hours(2), Duration::hours(1));
    let err = BoundaryConditionCompiler::new(&provider, &options)
        .compile_all(&fixture.grid, &[seg0().with_elevation(ElevationSpec::external(source))], None, &window)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataCoverage);
    assert_eq!(err.segment(), Some(SegmentIndex::new(0)));
}

#[test]
fn test_request_just_past_time_coverage_clamps() {
    let fixture = Fixture::new();
    let (provider, source) = january_source();
    let options = CompilerOptions::default();
    let edge = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    let window = TimeWindow::new(edge, edge + Duration::hours(1), Duration::hours(1));
    let (compiled, warnings) = BoundaryConditionCompiler::new(&provider, &options)
        .compile_all(&fixture.grid, &[seg0().with_elevation(ElevationSpec::external(source))], None, &window)
        .unwrap();

    let values = &compiled.segments[0].elevation.as_ref().unwrap().values;
    assert!((values.get(0, 0, 1).unwrap() - 0.3).abs() < 1e-12);
    assert!((values.get(1, 0, 1).unwrap() - 0.3).abs() < 1e-12);

    let warning = warnings.coverage_warnings().next().expect("coverage warning");
    match warning {
        CompileWarning::DataCoverage {
            segment,
            detail: CoverageDetail::TimeClamped { count, edge: used, .. },
            ..
        } => {
            assert_eq!(*segment, Some(SegmentIndex::new(0)));
            assert_eq!(*count, 1);
            assert_eq!(*used, edge);
        }
        other => panic!("unexpected warning {other}"),
    }
}

#[test]
fn test_relaxed_without_outflow_fails_before_sampling() {
    // The provider is empty: reaching the sampler would give a dataset error.
    let fixture = Fixture::new();
    let provider = CatalogProvider::new();
    let options = CompilerOptions::default();
    let segment = seg0().with_velocity(VelocitySpec::Relaxed {
        source: Some(ocean_source()),
        inflow_relax: Some(0.5),
        outflow_relax: None,
        tidal: false,
    });
    let err = BoundaryConditionCompiler::new(&provider, &options)
        .compile_all(&fixture.grid, &[segment], None, &fixture.window)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.segment(), Some(SegmentIndex::new(0)));
    assert!(err.to_string().contains("velocity.outflow_relax"), "{err}");
}

#[test]
fn test_missing_tides_names_segment() {
    let fixture = Fixture::new();
    let options = CompilerOptions::default();
    let segments = [
        seg0().with_elevation(ElevationSpec::constant(0.0)),
        BoundarySegment::new(SegmentIndex::new(1)).with_elevation(ElevationSpec::Harmonic),
    ];
    let err = BoundaryConditionCompiler::new(&fixture.provider, &options)
        .compile_all(&fixture.grid, &segments, None, &fixture.window)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.segment(), Some(SegmentIndex::new(1)));
}

#[test]
fn test_yaml_config_layers() {
    let fixture = Fixture::new();
    let yaml = format!(
        r#"
setup: nested
defaults:
  source:
    location: {{ kind: catalog, entry: ocean }}
    variables: {{ elevation: zos, u: uo, v: vo, temperature: thetao, salinity: so }}
  inflow_relax: 0.1
  outflow_relax: 0.8
legacy:
  - index: 1
    flags: {{ elevation: 0, velocity: 1, temperature: 2, salinity: 2 }}
    auxiliary:
      velocity_series: {{ path: {path}, column: 1 }}
      temperature_constant: 4.0
      salinity_constant: 0.2
segments:
  - index: 0
    temperature: {{ kind: initial_profile, nudge: 0.3 }}
"#,
        path = fixture.series.path().display()
    );
    let config = BoundaryConfig::from_yaml_str(&yaml).unwrap();
    let (compiled, _) = BoundaryConditionCompiler::new(&fixture.provider, &fixture.options)
        .compile_config(&fixture.grid, &config, &fixture.window)
        .unwrap();
    assert_eq!(
        compiled.legacy_flags(),
        vec![LegacyFlags::new(4, -4, 3, 4), LegacyFlags::new(0, 1, 2, 2)]
    );
    let nested = &compiled.segments[0];
    assert_eq!(nested.velocity.as_ref().unwrap().relaxation().unwrap().outflow, 0.8);
    let temperature = nested.temperature.as_ref().unwrap();
    assert!(temperature.values.is_none());
    assert_eq!(temperature.nudge, 0.3);

    let river = &compiled.segments[1];
    match river.velocity.as_ref().unwrap() {
        CompiledVelocity::Discharge { values } => {
            assert_close(&values.time_slice(0).to_vec(), &[-100.0], 1e-12);
            assert_close(&values.time_slice(3).to_vec(), &[-103.0], 1e-12);
        }
        other => panic!("expected discharge, got {other:?}"),
    }
}

#[test]
fn test_external_tracers_follow_levels() {
    let fixture = Fixture::new();
    let segments = [seg0().with_temperature(TracerSpec::external(ocean_source()))];
    let (compiled, warnings) = fixture.compile(&segments).unwrap();
    assert!(warnings.is_empty(), "{}", warnings.summary());
    let temperature = compiled.segments[0].temperature.as_ref().unwrap();
    let values = temperature.values.as_ref().unwrap();
    assert_eq!(values.shape(), (2, 3, 4));
    // Level 0 is at the bed (40 m at node 1), the top level at the surface.
    let bed = values.get(1, 0, 0).unwrap();
    let surface = values.get(1, 2, 0).unwrap();
    assert!((surface - bed - 0.05 * 40.0).abs() < 1e-9, "bed {bed}, surface {surface}");
}

#[test]
fn test_grid_without_enough_boundaries() {
    let options = CompilerOptions::default();
    let provider = CatalogProvider::new();
    let grid = Grid::new(vec![(0.0, 0.0)], vec![5.0], VerticalGrid::barotropic())
        .with_open_boundary(vec![NodeIndex::new(0)]);
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let window = TimeWindow::new(start, start + Duration::hours(1), Duration::hours(1));
    let err = BoundaryConditionCompiler::new(&provider, &options)
        .compile_all(&grid, &[BoundarySegment::new(SegmentIndex::new(3))], None, &window)
        .unwrap_err();
    assert_eq!(err.segment(), Some(SegmentIndex::new(3)));
}
