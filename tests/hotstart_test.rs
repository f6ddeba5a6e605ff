//! Integration tests for hotstart generation.

mod common;

use bctides::{
    BoundaryConfig, BoundaryGrid, BoundarySegment, CompilerOptions, DataLocation, ErrorKind, ExternalDataSource, HotstartGenerator,
    HotstartSources, SegmentIndex, SourceVariable, TracerField, TracerSpec,
};
use common::{ocean_source, start, Fixture};

#[test]
fn test_fails_without_temperature_source() {
    let fixture = Fixture::new();
    let segments = [
        BoundarySegment::new(SegmentIndex::new(0))
            .with_temperature(TracerSpec::constant(10.0))
            .with_salinity(TracerSpec::external(ocean_source())),
        BoundarySegment::new(SegmentIndex::new(1)).with_temperature(TracerSpec::initial_profile()),
    ];
    let err = HotstartGenerator::new(&fixture.provider, &fixture.options)
        .generate_for(&fixture.grid, None, &segments, start())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("hotstart.temperature"), "{err}");
}

#[test]
fn test_explicit_source_gives_non_negative_salinity() {
    let fixture = Fixture::new();
    let sources = HotstartSources::shared(ocean_source());
    let (hotstart, warnings) = HotstartGenerator::new(&fixture.provider, &fixture.options)
        .generate_for(&fixture.grid, Some(&sources), &[], start())
        .unwrap();
    assert!(warnings.is_empty(), "{}", warnings.summary());
    assert_eq!(hotstart.n_nodes(), 3);
    assert_eq!(hotstart.n_levels(), 3);
    assert_eq!(hotstart.reference_time, start());
    assert!(hotstart.salinity.values().iter().all(|&s| s >= 0.0));
    assert!(hotstart.elevation.iter().all(|&e| e == 0.0));

    // 34 + 0.01·depth + 0.005·lat at the bed of node 2 (60 m, 50.5°N).
    let bed = hotstart.tracer_at(TracerField::Salinity, 2, 0).unwrap();
    assert!((bed - (34.0 + 0.6 + 0.005 * 50.5)).abs() < 1e-9, "{bed}");
}

#[test]
fn test_sources_fall_back_to_boundary_segments() {
    let fixture = Fixture::new();
    let segments = [
        BoundarySegment::new(SegmentIndex::new(1)).with_temperature(TracerSpec::external(ocean_source())),
        BoundarySegment::new(SegmentIndex::new(0)).with_salinity(TracerSpec::external(ocean_source())),
    ];
    let (hotstart, _) = HotstartGenerator::new(&fixture.provider, &fixture.options)
        .generate_for(&fixture.grid, None, &segments, start())
        .unwrap();
    let surface = hotstart.tracer_at(TracerField::Temperature, 0, 2).unwrap();
    // 12 − 0.05·0 + 0.01·10 at hour 0.
    assert!((surface - 12.1).abs() < 1e-9, "{surface}");
}

#[test]
fn test_chunk_size_does_not_change_result() {
    let fixture = Fixture::new();
    let sources = HotstartSources::shared(ocean_source());
    let whole = CompilerOptions::default().with_hotstart_level_chunk(16);
    let single = CompilerOptions::default().with_hotstart_level_chunk(1);
    let (a, _) = HotstartGenerator::new(&fixture.provider, &whole)
        .generate(&fixture.grid, &sources, start())
        .unwrap();
    let (b, _) = HotstartGenerator::new(&fixture.provider, &single)
        .generate(&fixture.grid, &sources, start())
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_unmapped_salinity_is_reported() {
    let fixture = Fixture::new();
    let temperature_only = ExternalDataSource::new(DataLocation::catalog("ocean"))
        .with_variable(SourceVariable::Temperature, "thetao");
    let sources = HotstartSources {
        temperature: Some(temperature_only.clone()),
        salinity: Some(temperature_only),
    };
    let err = HotstartGenerator::new(&fixture.provider, &fixture.options)
        .generate(&fixture.grid, &sources, start())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_sources_from_yaml_config() {
    let fixture = Fixture::new();
    let config = BoundaryConfig::from_yaml_str(
        r#"
hotstart:
  temperature:
    location: { kind: catalog, entry: ocean }
    variables: { temperature: thetao }
  salinity:
    location: { kind: catalog, entry: ocean }
    variables: { salinity: so }
"#,
    )
    .unwrap();
    let segments = config.segments(fixture.grid.n_open_boundaries()).unwrap();
    let (hotstart, _) = HotstartGenerator::new(&fixture.provider, &fixture.options)
        .generate_for(&fixture.grid, config.hotstart.as_ref(), &segments, start())
        .unwrap();
    assert_eq!(hotstart.temperature.shape(), (3, 3, 1));
}
