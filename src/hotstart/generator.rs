//! HotstartGenerator: tracer sources → full 3-D initial state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::field::HotstartField;
use crate::boundary::BoundarySegment;
use crate::config::CompilerOptions;
use crate::dataset::DatasetProvider;
use crate::diagnostics::{CompileWarning, Diagnostics, TracerField};
use crate::error::{BoundaryError, Result};
use crate::mesh::BoundaryGrid;
use crate::sampling::{ExternalDataSource, ExternalSeriesSampler, SourceVariable};
use crate::types::BoundaryArray;

/// Sources the hotstart tracers are interpolated from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotstartSources {
    /// Temperature source.
    pub temperature: Option<ExternalDataSource>,
    /// Salinity source.
    pub salinity: Option<ExternalDataSource>,
}

impl HotstartSources {
    /// Both tracers from one source.
    pub fn shared(source: ExternalDataSource) -> Self {
        Self {
            temperature: Some(source.clone()),
            salinity: Some(source),
        }
    }

    /// Fill missing tracers from the segments' external tracer specs.
    ///
    /// Explicit sources always win. Segments are scanned in index order and
    /// the first source that maps the tracer is taken.
    pub fn resolve(explicit: Option<&HotstartSources>, segments: &[BoundarySegment]) -> Result<Self> {
        let mut ordered: Vec<&BoundarySegment> = segments.iter().collect();
        ordered.sort_by_key(|s| s.index);

        let pick = |field: TracerField| -> Result<ExternalDataSource> {
            let variable = variable_of(field);
            let explicit = explicit.and_then(|e| match field {
                TracerField::Temperature => e.temperature.as_ref(),
                TracerField::Salinity => e.salinity.as_ref(),
            });
            if let Some(source) = explicit {
                return Ok(source.clone());
            }
            ordered
                .iter()
                .filter_map(|s| match field {
                    TracerField::Temperature => s.temperature.source(),
                    TracerField::Salinity => s.salinity.source(),
                })
                .find(|source| source.mapped_name(variable).is_some())
                .cloned()
                .ok_or_else(|| {
                    BoundaryError::configuration(
                        None,
                        format!("hotstart.{field}"),
                        "no explicit source and no boundary segment provides an external source",
                    )
                })
        };

        Ok(Self {
            temperature: Some(pick(TracerField::Temperature)?),
            salinity: Some(pick(TracerField::Salinity)?),
        })
    }
}

fn variable_of(field: TracerField) -> SourceVariable {
    match field {
        TracerField::Temperature => SourceVariable::Temperature,
        TracerField::Salinity => SourceVariable::Salinity,
    }
}

/// Builds a [`HotstartField`] by sampling tracer sources over the grid.
///
/// Each source is opened once per tracer and interpolated horizontally
/// onto every node; levels are then filled in chunks of
/// [`hotstart_level_chunk`](CompilerOptions::hotstart_level_chunk) from
/// those profiles.
///
/// # Example
///
/// ```
/// use bctides::{
///     CatalogProvider, CompilerOptions, DataLocation, Dataset, ExternalDataSource, Grid, HotstartGenerator,
///     HotstartSources, SourceVariable, VerticalGrid,
/// };
/// use chrono::{TimeZone, Utc};
///
/// let ocean = Dataset::new("ocean")
///     .with_coordinate("lon", vec![0.0, 1.0])
///     .with_coordinate("lat", vec![0.0, 1.0])
///     .with_variable("temp", &["lat", "lon"], vec![15.0; 4])
///     .unwrap()
///     .with_variable("salt", &["lat", "lon"], vec![35.0; 4])
///     .unwrap();
/// let provider = CatalogProvider::new().with_entry("ocean", ocean);
/// let source = ExternalDataSource::new(DataLocation::catalog("ocean"))
///     .with_variable(SourceVariable::Temperature, "temp")
///     .with_variable(SourceVariable::Salinity, "salt");
///
/// let grid = Grid::new(vec![(0.5, 0.5)], vec![30.0], VerticalGrid::uniform_sigma(4));
/// let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let options = CompilerOptions::default();
/// let (hotstart, warnings) = HotstartGenerator::new(&provider, &options)
///     .generate(&grid, &HotstartSources::shared(source), t0)
///     .unwrap();
/// assert!(warnings.is_empty());
/// assert_eq!(hotstart.temperature.shape(), (1, 4, 1));
/// assert!(hotstart.salinity.values().iter().all(|&s| s == 35.0));
/// ```
pub struct HotstartGenerator<'a> {
    provider: &'a dyn DatasetProvider,
    options: &'a CompilerOptions,
}

impl<'a> HotstartGenerator<'a> {
    /// Generator reading through `provider`.
    pub fn new(provider: &'a dyn DatasetProvider, options: &'a CompilerOptions) -> Self {
        Self { provider, options }
    }

    /// Resolve sources from `explicit` and `segments`, then generate.
    pub fn generate_for(
        &self,
        grid: &dyn BoundaryGrid,
        explicit: Option<&HotstartSources>,
        segments: &[BoundarySegment],
        reference_time: DateTime<Utc>,
    ) -> Result<(HotstartField, Diagnostics)> {
        let sources = HotstartSources::resolve(explicit, segments)?;
        self.generate(grid, &sources, reference_time)
    }

    /// Sample temperature and salinity at `reference_time` on every node
    /// and level of `grid`.
    pub fn generate(
        &self,
        grid: &dyn BoundaryGrid,
        sources: &HotstartSources,
        reference_time: DateTime<Utc>,
    ) -> Result<(HotstartField, Diagnostics)> {
        let temperature_source = sources
            .temperature
            .as_ref()
            .ok_or_else(|| BoundaryError::missing(None, "hotstart.temperature"))?;
        let salinity_source = sources
            .salinity
            .as_ref()
            .ok_or_else(|| BoundaryError::missing(None, "hotstart.salinity"))?;

        let mut diagnostics = Diagnostics::new();
        let temperature = self.sample_field(
            grid,
            temperature_source,
            TracerField::Temperature,
            reference_time,
            &mut diagnostics,
        )?;
        let mut salinity = self.sample_field(
            grid,
            salinity_source,
            TracerField::Salinity,
            reference_time,
            &mut diagnostics,
        )?;

        let bands = self.options.sanity;
        if let Some(warning) = sanity_check(&temperature, TracerField::Temperature, bands.temperature) {
            diagnostics.push(warning);
        }
        let salinity_band = (bands.salinity.0.max(0.0), bands.salinity.1);
        if let Some(warning) = sanity_check(&salinity, TracerField::Salinity, salinity_band) {
            diagnostics.push(warning);
        }
        let clamped = clamp_below(&mut salinity, 0.0);
        if clamped > 0 {
            tracing::debug!(clamped, "clamped negative hotstart salinity to zero");
        }

        tracing::info!(
            nodes = grid.n_nodes(),
            levels = grid.n_levels(),
            warnings = diagnostics.len(),
            "generated hotstart"
        );
        Ok((
            HotstartField::cold_start(reference_time, temperature, salinity),
            diagnostics,
        ))
    }

    fn sample_field(
        &self,
        grid: &dyn BoundaryGrid,
        source: &ExternalDataSource,
        field: TracerField,
        reference_time: DateTime<Utc>,
        diagnostics: &mut Diagnostics,
    ) -> Result<BoundaryArray> {
        let variable = variable_of(field);
        let points = grid.all_points();
        let vertical = grid.vertical();
        let n_levels = vertical.n_levels();
        let level_depths: Vec<Vec<f64>> = points
            .iter()
            .map(|p| vertical.level_depths(p.depth).iter().map(|d| d.meters()).collect())
            .collect();

        let lonlat: Vec<(f64, f64)> = points.iter().map(|p| (p.lon, p.lat)).collect();
        let mut sampled = ExternalSeriesSampler::new(self.provider, self.options)
            .profiles(source, &lonlat, reference_time, variable)
            .map_err(|e| match e {
                BoundaryError::Configuration { segment, field: f, message } => BoundaryError::Configuration {
                    segment,
                    field: format!("hotstart.{field}.{f}"),
                    message,
                },
                other => other,
            })?;
        diagnostics.merge_unique(std::mem::take(&mut sampled.diagnostics));

        let chunk = self.options.hotstart_level_chunk.max(1);
        let mut out = BoundaryArray::zeros(points.len(), n_levels, 1);
        for first in (0..n_levels).step_by(chunk) {
            let last = (first + chunk).min(n_levels);
            for (node, depths) in level_depths.iter().enumerate() {
                for (k, &depth) in depths[first..last].iter().enumerate() {
                    out.set(node, first + k, 0, sampled.at(node, depth));
                }
            }
            tracing::debug!(%field, levels = ?(first..last), "filled hotstart chunk");
        }
        Ok(out)
    }
}

fn sanity_check(array: &BoundaryArray, field: TracerField, band: (f64, f64)) -> Option<CompileWarning> {
    let outside: Vec<f64> = array
        .values()
        .iter()
        .copied()
        .filter(|v| *v < band.0 || *v > band.1)
        .collect();
    if outside.is_empty() {
        return None;
    }
    let (min, max) = array.range()?;
    Some(CompileWarning::SanityRange {
        field,
        count: outside.len(),
        min,
        max,
        band,
    })
}

fn clamp_below(array: &mut BoundaryArray, floor: f64) -> usize {
    let mut count = 0;
    for v in array.values_mut() {
        if *v < floor {
            *v = floor;
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::TracerSpec;
    use crate::dataset::{CatalogProvider, DataLocation, Dataset, DatasetError};
    use crate::error::ErrorKind;
    use crate::mesh::Grid;
    use crate::types::{NodeIndex, SegmentIndex};
    use crate::vertical::VerticalGrid;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
    }

    fn ocean(salt_offset: f64) -> Dataset {
        let lons = vec![0.0, 1.0];
        let lats = vec![0.0, 1.0];
        let depths = vec![0.0, 50.0, 200.0];
        let mut temp = Vec::new();
        let mut salt = Vec::new();
        for _ in 0..2 {
            for &d in &depths {
                for _ in 0..4 {
                    temp.push(25.0 - 0.1 * d);
                    salt.push(34.0 + 0.01 * d + salt_offset);
                }
            }
        }
        Dataset::new("ocean")
            .with_coordinate("lon", lons)
            .with_coordinate("lat", lats)
            .with_coordinate("depth", depths)
            .with_time_coordinate("time", vec![t0(), t0() + Duration::days(1)])
            .with_variable("temp", &["time", "depth", "lat", "lon"], temp)
            .unwrap()
            .with_variable("salt", &["time", "depth", "lat", "lon"], salt)
            .unwrap()
    }

    fn source() -> ExternalDataSource {
        ExternalDataSource::new(DataLocation::catalog("ocean"))
            .with_variable(SourceVariable::Temperature, "temp")
            .with_variable(SourceVariable::Salinity, "salt")
    }

    fn grid() -> Grid {
        Grid::new(
            vec![(0.2, 0.2), (0.5, 0.5), (0.8, 0.9)],
            vec![100.0, 200.0, 10.0],
            VerticalGrid::uniform_sigma(5),
        )
        .with_open_boundary(vec![NodeIndex::new(0), NodeIndex::new(2)])
    }

    #[test]
    fn test_generate_chunked() {
        let provider = CatalogProvider::new().with_entry("ocean", ocean(0.0));
        let options = CompilerOptions::default().with_hotstart_level_chunk(2);
        let (field, diagnostics) = HotstartGenerator::new(&provider, &options)
            .generate(&grid(), &HotstartSources::shared(source()), t0())
            .unwrap();
        assert!(diagnostics.is_empty(), "{}", diagnostics.summary());
        assert_eq!(field.temperature.shape(), (3, 5, 1));
        // Node 1: h = 200, level 0 at the bed, level 4 at the surface.
        assert!((field.temperature.get(1, 0, 0).unwrap() - 5.0).abs() < 1e-9);
        assert!((field.temperature.get(1, 4, 0).unwrap() - 25.0).abs() < 1e-9);
        assert!((field.salinity.get(1, 2, 0).unwrap() - 35.0).abs() < 1e-9);
        assert!(field.u.values().iter().all(|&v| v == 0.0));
    }

    /// Counts every `open` call before delegating.
    struct CountingProvider {
        inner: CatalogProvider,
        opens: AtomicUsize,
    }

    impl DatasetProvider for CountingProvider {
        fn open(&self, location: &DataLocation) -> std::result::Result<Arc<Dataset>, DatasetError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.inner.open(location)
        }
    }

    #[test]
    fn test_source_opened_once_per_field() {
        let provider = CountingProvider {
            inner: CatalogProvider::new().with_entry("ocean", ocean(0.0)),
            opens: AtomicUsize::new(0),
        };
        let options = CompilerOptions::default().with_hotstart_level_chunk(1);
        let (field, _) = HotstartGenerator::new(&provider, &options)
            .generate(&grid(), &HotstartSources::shared(source()), t0())
            .unwrap();
        assert_eq!(field.temperature.shape(), (3, 5, 1));
        assert_eq!(provider.opens.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_negative_salinity_clamped_and_warned() {
        let provider = CatalogProvider::new().with_entry("ocean", ocean(-35.0));
        let options = CompilerOptions::default();
        let (field, diagnostics) = HotstartGenerator::new(&provider, &options)
            .generate(&grid(), &HotstartSources::shared(source()), t0())
            .unwrap();
        assert!(field.salinity.values().iter().all(|&s| s >= 0.0));
        let warning = diagnostics.sanity_warnings().next().unwrap();
        assert!(matches!(
            warning,
            CompileWarning::SanityRange { field: TracerField::Salinity, min, .. } if *min < 0.0
        ));
    }

    #[test]
    fn test_resolve_prefers_explicit_then_scans_segments() {
        let boundary_source = source();
        let explicit_source = ExternalDataSource::new(DataLocation::catalog("explicit"))
            .with_variable(SourceVariable::Temperature, "t");
        let segments = vec![
            BoundarySegment::new(SegmentIndex::new(1)).with_salinity(TracerSpec::external(boundary_source.clone())),
            BoundarySegment::new(SegmentIndex::new(0)).with_temperature(TracerSpec::constant(4.0)),
        ];
        let explicit = HotstartSources {
            temperature: Some(explicit_source.clone()),
            salinity: None,
        };
        let resolved = HotstartSources::resolve(Some(&explicit), &segments).unwrap();
        assert_eq!(resolved.temperature, Some(explicit_source));
        assert_eq!(resolved.salinity, Some(boundary_source));
    }

    #[test]
    fn test_resolve_without_temperature_source() {
        let segments = vec![BoundarySegment::new(SegmentIndex::new(0))
            .with_temperature(TracerSpec::constant(4.0))
            .with_salinity(TracerSpec::external(source()))];
        let err = HotstartSources::resolve(None, &segments).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("hotstart.temperature"));
    }
}
