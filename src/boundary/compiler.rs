//! BoundaryConditionCompiler: all segments → one CompiledBoundary.

use std::collections::BTreeSet;

use super::compiled::{CompiledBoundary, CompiledSegment};
use super::segment::BoundarySegmentCompiler;
use super::setup::BoundaryConfig;
use super::taxonomy::BoundarySegment;
use super::validate::validate_segment;
use crate::config::{CompilerOptions, TimeWindow};
use crate::dataset::DatasetProvider;
use crate::diagnostics::Diagnostics;
use crate::error::{BoundaryError, Result};
use crate::mesh::BoundaryGrid;
use crate::tides::TidalConfiguration;

/// Orchestrates segment compilation across the domain.
///
/// Every segment is validated, in index order, before any source is
/// opened; the first invalid one aborts the run. Segments are then
/// compiled independently (concurrently with the `parallel` feature) and
/// merged in index order, so output never depends on scheduling.
///
/// # Example
///
/// ```
/// use bctides::boundary::{BoundaryConditionCompiler, BoundarySegment, ElevationSpec};
/// use bctides::config::{CompilerOptions, TimeWindow};
/// use bctides::dataset::CatalogProvider;
/// use bctides::mesh::Grid;
/// use bctides::types::{NodeIndex, SegmentIndex};
/// use bctides::vertical::VerticalGrid;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let grid = Grid::new(vec![(5.0, 60.0), (5.1, 60.0)], vec![30.0, 40.0], VerticalGrid::uniform_sigma(4))
///     .with_open_boundary(vec![NodeIndex::new(0), NodeIndex::new(1)]);
/// let segments = vec![BoundarySegment::new(SegmentIndex::new(0)).with_elevation(ElevationSpec::constant(0.2))];
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let window = TimeWindow::new(start, start + Duration::days(1), Duration::hours(1));
///
/// let provider = CatalogProvider::new();
/// let options = CompilerOptions::default();
/// let (compiled, warnings) = BoundaryConditionCompiler::new(&provider, &options)
///     .compile_all(&grid, &segments, None, &window)
///     .unwrap();
/// assert_eq!(compiled.n_segments(), 1);
/// assert!(warnings.is_empty());
/// ```
pub struct BoundaryConditionCompiler<'a> {
    provider: &'a dyn DatasetProvider,
    options: &'a CompilerOptions,
}

impl<'a> BoundaryConditionCompiler<'a> {
    /// Compiler reading sources through `provider`.
    pub fn new(provider: &'a dyn DatasetProvider, options: &'a CompilerOptions) -> Self {
        Self { provider, options }
    }

    /// Compile the segments a [`BoundaryConfig`] describes for `grid`.
    pub fn compile_config(
        &self,
        grid: &dyn BoundaryGrid,
        config: &BoundaryConfig,
        window: &TimeWindow,
    ) -> Result<(CompiledBoundary, Diagnostics)> {
        let segments = config.segments(grid.n_open_boundaries())?;
        self.compile_all(grid, &segments, config.tides.as_ref(), window)
    }

    /// Compile every segment over `window`.
    pub fn compile_all(
        &self,
        grid: &dyn BoundaryGrid,
        segments: &[BoundarySegment],
        tides: Option<&TidalConfiguration>,
        window: &TimeWindow,
    ) -> Result<(CompiledBoundary, Diagnostics)> {
        window.validate()?;
        let mut ordered: Vec<&BoundarySegment> = segments.iter().collect();
        ordered.sort_by_key(|s| s.index);
        self.validate_all(grid, &ordered, tides)?;

        let compiled = self.compile_ordered(grid, &ordered, tides, window)?;

        let mut diagnostics = Diagnostics::new();
        let mut out = Vec::with_capacity(compiled.len());
        for (segment, warnings) in compiled {
            diagnostics.extend(warnings);
            out.push(segment);
        }
        let boundary = CompiledBoundary {
            window: window.clone(),
            n_levels: grid.n_levels(),
            segments: out,
        };
        tracing::info!(
            segments = boundary.n_segments(),
            steps = window.n_steps(),
            warnings = diagnostics.len(),
            "compiled boundary conditions"
        );
        Ok((boundary, diagnostics))
    }

    fn validate_all(
        &self,
        grid: &dyn BoundaryGrid,
        ordered: &[&BoundarySegment],
        tides: Option<&TidalConfiguration>,
    ) -> Result<()> {
        let mut seen = BTreeSet::new();
        for segment in ordered {
            if !seen.insert(segment.index) {
                return Err(BoundaryError::configuration(
                    Some(segment.index),
                    "index",
                    "segment is configured more than once",
                ));
            }
            let nodes = grid.open_boundary(segment.index).ok_or_else(|| {
                BoundaryError::configuration(
                    Some(segment.index),
                    "index",
                    format!("grid has {} open boundaries", grid.n_open_boundaries()),
                )
            })?;
            validate_segment(segment, tides, nodes.len())?;
        }
        Ok(())
    }

    #[cfg(not(feature = "parallel"))]
    fn compile_ordered(
        &self,
        grid: &dyn BoundaryGrid,
        ordered: &[&BoundarySegment],
        tides: Option<&TidalConfiguration>,
        window: &TimeWindow,
    ) -> Result<Vec<(CompiledSegment, Diagnostics)>> {
        let compiler = BoundarySegmentCompiler::new(self.provider, self.options);
        ordered
            .iter()
            .map(|segment| compiler.compile(segment, grid, tides, window))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn compile_ordered(
        &self,
        grid: &dyn BoundaryGrid,
        ordered: &[&BoundarySegment],
        tides: Option<&TidalConfiguration>,
        window: &TimeWindow,
    ) -> Result<Vec<(CompiledSegment, Diagnostics)>> {
        use rayon::prelude::*;

        let compiler = BoundarySegmentCompiler::new(self.provider, self.options);
        let results: Vec<Result<(CompiledSegment, Diagnostics)>> = ordered
            .par_iter()
            .map(|segment| compiler.compile(segment, grid, tides, window))
            .collect();
        // Report the lowest failing segment, as the sequential path would.
        results.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{ElevationSpec, VelocitySpec};
    use crate::dataset::CatalogProvider;
    use crate::error::ErrorKind;
    use crate::mesh::Grid;
    use crate::types::{NodeIndex, SegmentIndex};
    use crate::vertical::VerticalGrid;
    use chrono::{Duration, TimeZone, Utc};

    fn grid() -> Grid {
        Grid::new(
            vec![(0.0, 0.0), (0.1, 0.0), (0.2, 0.0), (0.3, 0.0)],
            vec![10.0; 4],
            VerticalGrid::uniform_sigma(2),
        )
        .with_open_boundary(vec![NodeIndex::new(0), NodeIndex::new(1)])
        .with_open_boundary(vec![NodeIndex::new(2), NodeIndex::new(3)])
    }

    fn window() -> TimeWindow {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        TimeWindow::new(start, start + Duration::hours(3), Duration::hours(1))
    }

    #[test]
    fn test_output_in_segment_order() {
        let provider = CatalogProvider::new();
        let options = CompilerOptions::default();
        let segments = vec![
            BoundarySegment::new(SegmentIndex::new(1)).with_elevation(ElevationSpec::constant(1.0)),
            BoundarySegment::new(SegmentIndex::new(0)).with_velocity(VelocitySpec::constant(-10.0)),
        ];
        let (compiled, _) = BoundaryConditionCompiler::new(&provider, &options)
            .compile_all(&grid(), &segments, None, &window())
            .unwrap();
        let order: Vec<usize> = compiled.segments.iter().map(|s| s.index.get()).collect();
        assert_eq!(order, vec![0, 1]);
        assert_eq!(compiled.n_levels, 2);
    }

    #[test]
    fn test_validation_fails_before_sampling() {
        // Segment 0 references a source the provider cannot open; segment 1
        // is invalid. Validation must report segment 1 without touching data.
        let provider = CatalogProvider::new();
        let options = CompilerOptions::default();
        let source = crate::sampling::ExternalDataSource::new(crate::dataset::DataLocation::catalog("missing"))
            .with_variable(crate::sampling::SourceVariable::Elevation, "ssh");
        let segments = vec![
            BoundarySegment::new(SegmentIndex::new(0)).with_elevation(ElevationSpec::external(source)),
            BoundarySegment::new(SegmentIndex::new(1)).with_elevation(ElevationSpec::Constant { value: None }),
        ];
        let err = BoundaryConditionCompiler::new(&provider, &options)
            .compile_all(&grid(), &segments, None, &window())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.segment(), Some(SegmentIndex::new(1)));
    }

    #[test]
    fn test_data_errors_carry_segment() {
        let provider = CatalogProvider::new();
        let options = CompilerOptions::default();
        let source = crate::sampling::ExternalDataSource::new(crate::dataset::DataLocation::catalog("missing"))
            .with_variable(crate::sampling::SourceVariable::Elevation, "ssh");
        let segments = vec![BoundarySegment::new(SegmentIndex::new(1)).with_elevation(ElevationSpec::external(source))];
        let err = BoundaryConditionCompiler::new(&provider, &options)
            .compile_all(&grid(), &segments, None, &window())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dataset);
        assert_eq!(err.segment(), Some(SegmentIndex::new(1)));
    }

    #[test]
    fn test_duplicate_and_unknown_segments() {
        let provider = CatalogProvider::new();
        let options = CompilerOptions::default();
        let compiler = BoundaryConditionCompiler::new(&provider, &options);
        let dup = vec![
            BoundarySegment::new(SegmentIndex::new(0)),
            BoundarySegment::new(SegmentIndex::new(0)),
        ];
        assert!(compiler.compile_all(&grid(), &dup, None, &window()).is_err());
        let unknown = vec![BoundarySegment::new(SegmentIndex::new(9))];
        let err = compiler.compile_all(&grid(), &unknown, None, &window()).unwrap_err();
        assert_eq!(err.segment(), Some(SegmentIndex::new(9)));
    }

    #[test]
    fn test_compile_config() {
        let provider = CatalogProvider::new();
        let options = CompilerOptions::default();
        let config = BoundaryConfig::from_yaml_str(
            "setup: river\ndefaults:\n  discharge: -200.0\n  temperature: 6.0\n  salinity: 0.0\n",
        )
        .unwrap();
        let (compiled, _) = BoundaryConditionCompiler::new(&provider, &options)
            .compile_config(&grid(), &config, &window())
            .unwrap();
        assert_eq!(compiled.n_segments(), 2);
        assert!(compiled.legacy_flags().iter().all(|f| f.velocity == 2 && f.salinity == 2));
    }
}
