//! # bctides
//!
//! Compiles declarative open-boundary and initial-condition requests for
//! unstructured-grid ocean models into concrete forcing arrays.
//!
//! Given a grid with open boundaries, a per-segment forcing description and
//! a time window, the crate produces:
//! - tidal elevation and current series synthesised from harmonic atlases,
//!   with nodal corrections for the run's start date
//! - series sampled from external gridded datasets (reanalyses, parent
//!   models) in space, depth and time
//! - constant, file-driven, radiation and relaxed velocity forcing
//! - temperature and salinity boundary forcing with nudging factors
//! - a 3-D hotstart state interpolated from the same tracer sources
//!
//! Boundary behaviour can be stated as typed variants, through the
//! solver's integer flag quadruple, or through one of four setup
//! shorthands; all three routes produce the same [`BoundarySegment`]s.
//!
//! ```
//! use bctides::{
//!     BoundaryConditionCompiler, BoundarySegment, CatalogProvider, CompilerOptions, ElevationSpec,
//!     Grid, NodeIndex, SegmentIndex, TimeWindow, VerticalGrid,
//! };
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let grid = Grid::new(vec![(-5.0, 48.0), (-5.1, 48.0)], vec![50.0, 60.0], VerticalGrid::uniform_sigma(3))
//!     .with_open_boundary(vec![NodeIndex::new(0), NodeIndex::new(1)]);
//! let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
//! let window = TimeWindow::new(start, start + Duration::hours(6), Duration::hours(1));
//! let segments = [BoundarySegment::new(SegmentIndex::new(0)).with_elevation(ElevationSpec::constant(2.5))];
//!
//! let provider = CatalogProvider::new();
//! let options = CompilerOptions::default();
//! let (compiled, _) = BoundaryConditionCompiler::new(&provider, &options)
//!     .compile_all(&grid, &segments, None, &window)
//!     .unwrap();
//! let elevation = compiled.segments[0].elevation.as_ref().unwrap();
//! assert!(elevation.values.values().iter().all(|&v| v == 2.5));
//! ```

pub mod boundary;
pub mod config;
pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod geo;
pub mod hotstart;
pub mod io;
pub mod mesh;
pub mod sampling;
pub mod tides;
pub mod types;
pub mod vertical;

// Core types
pub use config::{CompilerOptions, SanityBands, TimeWindow};
pub use diagnostics::{CompileWarning, CoverageDetail, Diagnostics, TracerField};
pub use error::{BoundaryError, ErrorKind, Result};
pub use types::{BoundaryArray, Depth, NodeIndex, SegmentIndex, Sigma};

// Geometry
pub use geo::{CoordinateSystem, LocalProjection};
pub use mesh::{BoundaryGrid, Grid, NodePoint};
pub use vertical::{Stretching, VerticalGrid};

// Data access
#[cfg(feature = "netcdf")]
pub use dataset::NetcdfProvider;
pub use dataset::{CatalogProvider, DataLocation, Dataset, DatasetError, DatasetProvider};
pub use io::{read_constituent_file, read_timeseries_file, ConstituentTable, UniformTimeSeries};
pub use sampling::{ExternalDataSource, ExternalSeriesSampler, HorizontalMethod, SourceVariable, VerticalMethod};

// Tides
pub use tides::{
    nodal_corrections, synthesize, AtlasReference, Constituent, NodalCorrection, NodalPolicy,
    TidalConfiguration, TidalConstituentResolver,
};

// Boundary compilation
pub use boundary::{
    BoundaryConditionCompiler, BoundaryConfig, BoundarySegment, BoundarySegmentCompiler, CompiledBoundary,
    CompiledSegment, CompiledTracer, CompiledVelocity, ElevationSpec, LegacyAuxiliary, LegacyFlags, SetupType,
    TracerSpec, VelocitySpec,
};

// Initial conditions
pub use hotstart::{HotstartField, HotstartGenerator, HotstartSources};
