//! Tagged boundary variants per physical quantity.
//!
//! Every variant carries exactly the inputs it needs. Inputs are optional
//! at the type level so an incomplete configuration still deserializes and
//! is rejected by validation with the offending segment and field named,
//! instead of being silently defaulted.
//!
//! | Quantity | Variants |
//! |----------|----------|
//! | elevation | `none`, `time_series_file`, `constant`, `harmonic`, `external`, `harmonic_plus_external` |
//! | velocity | the elevation set plus `radiation` (Flather) and `relaxed` |
//! | temperature / salinity | `none`, `time_series_file`, `constant`, `initial_profile`, `external` |
//!
//! # Example
//!
//! ```
//! use bctides::boundary::{BoundarySegment, ElevationSpec, VelocitySpec};
//! use bctides::types::SegmentIndex;
//!
//! let yaml = r#"
//! elevation: { kind: constant, value: 0.3 }
//! velocity: { kind: relaxed, inflow_relax: 0.5 }
//! "#;
//! let segment: BoundarySegment = serde_yaml::from_str(yaml).unwrap();
//! assert_eq!(segment.elevation, ElevationSpec::constant(0.3));
//! assert!(matches!(segment.velocity, VelocitySpec::Relaxed { outflow_relax: None, .. }));
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sampling::ExternalDataSource;
use crate::tides::TidalConfiguration;
use crate::types::SegmentIndex;

/// Column of a uniform `*.th` time series file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRef {
    /// File path.
    pub path: PathBuf,
    /// Zero-based value column (the time column is not counted).
    #[serde(default)]
    pub column: usize,
}

impl TimeSeriesRef {
    /// First value column of `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            column: 0,
        }
    }

    /// Builder: value column.
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = column;
        self
    }
}

/// Surface elevation boundary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ElevationSpec {
    /// Not forced.
    #[default]
    None,
    /// Spatially uniform series from a file.
    TimeSeriesFile {
        #[serde(default)]
        series: Option<TimeSeriesRef>,
    },
    /// Spatially and temporally uniform value (m).
    Constant {
        #[serde(default)]
        value: Option<f64>,
    },
    /// Tidal synthesis from the tidal configuration.
    Harmonic,
    /// Interpolated from an external source.
    External {
        #[serde(default)]
        source: Option<ExternalDataSource>,
    },
    /// Tidal synthesis plus an external residual.
    HarmonicPlusExternal {
        #[serde(default)]
        source: Option<ExternalDataSource>,
    },
}

impl ElevationSpec {
    /// Constant elevation.
    pub fn constant(value: f64) -> Self {
        Self::Constant { value: Some(value) }
    }

    /// Elevation from a time series file.
    pub fn time_series(series: TimeSeriesRef) -> Self {
        Self::TimeSeriesFile {
            series: Some(series),
        }
    }

    /// Elevation from an external source.
    pub fn external(source: ExternalDataSource) -> Self {
        Self::External {
            source: Some(source),
        }
    }

    /// Tide plus external residual.
    pub fn harmonic_plus_external(source: ExternalDataSource) -> Self {
        Self::HarmonicPlusExternal {
            source: Some(source),
        }
    }

    /// Whether tidal constants are needed.
    pub fn needs_tides(&self) -> bool {
        matches!(self, Self::Harmonic | Self::HarmonicPlusExternal { .. })
    }

    /// External source, if the variant uses one.
    pub fn source(&self) -> Option<&ExternalDataSource> {
        match self {
            Self::External { source } | Self::HarmonicPlusExternal { source } => source.as_ref(),
            _ => None,
        }
    }

    /// Variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::TimeSeriesFile { .. } => "time_series_file",
            Self::Constant { .. } => "constant",
            Self::Harmonic => "harmonic",
            Self::External { .. } => "external",
            Self::HarmonicPlusExternal { .. } => "harmonic_plus_external",
        }
    }
}

/// Velocity (normal flow) boundary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum VelocitySpec {
    /// Not forced.
    #[default]
    None,
    /// Segment discharge series from a file (m³/s, negative is inflow).
    TimeSeriesFile {
        #[serde(default)]
        series: Option<TimeSeriesRef>,
    },
    /// Constant segment discharge (m³/s, negative is inflow).
    Constant {
        #[serde(default)]
        discharge: Option<f64>,
    },
    /// Tidal currents from the tidal configuration.
    Harmonic,
    /// Currents from an external source.
    External {
        #[serde(default)]
        source: Option<ExternalDataSource>,
    },
    /// Tidal currents plus external residual currents.
    HarmonicPlusExternal {
        #[serde(default)]
        source: Option<ExternalDataSource>,
    },
    /// Flather radiation against reference means, one value per boundary node.
    Radiation {
        #[serde(default)]
        mean_elevation: Option<Vec<f64>>,
        #[serde(default)]
        mean_velocity: Option<Vec<f64>>,
    },
    /// External (optionally plus tidal) currents with relaxation weights.
    Relaxed {
        #[serde(default)]
        source: Option<ExternalDataSource>,
        #[serde(default)]
        inflow_relax: Option<f64>,
        #[serde(default)]
        outflow_relax: Option<f64>,
        /// Add tidal currents to the external series.
        #[serde(default)]
        tidal: bool,
    },
}

impl VelocitySpec {
    /// Constant discharge.
    pub fn constant(discharge: f64) -> Self {
        Self::Constant {
            discharge: Some(discharge),
        }
    }

    /// Discharge from a time series file.
    pub fn time_series(series: TimeSeriesRef) -> Self {
        Self::TimeSeriesFile {
            series: Some(series),
        }
    }

    /// Currents from an external source.
    pub fn external(source: ExternalDataSource) -> Self {
        Self::External {
            source: Some(source),
        }
    }

    /// Tidal plus external currents.
    pub fn harmonic_plus_external(source: ExternalDataSource) -> Self {
        Self::HarmonicPlusExternal {
            source: Some(source),
        }
    }

    /// Flather radiation.
    pub fn radiation(mean_elevation: Vec<f64>, mean_velocity: Vec<f64>) -> Self {
        Self::Radiation {
            mean_elevation: Some(mean_elevation),
            mean_velocity: Some(mean_velocity),
        }
    }

    /// Relaxed external currents.
    pub fn relaxed(source: ExternalDataSource, inflow_relax: f64, outflow_relax: f64) -> Self {
        Self::Relaxed {
            source: Some(source),
            inflow_relax: Some(inflow_relax),
            outflow_relax: Some(outflow_relax),
            tidal: false,
        }
    }

    /// Relaxed tidal plus external currents.
    pub fn relaxed_tidal(source: ExternalDataSource, inflow_relax: f64, outflow_relax: f64) -> Self {
        Self::Relaxed {
            source: Some(source),
            inflow_relax: Some(inflow_relax),
            outflow_relax: Some(outflow_relax),
            tidal: true,
        }
    }

    /// Whether tidal constants are needed.
    pub fn needs_tides(&self) -> bool {
        matches!(
            self,
            Self::Harmonic | Self::HarmonicPlusExternal { .. } | Self::Relaxed { tidal: true, .. }
        )
    }

    /// External source, if the variant uses one.
    pub fn source(&self) -> Option<&ExternalDataSource> {
        match self {
            Self::External { source }
            | Self::HarmonicPlusExternal { source }
            | Self::Relaxed { source, .. } => source.as_ref(),
            _ => None,
        }
    }

    /// Variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::TimeSeriesFile { .. } => "time_series_file",
            Self::Constant { .. } => "constant",
            Self::Harmonic => "harmonic",
            Self::External { .. } => "external",
            Self::HarmonicPlusExternal { .. } => "harmonic_plus_external",
            Self::Radiation { .. } => "radiation",
            Self::Relaxed { .. } => "relaxed",
        }
    }
}

/// Nudging factor used when a tracer spec does not give one.
pub const DEFAULT_NUDGE: f64 = 1.0;

fn default_nudge() -> f64 {
    DEFAULT_NUDGE
}

/// Temperature or salinity boundary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TracerSpec {
    /// Not forced.
    #[default]
    None,
    /// Spatially uniform series from a file.
    TimeSeriesFile {
        #[serde(default)]
        series: Option<TimeSeriesRef>,
        #[serde(default = "default_nudge")]
        nudge: f64,
    },
    /// Uniform value.
    Constant {
        #[serde(default)]
        value: Option<f64>,
        #[serde(default = "default_nudge")]
        nudge: f64,
    },
    /// Relax towards the initial profile held by the solver.
    InitialProfile {
        #[serde(default = "default_nudge")]
        nudge: f64,
    },
    /// Interpolated from an external source.
    External {
        #[serde(default)]
        source: Option<ExternalDataSource>,
        #[serde(default = "default_nudge")]
        nudge: f64,
    },
}

impl TracerSpec {
    /// Constant tracer with full nudging.
    pub fn constant(value: f64) -> Self {
        Self::Constant {
            value: Some(value),
            nudge: DEFAULT_NUDGE,
        }
    }

    /// Tracer from a time series file.
    pub fn time_series(series: TimeSeriesRef) -> Self {
        Self::TimeSeriesFile {
            series: Some(series),
            nudge: DEFAULT_NUDGE,
        }
    }

    /// Initial-profile relaxation.
    pub fn initial_profile() -> Self {
        Self::InitialProfile {
            nudge: DEFAULT_NUDGE,
        }
    }

    /// Tracer from an external source.
    pub fn external(source: ExternalDataSource) -> Self {
        Self::External {
            source: Some(source),
            nudge: DEFAULT_NUDGE,
        }
    }

    /// Builder: nudging factor (no-op on `None`).
    pub fn with_nudge(mut self, factor: f64) -> Self {
        if let Some(nudge) = self.nudge_mut() {
            *nudge = factor;
        }
        self
    }

    fn nudge_mut(&mut self) -> Option<&mut f64> {
        match self {
            Self::None => None,
            Self::TimeSeriesFile { nudge, .. }
            | Self::Constant { nudge, .. }
            | Self::InitialProfile { nudge }
            | Self::External { nudge, .. } => Some(nudge),
        }
    }

    /// Nudging factor, `None` for unforced tracers.
    pub fn nudge(&self) -> Option<f64> {
        match self {
            Self::None => None,
            Self::TimeSeriesFile { nudge, .. }
            | Self::Constant { nudge, .. }
            | Self::InitialProfile { nudge }
            | Self::External { nudge, .. } => Some(*nudge),
        }
    }

    /// External source, if the variant uses one.
    pub fn source(&self) -> Option<&ExternalDataSource> {
        match self {
            Self::External { source, .. } => source.as_ref(),
            _ => None,
        }
    }

    /// Variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::TimeSeriesFile { .. } => "time_series_file",
            Self::Constant { .. } => "constant",
            Self::InitialProfile { .. } => "initial_profile",
            Self::External { .. } => "external",
        }
    }
}

/// Forcing of one open boundary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundarySegment {
    /// Open-boundary index on the grid.
    pub index: SegmentIndex,
    /// Surface elevation.
    pub elevation: ElevationSpec,
    /// Velocity.
    pub velocity: VelocitySpec,
    /// Temperature.
    pub temperature: TracerSpec,
    /// Salinity.
    pub salinity: TracerSpec,
    /// Segment-level tides, overriding the global configuration.
    pub tides: Option<TidalConfiguration>,
}

impl BoundarySegment {
    /// Unforced segment.
    pub fn new(index: SegmentIndex) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Builder: elevation.
    pub fn with_elevation(mut self, spec: ElevationSpec) -> Self {
        self.elevation = spec;
        self
    }

    /// Builder: velocity.
    pub fn with_velocity(mut self, spec: VelocitySpec) -> Self {
        self.velocity = spec;
        self
    }

    /// Builder: temperature.
    pub fn with_temperature(mut self, spec: TracerSpec) -> Self {
        self.temperature = spec;
        self
    }

    /// Builder: salinity.
    pub fn with_salinity(mut self, spec: TracerSpec) -> Self {
        self.salinity = spec;
        self
    }

    /// Builder: segment-level tides.
    pub fn with_tides(mut self, tides: TidalConfiguration) -> Self {
        self.tides = Some(tides);
        self
    }

    /// Tidal configuration in effect: segment level first, then `global`.
    pub fn effective_tides<'a>(
        &'a self,
        global: Option<&'a TidalConfiguration>,
    ) -> Option<&'a TidalConfiguration> {
        self.tides.as_ref().or(global)
    }

    /// Whether any quantity needs tidal constants.
    pub fn needs_tides(&self) -> bool {
        self.elevation.needs_tides() || self.velocity.needs_tides()
    }
}

impl fmt::Display for BoundarySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: elevation={} velocity={} temperature={} salinity={}",
            self.index,
            self.elevation.kind(),
            self.velocity.kind(),
            self.temperature.kind(),
            self.salinity.kind()
        )
    }
}
