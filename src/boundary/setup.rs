//! Setup shorthand and the typed boundary configuration.
//!
//! A setup type pre-populates every segment with a matching variant
//! combination. [`expand`] is a pure function; per-segment overrides are
//! merged afterwards and always win.
//!
//! | Setup | Elevation | Velocity | Temperature / salinity |
//! |-------|-----------|----------|------------------------|
//! | `tidal` | harmonic | harmonic | none |
//! | `hybrid` | harmonic + external | harmonic + external | external |
//! | `river` | none | constant discharge | constant |
//! | `nested` | external | relaxed external | external |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::legacy::{LegacyAuxiliary, LegacyFlags};
use super::taxonomy::{BoundarySegment, ElevationSpec, TracerSpec, VelocitySpec, DEFAULT_NUDGE};
use crate::error::{BoundaryError, Result};
use crate::hotstart::HotstartSources;
use crate::sampling::ExternalDataSource;
use crate::tides::TidalConfiguration;
use crate::types::SegmentIndex;

/// Named variant combination applied to every segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupType {
    /// Pure tidal forcing.
    Tidal,
    /// Tides plus external residuals and tracers.
    Hybrid,
    /// River inflow.
    River,
    /// Nested in a parent model.
    Nested,
}

impl SetupType {
    /// All setup types.
    pub const ALL: [SetupType; 4] = [Self::Tidal, Self::Hybrid, Self::River, Self::Nested];

    /// Configuration name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Tidal => "tidal",
            Self::Hybrid => "hybrid",
            Self::River => "river",
            Self::Nested => "nested",
        }
    }
}

impl fmt::Display for SetupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SetupType {
    type Err = BoundaryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                BoundaryError::configuration(
                    None,
                    "setup",
                    format!("unknown setup type `{s}`, expected one of tidal, hybrid, river, nested"),
                )
            })
    }
}

/// Shared inputs the setup shorthand fills into every segment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupDefaults {
    /// External source for `hybrid` and `nested`.
    pub source: Option<ExternalDataSource>,
    /// Inflow relaxation for `nested`.
    pub inflow_relax: Option<f64>,
    /// Outflow relaxation for `nested`.
    pub outflow_relax: Option<f64>,
    /// Discharge for `river` (m³/s, negative is inflow).
    pub discharge: Option<f64>,
    /// River temperature.
    pub temperature: Option<f64>,
    /// River salinity.
    pub salinity: Option<f64>,
    /// Tracer nudging factor.
    pub nudge: Option<f64>,
}

/// Default specs of one segment under `setup`.
///
/// # Example
///
/// ```
/// use bctides::boundary::{expand, ElevationSpec, SetupDefaults, SetupType, TracerSpec};
/// use bctides::types::SegmentIndex;
///
/// let segment = expand(SetupType::Tidal, &SetupDefaults::default(), SegmentIndex::new(0));
/// assert_eq!(segment.elevation, ElevationSpec::Harmonic);
/// assert_eq!(segment.temperature, TracerSpec::None);
/// ```
pub fn expand(setup: SetupType, defaults: &SetupDefaults, index: SegmentIndex) -> BoundarySegment {
    let nudge = defaults.nudge.unwrap_or(DEFAULT_NUDGE);
    let external_tracer = || TracerSpec::External {
        source: defaults.source.clone(),
        nudge,
    };
    let (elevation, velocity, temperature, salinity) = match setup {
        SetupType::Tidal => (
            ElevationSpec::Harmonic,
            VelocitySpec::Harmonic,
            TracerSpec::None,
            TracerSpec::None,
        ),
        SetupType::Hybrid => (
            ElevationSpec::HarmonicPlusExternal {
                source: defaults.source.clone(),
            },
            VelocitySpec::HarmonicPlusExternal {
                source: defaults.source.clone(),
            },
            external_tracer(),
            external_tracer(),
        ),
        SetupType::River => (
            ElevationSpec::None,
            VelocitySpec::Constant {
                discharge: defaults.discharge,
            },
            TracerSpec::Constant {
                value: defaults.temperature,
                nudge,
            },
            TracerSpec::Constant {
                value: defaults.salinity,
                nudge,
            },
        ),
        SetupType::Nested => (
            ElevationSpec::External {
                source: defaults.source.clone(),
            },
            VelocitySpec::Relaxed {
                source: defaults.source.clone(),
                inflow_relax: defaults.inflow_relax,
                outflow_relax: defaults.outflow_relax,
                tidal: false,
            },
            external_tracer(),
            external_tracer(),
        ),
    };
    BoundarySegment {
        index,
        elevation,
        velocity,
        temperature,
        salinity,
        tides: None,
    }
}

/// Per-segment replacement of whole quantity specs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentOverride {
    /// Segment the override applies to.
    pub index: SegmentIndex,
    /// Replacement elevation spec.
    pub elevation: Option<ElevationSpec>,
    /// Replacement velocity spec.
    pub velocity: Option<VelocitySpec>,
    /// Replacement temperature spec.
    pub temperature: Option<TracerSpec>,
    /// Replacement salinity spec.
    pub salinity: Option<TracerSpec>,
    /// Segment-level tides.
    pub tides: Option<TidalConfiguration>,
}

impl SegmentOverride {
    /// Empty override.
    pub fn new(index: SegmentIndex) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Builder: elevation.
    pub fn with_elevation(mut self, spec: ElevationSpec) -> Self {
        self.elevation = Some(spec);
        self
    }

    /// Builder: velocity.
    pub fn with_velocity(mut self, spec: VelocitySpec) -> Self {
        self.velocity = Some(spec);
        self
    }

    /// Builder: temperature.
    pub fn with_temperature(mut self, spec: TracerSpec) -> Self {
        self.temperature = Some(spec);
        self
    }

    /// Builder: salinity.
    pub fn with_salinity(mut self, spec: TracerSpec) -> Self {
        self.salinity = Some(spec);
        self
    }

    /// Apply to a segment.
    pub fn apply(&self, segment: &mut BoundarySegment) {
        if let Some(spec) = &self.elevation {
            segment.elevation = spec.clone();
        }
        if let Some(spec) = &self.velocity {
            segment.velocity = spec.clone();
        }
        if let Some(spec) = &self.temperature {
            segment.temperature = spec.clone();
        }
        if let Some(spec) = &self.salinity {
            segment.salinity = spec.clone();
        }
        if let Some(tides) = &self.tides {
            segment.tides = Some(tides.clone());
        }
    }
}

/// A segment given in the flag encoding.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacySegment {
    /// Segment the flags apply to.
    pub index: SegmentIndex,
    /// `iettype ifltype itetype isatype`
    pub flags: LegacyFlags,
    /// Values the flags refer to.
    pub auxiliary: LegacyAuxiliary,
}

/// Typed boundary configuration, as handed over by a configuration loader.
///
/// Segments are built in three layers: the setup shorthand, then any
/// flag-encoded segments (replacing the whole segment), then per-segment
/// overrides (replacing single quantities).
///
/// ```
/// use bctides::boundary::{BoundaryConfig, ElevationSpec, VelocitySpec};
///
/// let yaml = r#"
/// setup: tidal
/// segments:
///   - index: 1
///     elevation: { kind: constant, value: 0.0 }
/// "#;
/// let config: BoundaryConfig = serde_yaml::from_str(yaml).unwrap();
/// let segments = config.segments(2).unwrap();
/// assert_eq!(segments[0].elevation, ElevationSpec::Harmonic);
/// assert_eq!(segments[1].elevation, ElevationSpec::constant(0.0));
/// assert_eq!(segments[1].velocity, VelocitySpec::Harmonic);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Shorthand applied to every segment.
    pub setup: Option<SetupType>,
    /// Shared inputs for the shorthand.
    pub defaults: SetupDefaults,
    /// Global tidal configuration.
    pub tides: Option<TidalConfiguration>,
    /// Flag-encoded segments.
    pub legacy: Vec<LegacySegment>,
    /// Per-segment overrides.
    pub segments: Vec<SegmentOverride>,
    /// Explicit hotstart sources.
    pub hotstart: Option<HotstartSources>,
}

impl BoundaryConfig {
    /// Configuration from a YAML document.
    pub fn from_yaml_str(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Builder: setup shorthand.
    pub fn with_setup(mut self, setup: SetupType, defaults: SetupDefaults) -> Self {
        self.setup = Some(setup);
        self.defaults = defaults;
        self
    }

    /// Builder: global tides.
    pub fn with_tides(mut self, tides: TidalConfiguration) -> Self {
        self.tides = Some(tides);
        self
    }

    /// Builder: add an override.
    pub fn with_override(mut self, segment: SegmentOverride) -> Self {
        self.segments.push(segment);
        self
    }

    /// Builder: add a flag-encoded segment.
    pub fn with_legacy(mut self, index: SegmentIndex, flags: LegacyFlags, auxiliary: LegacyAuxiliary) -> Self {
        self.legacy.push(LegacySegment {
            index,
            flags,
            auxiliary,
        });
        self
    }

    /// Builder: explicit hotstart sources.
    pub fn with_hotstart(mut self, sources: HotstartSources) -> Self {
        self.hotstart = Some(sources);
        self
    }

    /// Concrete specs for a grid with `n_segments` open boundaries.
    pub fn segments(&self, n_segments: usize) -> Result<Vec<BoundarySegment>> {
        let mut segments: Vec<BoundarySegment> = (0..n_segments)
            .map(|i| {
                let index = SegmentIndex::new(i);
                match self.setup {
                    Some(setup) => expand(setup, &self.defaults, index),
                    None => BoundarySegment::new(index),
                }
            })
            .collect();

        let out_of_range = |index: SegmentIndex, field: &str| {
            BoundaryError::configuration(
                Some(index),
                field,
                format!("grid has only {n_segments} open boundaries"),
            )
        };
        for legacy in &self.legacy {
            let slot = segments
                .get_mut(legacy.index.get())
                .ok_or_else(|| out_of_range(legacy.index, "legacy"))?;
            *slot = legacy.flags.to_segment(legacy.index, &legacy.auxiliary)?;
        }
        for segment_override in &self.segments {
            let slot = segments
                .get_mut(segment_override.index.get())
                .ok_or_else(|| out_of_range(segment_override.index, "segments"))?;
            segment_override.apply(slot);
        }
        Ok(segments)
    }
}
