//! Compatibility adapter for the four-integer flag encoding.
//!
//! Older configurations select boundary behaviour with one small integer
//! per quantity (`iettype ifltype itetype isatype`) and put the numbers the
//! flags refer to in separate places. [`LegacyFlags`] plus
//! [`LegacyAuxiliary`] map onto the tagged specs and back:
//!
//! | Flag | Elevation | Velocity | Tracer |
//! |------|-----------|----------|--------|
//! | 0 | none | none | none |
//! | 1 | time series file | discharge time series file | time series file |
//! | 2 | constant | constant discharge | constant |
//! | 3 | harmonic | harmonic | initial profile |
//! | 4 | external | external | external |
//! | 5 | harmonic + external | harmonic + external | |
//! | -1 | | radiation (Flather) | |
//! | -4 | | relaxed external | |
//! | -5 | | relaxed harmonic + external | |
//!
//! Any other integer is a configuration error.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::taxonomy::{BoundarySegment, ElevationSpec, TimeSeriesRef, TracerSpec, VelocitySpec, DEFAULT_NUDGE};
use crate::error::{BoundaryError, Result};
use crate::sampling::ExternalDataSource;
use crate::types::SegmentIndex;

/// One segment's flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegacyFlags {
    /// `iettype`
    pub elevation: i32,
    /// `ifltype`
    pub velocity: i32,
    /// `itetype`
    pub temperature: i32,
    /// `isatype`
    pub salinity: i32,
}

impl LegacyFlags {
    /// Documented elevation flags.
    pub const ELEVATION: [i32; 6] = [0, 1, 2, 3, 4, 5];
    /// Documented velocity flags.
    pub const VELOCITY: [i32; 9] = [0, 1, 2, 3, 4, 5, -1, -4, -5];
    /// Documented tracer flags.
    pub const TRACER: [i32; 5] = [0, 1, 2, 3, 4];

    /// Flags in `iettype ifltype itetype isatype` order.
    pub fn new(elevation: i32, velocity: i32, temperature: i32, salinity: i32) -> Self {
        Self {
            elevation,
            velocity,
            temperature,
            salinity,
        }
    }

    /// Flags describing a segment.
    pub fn from_segment(segment: &BoundarySegment) -> Self {
        Self {
            elevation: elevation_flag(&segment.elevation),
            velocity: velocity_flag(&segment.velocity),
            temperature: tracer_flag(&segment.temperature),
            salinity: tracer_flag(&segment.salinity),
        }
    }

    /// Build the tagged segment these flags describe.
    ///
    /// Auxiliary values the flags do not refer to are ignored. Missing ones
    /// are left empty and rejected later by validation.
    pub fn to_segment(&self, index: SegmentIndex, aux: &LegacyAuxiliary) -> Result<BoundarySegment> {
        let invalid = |field: &str, flag: i32| {
            BoundaryError::configuration(Some(index), field, format!("undocumented flag {flag}"))
        };

        let elevation = match self.elevation {
            0 => ElevationSpec::None,
            1 => ElevationSpec::TimeSeriesFile {
                series: aux.elevation_series.clone(),
            },
            2 => ElevationSpec::Constant {
                value: aux.elevation_constant,
            },
            3 => ElevationSpec::Harmonic,
            4 => ElevationSpec::External {
                source: aux.elevation_source.clone(),
            },
            5 => ElevationSpec::HarmonicPlusExternal {
                source: aux.elevation_source.clone(),
            },
            flag => return Err(invalid("iettype", flag)),
        };

        let velocity = match self.velocity {
            0 => VelocitySpec::None,
            1 => VelocitySpec::TimeSeriesFile {
                series: aux.velocity_series.clone(),
            },
            2 => VelocitySpec::Constant {
                discharge: aux.discharge,
            },
            3 => VelocitySpec::Harmonic,
            4 => VelocitySpec::External {
                source: aux.velocity_source.clone(),
            },
            5 => VelocitySpec::HarmonicPlusExternal {
                source: aux.velocity_source.clone(),
            },
            -1 => VelocitySpec::Radiation {
                mean_elevation: aux.mean_elevation.clone(),
                mean_velocity: aux.mean_velocity.clone(),
            },
            flag @ (-4 | -5) => VelocitySpec::Relaxed {
                source: aux.velocity_source.clone(),
                inflow_relax: aux.inflow_relax,
                outflow_relax: aux.outflow_relax,
                tidal: flag == -5,
            },
            flag => return Err(invalid("ifltype", flag)),
        };

        let temperature = tracer_spec(
            self.temperature,
            aux.temperature_series.as_ref(),
            aux.temperature_constant,
            aux.temperature_source.as_ref(),
            aux.temperature_nudge,
        )
        .ok_or_else(|| invalid("itetype", self.temperature))?;
        let salinity = tracer_spec(
            self.salinity,
            aux.salinity_series.as_ref(),
            aux.salinity_constant,
            aux.salinity_source.as_ref(),
            aux.salinity_nudge,
        )
        .ok_or_else(|| invalid("isatype", self.salinity))?;

        Ok(BoundarySegment {
            index,
            elevation,
            velocity,
            temperature,
            salinity,
            tides: None,
        })
    }
}

impl fmt::Display for LegacyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.elevation, self.velocity, self.temperature, self.salinity
        )
    }
}

/// Values referred to by the flags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyAuxiliary {
    /// `ethconst`
    pub elevation_constant: Option<f64>,
    /// `vthconst` (m³/s)
    pub discharge: Option<f64>,
    /// `tthconst`
    pub temperature_constant: Option<f64>,
    /// `sthconst`
    pub salinity_constant: Option<f64>,
    /// `elev.th` column
    pub elevation_series: Option<TimeSeriesRef>,
    /// `flux.th` column
    pub velocity_series: Option<TimeSeriesRef>,
    /// `TEM_1.th` column
    pub temperature_series: Option<TimeSeriesRef>,
    /// `SAL_1.th` column
    pub salinity_series: Option<TimeSeriesRef>,
    /// `elev2D` source
    pub elevation_source: Option<ExternalDataSource>,
    /// `uv3D` source
    pub velocity_source: Option<ExternalDataSource>,
    /// `TEM_3D` source
    pub temperature_source: Option<ExternalDataSource>,
    /// `SAL_3D` source
    pub salinity_source: Option<ExternalDataSource>,
    /// `vnf1`
    pub inflow_relax: Option<f64>,
    /// `vnf2`
    pub outflow_relax: Option<f64>,
    /// `tobc`
    pub temperature_nudge: Option<f64>,
    /// `sobc`
    pub salinity_nudge: Option<f64>,
    /// `eta_mean` per node
    pub mean_elevation: Option<Vec<f64>>,
    /// `vn_mean` per node
    pub mean_velocity: Option<Vec<f64>>,
}

impl LegacyAuxiliary {
    /// Values a segment's variants carry.
    pub fn from_segment(segment: &BoundarySegment) -> Self {
        let mut aux = Self::default();
        match &segment.elevation {
            ElevationSpec::TimeSeriesFile { series } => aux.elevation_series = series.clone(),
            ElevationSpec::Constant { value } => aux.elevation_constant = *value,
            ElevationSpec::External { source } | ElevationSpec::HarmonicPlusExternal { source } => {
                aux.elevation_source = source.clone();
            }
            ElevationSpec::None | ElevationSpec::Harmonic => {}
        }
        match &segment.velocity {
            VelocitySpec::TimeSeriesFile { series } => aux.velocity_series = series.clone(),
            VelocitySpec::Constant { discharge } => aux.discharge = *discharge,
            VelocitySpec::External { source } | VelocitySpec::HarmonicPlusExternal { source } => {
                aux.velocity_source = source.clone();
            }
            VelocitySpec::Radiation {
                mean_elevation,
                mean_velocity,
            } => {
                aux.mean_elevation = mean_elevation.clone();
                aux.mean_velocity = mean_velocity.clone();
            }
            VelocitySpec::Relaxed {
                source,
                inflow_relax,
                outflow_relax,
                ..
            } => {
                aux.velocity_source = source.clone();
                aux.inflow_relax = *inflow_relax;
                aux.outflow_relax = *outflow_relax;
            }
            VelocitySpec::None | VelocitySpec::Harmonic => {}
        }
        let (series, constant, source, nudge) = tracer_auxiliary(&segment.temperature);
        aux.temperature_series = series;
        aux.temperature_constant = constant;
        aux.temperature_source = source;
        aux.temperature_nudge = nudge;
        let (series, constant, source, nudge) = tracer_auxiliary(&segment.salinity);
        aux.salinity_series = series;
        aux.salinity_constant = constant;
        aux.salinity_source = source;
        aux.salinity_nudge = nudge;
        aux
    }
}

/// Flags and auxiliary values for a segment.
pub fn to_legacy(segment: &BoundarySegment) -> (LegacyFlags, LegacyAuxiliary) {
    (
        LegacyFlags::from_segment(segment),
        LegacyAuxiliary::from_segment(segment),
    )
}

fn elevation_flag(spec: &ElevationSpec) -> i32 {
    match spec {
        ElevationSpec::None => 0,
        ElevationSpec::TimeSeriesFile { .. } => 1,
        ElevationSpec::Constant { .. } => 2,
        ElevationSpec::Harmonic => 3,
        ElevationSpec::External { .. } => 4,
        ElevationSpec::HarmonicPlusExternal { .. } => 5,
    }
}

fn velocity_flag(spec: &VelocitySpec) -> i32 {
    match spec {
        VelocitySpec::None => 0,
        VelocitySpec::TimeSeriesFile { .. } => 1,
        VelocitySpec::Constant { .. } => 2,
        VelocitySpec::Harmonic => 3,
        VelocitySpec::External { .. } => 4,
        VelocitySpec::HarmonicPlusExternal { .. } => 5,
        VelocitySpec::Radiation { .. } => -1,
        VelocitySpec::Relaxed { tidal: false, .. } => -4,
        VelocitySpec::Relaxed { tidal: true, .. } => -5,
    }
}

fn tracer_flag(spec: &TracerSpec) -> i32 {
    match spec {
        TracerSpec::None => 0,
        TracerSpec::TimeSeriesFile { .. } => 1,
        TracerSpec::Constant { .. } => 2,
        TracerSpec::InitialProfile { .. } => 3,
        TracerSpec::External { .. } => 4,
    }
}

fn tracer_spec(
    flag: i32,
    series: Option<&TimeSeriesRef>,
    constant: Option<f64>,
    source: Option<&ExternalDataSource>,
    nudge: Option<f64>,
) -> Option<TracerSpec> {
    let nudge = nudge.unwrap_or(DEFAULT_NUDGE);
    Some(match flag {
        0 => TracerSpec::None,
        1 => TracerSpec::TimeSeriesFile {
            series: series.cloned(),
            nudge,
        },
        2 => TracerSpec::Constant {
            value: constant,
            nudge,
        },
        3 => TracerSpec::InitialProfile { nudge },
        4 => TracerSpec::External {
            source: source.cloned(),
            nudge,
        },
        _ => return None,
    })
}

type TracerAuxiliary = (
    Option<TimeSeriesRef>,
    Option<f64>,
    Option<ExternalDataSource>,
    Option<f64>,
);

fn tracer_auxiliary(spec: &TracerSpec) -> TracerAuxiliary {
    let nudge = spec.nudge();
    match spec {
        TracerSpec::None | TracerSpec::InitialProfile { .. } => (None, None, None, nudge),
        TracerSpec::TimeSeriesFile { series, .. } => (series.clone(), None, None, nudge),
        TracerSpec::Constant { value, .. } => (None, *value, None, nudge),
        TracerSpec::External { source, .. } => (None, None, source.clone(), nudge),
    }
}
