//! Structural validation of segment specs.
//!
//! Runs before any data is opened: every variant must carry the inputs it
//! needs, and every value must lie in its documented range.

use super::taxonomy::{BoundarySegment, ElevationSpec, TimeSeriesRef, TracerSpec, VelocitySpec};
use crate::error::{BoundaryError, Result};
use crate::sampling::{ExternalDataSource, SourceVariable};
use crate::tides::TidalConfiguration;
use crate::types::SegmentIndex;

/// Check a segment against the variant requirements.
///
/// `n_nodes` is the segment's node count on the grid (Flather means are
/// sized against it).
pub fn validate_segment(
    segment: &BoundarySegment,
    global_tides: Option<&TidalConfiguration>,
    n_nodes: usize,
) -> Result<()> {
    let index = Some(segment.index);
    let checker = Checker { index };

    match &segment.elevation {
        ElevationSpec::None | ElevationSpec::Harmonic => {}
        ElevationSpec::TimeSeriesFile { series } => checker.series(series.as_ref(), "elevation.series")?,
        ElevationSpec::Constant { value } => checker.finite(*value, "elevation.value")?,
        ElevationSpec::External { source } | ElevationSpec::HarmonicPlusExternal { source } => {
            checker.source(source.as_ref(), "elevation.source", &[SourceVariable::Elevation])?;
        }
    }

    match &segment.velocity {
        VelocitySpec::None | VelocitySpec::Harmonic => {}
        VelocitySpec::TimeSeriesFile { series } => checker.series(series.as_ref(), "velocity.series")?,
        VelocitySpec::Constant { discharge } => checker.finite(*discharge, "velocity.discharge")?,
        VelocitySpec::External { source } | VelocitySpec::HarmonicPlusExternal { source } => {
            checker.source(source.as_ref(), "velocity.source", &[SourceVariable::U, SourceVariable::V])?;
        }
        VelocitySpec::Radiation {
            mean_elevation,
            mean_velocity,
        } => {
            checker.means(mean_elevation.as_deref(), "velocity.mean_elevation", n_nodes)?;
            checker.means(mean_velocity.as_deref(), "velocity.mean_velocity", n_nodes)?;
        }
        VelocitySpec::Relaxed {
            source,
            inflow_relax,
            outflow_relax,
            ..
        } => {
            checker.unit(*inflow_relax, "velocity.inflow_relax")?;
            checker.unit(*outflow_relax, "velocity.outflow_relax")?;
            checker.source(source.as_ref(), "velocity.source", &[SourceVariable::U, SourceVariable::V])?;
        }
    }

    checker.tracer(&segment.temperature, "temperature", SourceVariable::Temperature)?;
    checker.tracer(&segment.salinity, "salinity", SourceVariable::Salinity)?;

    if segment.needs_tides() {
        let tides = segment
            .effective_tides(global_tides)
            .ok_or_else(|| BoundaryError::missing(index, "tides"))?;
        tides
            .validate(segment.elevation.needs_tides(), segment.velocity.needs_tides())
            .map_err(|e| e.in_segment(segment.index))?;
    }
    Ok(())
}

struct Checker {
    index: Option<SegmentIndex>,
}

impl Checker {
    fn invalid(&self, field: &str, message: impl Into<String>) -> BoundaryError {
        BoundaryError::configuration(self.index, field, message)
    }

    fn finite(&self, value: Option<f64>, field: &str) -> Result<()> {
        match value {
            None => Err(BoundaryError::missing(self.index, field)),
            Some(v) if !v.is_finite() => Err(self.invalid(field, format!("{v} is not a finite number"))),
            Some(_) => Ok(()),
        }
    }

    fn unit(&self, value: Option<f64>, field: &str) -> Result<()> {
        self.finite(value, field)?;
        match value {
            Some(v) if !(0.0..=1.0).contains(&v) => Err(self.invalid(field, format!("{v} is outside [0, 1]"))),
            _ => Ok(()),
        }
    }

    fn series(&self, series: Option<&TimeSeriesRef>, field: &str) -> Result<()> {
        match series {
            None => Err(BoundaryError::missing(self.index, field)),
            Some(s) if s.path.as_os_str().is_empty() => Err(self.invalid(field, "empty path")),
            Some(_) => Ok(()),
        }
    }

    fn source(&self, source: Option<&ExternalDataSource>, field: &str, variables: &[SourceVariable]) -> Result<()> {
        let source = source.ok_or_else(|| BoundaryError::missing(self.index, field))?;
        for &variable in variables {
            if source.mapped_name(variable).is_none() {
                return Err(BoundaryError::missing(
                    self.index,
                    format!("{field}.variables.{variable}"),
                ));
            }
        }
        Ok(())
    }

    fn means(&self, values: Option<&[f64]>, field: &str, n_nodes: usize) -> Result<()> {
        let values = values.ok_or_else(|| BoundaryError::missing(self.index, field))?;
        if values.len() != n_nodes {
            return Err(self.invalid(
                field,
                format!("has {} values, segment has {} nodes", values.len(), n_nodes),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(self.invalid(field, "contains non-finite values"));
        }
        Ok(())
    }

    fn tracer(&self, spec: &TracerSpec, name: &str, variable: SourceVariable) -> Result<()> {
        if let Some(nudge) = spec.nudge() {
            self.unit(Some(nudge), &format!("{name}.nudge"))?;
        }
        match spec {
            TracerSpec::None | TracerSpec::InitialProfile { .. } => Ok(()),
            TracerSpec::TimeSeriesFile { series, .. } => self.series(series.as_ref(), &format!("{name}.series")),
            TracerSpec::Constant { value, .. } => self.finite(*value, &format!("{name}.value")),
            TracerSpec::External { source, .. } => {
                self.source(source.as_ref(), &format!("{name}.source"), &[variable])
            }
        }
    }
}
