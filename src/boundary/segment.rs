//! BoundarySegmentCompiler: one segment's specs → compiled arrays.
//!
//! Each quantity is compiled independently of the others:
//!
//! | Variant | Output |
//! |---------|--------|
//! | none | omitted |
//! | constant | scalar broadcast over nodes, levels and times |
//! | time series file | file column interpolated to the output times, uniform in space |
//! | harmonic | Σ A·f·cos(ω·t + V₀ + u − G) per node |
//! | external | sampled series verbatim |
//! | harmonic + external | harmonic + external, pointwise |
//! | relaxed | external (plus harmonic) series tagged with relaxation weights |
//! | radiation | Flather reference means, no series |
//!
//! Tidal currents are depth-uniform and repeated on every level.

use std::collections::BTreeSet;

use chrono::Duration;

use super::compiled::{CompiledElevation, CompiledSegment, CompiledTracer, CompiledVelocity, Relaxation};
use super::legacy::LegacyFlags;
use super::taxonomy::{BoundarySegment, ElevationSpec, TimeSeriesRef, TracerSpec, VelocitySpec};
use super::validate::validate_segment;
use crate::config::{CompilerOptions, TimeWindow};
use crate::dataset::DatasetProvider;
use crate::diagnostics::{CompileWarning, CoverageDetail, Diagnostics, TracerField};
use crate::error::{BoundaryError, Result};
use crate::io::read_timeseries_file;
use crate::mesh::BoundaryGrid;
use crate::sampling::{ExternalDataSource, ExternalSeriesSampler, SampleTarget, SourceVariable};
use crate::tides::{synthesize, ComponentHarmonics, HarmonicCoefficients, TidalComponents, TidalConfiguration, TidalConstituentResolver};
use crate::types::{BoundaryArray, SegmentIndex};

/// Compiles a single open-boundary segment.
pub struct BoundarySegmentCompiler<'a> {
    provider: &'a dyn DatasetProvider,
    options: &'a CompilerOptions,
}

/// Everything shared by the quantities of one segment.
struct SegmentFrame<'a> {
    index: SegmentIndex,
    targets: Vec<SampleTarget>,
    window: &'a TimeWindow,
    offsets: Vec<f64>,
    n_levels: usize,
    harmonics: Option<HarmonicCoefficients>,
}

impl SegmentFrame<'_> {
    fn n_nodes(&self) -> usize {
        self.targets.len()
    }

    fn n_times(&self) -> usize {
        self.offsets.len()
    }

    fn tidal(&self, pick: fn(&HarmonicCoefficients) -> Option<&ComponentHarmonics>, field: &str) -> Result<BoundaryArray> {
        let coefficients = self
            .harmonics
            .as_ref()
            .ok_or_else(|| BoundaryError::missing(Some(self.index), "tides"))?;
        let harmonics = pick(coefficients).ok_or_else(|| BoundaryError::missing(Some(self.index), field))?;
        Ok(synthesize(
            &coefficients.constituents,
            &coefficients.nodal,
            harmonics,
            &self.offsets,
        ))
    }
}

fn required<T>(value: Option<T>, index: SegmentIndex, field: &str) -> Result<T> {
    value.ok_or_else(|| BoundaryError::missing(Some(index), field))
}

fn sum(a: &BoundaryArray, b: &BoundaryArray, index: SegmentIndex, field: &str) -> Result<BoundaryArray> {
    a.try_add(b).ok_or_else(|| {
        BoundaryError::configuration(
            Some(index),
            field,
            format!("harmonic array {:?} and external array {:?} differ in shape", a.shape(), b.shape()),
        )
    })
}

impl<'a> BoundarySegmentCompiler<'a> {
    /// Compiler reading sources through `provider`.
    pub fn new(provider: &'a dyn DatasetProvider, options: &'a CompilerOptions) -> Self {
        Self { provider, options }
    }

    /// Compile `segment` on `grid` over `window`.
    ///
    /// `tides` is the global tidal configuration; a segment-level one takes
    /// precedence. Errors carry the segment index, and coverage warnings
    /// are attributed to it.
    pub fn compile(
        &self,
        segment: &BoundarySegment,
        grid: &dyn BoundaryGrid,
        tides: Option<&TidalConfiguration>,
        window: &TimeWindow,
    ) -> Result<(CompiledSegment, Diagnostics)> {
        self.compile_segment(segment, grid, tides, window)
            .map(|(compiled, diagnostics)| (compiled, diagnostics.attribute_to(segment.index)))
            .map_err(|e| e.in_segment(segment.index))
    }

    fn compile_segment(
        &self,
        segment: &BoundarySegment,
        grid: &dyn BoundaryGrid,
        tides: Option<&TidalConfiguration>,
        window: &TimeWindow,
    ) -> Result<(CompiledSegment, Diagnostics)> {
        window.validate()?;
        let index = segment.index;
        let points = grid.boundary_points(index)?;
        validate_segment(segment, tides, points.len())?;

        let mut diagnostics = Diagnostics::new();
        let harmonics = match segment.effective_tides(tides) {
            Some(tides) if segment.needs_tides() => {
                let lonlat: Vec<(f64, f64)> = points.iter().map(|p| (p.lon, p.lat)).collect();
                let components = TidalComponents {
                    elevation: segment.elevation.needs_tides(),
                    velocity: segment.velocity.needs_tides(),
                };
                let (coefficients, warnings) = TidalConstituentResolver::new(self.provider, self.options)
                    .resolve(tides, &lonlat, window.start, components)?;
                diagnostics.extend(warnings);
                Some(coefficients)
            }
            _ => None,
        };

        let vertical = grid.vertical();
        let frame = SegmentFrame {
            index,
            targets: points
                .iter()
                .map(|p| SampleTarget {
                    lon: p.lon,
                    lat: p.lat,
                    depths: vertical.level_depths(p.depth).iter().map(|d| d.meters()).collect(),
                })
                .collect(),
            window,
            offsets: window.offsets(),
            n_levels: vertical.n_levels(),
            harmonics,
        };

        let elevation = self.elevation(&segment.elevation, &frame, &mut diagnostics)?;
        let velocity = self.velocity(&segment.velocity, &frame, &mut diagnostics)?;
        let temperature = self.tracer(&segment.temperature, TracerField::Temperature, &frame, &mut diagnostics)?;
        let salinity = self.tracer(&segment.salinity, TracerField::Salinity, &frame, &mut diagnostics)?;

        tracing::debug!(
            segment = %index,
            nodes = frame.n_nodes(),
            steps = frame.n_times(),
            elevation = segment.elevation.kind(),
            velocity = segment.velocity.kind(),
            temperature = segment.temperature.kind(),
            salinity = segment.salinity.kind(),
            "compiled segment"
        );

        Ok((
            CompiledSegment {
                index,
                nodes: points.iter().map(|p| p.node).collect(),
                flags: LegacyFlags::from_segment(segment),
                elevation,
                velocity,
                temperature,
                salinity,
            },
            diagnostics,
        ))
    }

    fn elevation(
        &self,
        spec: &ElevationSpec,
        frame: &SegmentFrame<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<CompiledElevation>> {
        let (n, t) = (frame.n_nodes(), frame.n_times());
        let values = match spec {
            ElevationSpec::None => return Ok(None),
            ElevationSpec::Constant { value } => {
                BoundaryArray::filled(n, 1, t, required(*value, frame.index, "elevation.value")?)
            }
            ElevationSpec::TimeSeriesFile { series } => {
                let series = required(series.as_ref(), frame.index, "elevation.series")?;
                let values = self.series_values(series, frame, diagnostics)?;
                BoundaryArray::from_fn(n, 1, t, |_, _, step| values[step])
            }
            ElevationSpec::Harmonic => frame.tidal(|h| h.elevation.as_ref(), "tides.elevation")?,
            ElevationSpec::External { source } => {
                let source = required(source.as_ref(), frame.index, "elevation.source")?;
                self.external(source, SourceVariable::Elevation, frame, diagnostics)?
            }
            ElevationSpec::HarmonicPlusExternal { source } => {
                let source = required(source.as_ref(), frame.index, "elevation.source")?;
                let tide = frame.tidal(|h| h.elevation.as_ref(), "tides.elevation")?;
                let residual = self.external(source, SourceVariable::Elevation, frame, diagnostics)?;
                sum(&tide, &residual, frame.index, "elevation")?
            }
        };
        Ok(Some(CompiledElevation { values }))
    }

    fn velocity(
        &self,
        spec: &VelocitySpec,
        frame: &SegmentFrame<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<CompiledVelocity>> {
        let (n, t) = (frame.n_nodes(), frame.n_times());
        let compiled = match spec {
            VelocitySpec::None => return Ok(None),
            VelocitySpec::Constant { discharge } => CompiledVelocity::Discharge {
                values: BoundaryArray::filled(n, 1, t, required(*discharge, frame.index, "velocity.discharge")?),
            },
            VelocitySpec::TimeSeriesFile { series } => {
                let series = required(series.as_ref(), frame.index, "velocity.series")?;
                let values = self.series_values(series, frame, diagnostics)?;
                CompiledVelocity::Discharge {
                    values: BoundaryArray::from_fn(n, 1, t, |_, _, step| values[step]),
                }
            }
            VelocitySpec::Harmonic => {
                let (u, v) = self.tidal_currents(frame)?;
                CompiledVelocity::Components { u, v, relaxation: None }
            }
            VelocitySpec::External { source } => {
                let source = required(source.as_ref(), frame.index, "velocity.source")?;
                let (u, v) = self.external_currents(source, frame, diagnostics)?;
                CompiledVelocity::Components { u, v, relaxation: None }
            }
            VelocitySpec::HarmonicPlusExternal { source } => {
                let source = required(source.as_ref(), frame.index, "velocity.source")?;
                let (u, v) = self.combined_currents(source, frame, diagnostics)?;
                CompiledVelocity::Components { u, v, relaxation: None }
            }
            VelocitySpec::Radiation {
                mean_elevation,
                mean_velocity,
            } => CompiledVelocity::Radiation {
                mean_elevation: required(mean_elevation.clone(), frame.index, "velocity.mean_elevation")?,
                mean_velocity: required(mean_velocity.clone(), frame.index, "velocity.mean_velocity")?,
            },
            VelocitySpec::Relaxed {
                source,
                inflow_relax,
                outflow_relax,
                tidal,
            } => {
                let relaxation = Relaxation {
                    inflow: required(*inflow_relax, frame.index, "velocity.inflow_relax")?,
                    outflow: required(*outflow_relax, frame.index, "velocity.outflow_relax")?,
                };
                let source = required(source.as_ref(), frame.index, "velocity.source")?;
                let (u, v) = if *tidal {
                    self.combined_currents(source, frame, diagnostics)?
                } else {
                    self.external_currents(source, frame, diagnostics)?
                };
                CompiledVelocity::Components {
                    u,
                    v,
                    relaxation: Some(relaxation),
                }
            }
        };
        Ok(Some(compiled))
    }

    fn tracer(
        &self,
        spec: &TracerSpec,
        field: TracerField,
        frame: &SegmentFrame<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<CompiledTracer>> {
        let Some(nudge) = spec.nudge() else {
            return Ok(None);
        };
        let (n, l, t) = (frame.n_nodes(), frame.n_levels, frame.n_times());
        let values = match spec {
            TracerSpec::None => return Ok(None),
            TracerSpec::InitialProfile { .. } => None,
            TracerSpec::Constant { value, .. } => Some(BoundaryArray::filled(
                n,
                l,
                t,
                required(*value, frame.index, &format!("{field}.value"))?,
            )),
            TracerSpec::TimeSeriesFile { series, .. } => {
                let series = required(series.as_ref(), frame.index, &format!("{field}.series"))?;
                let values = self.series_values(series, frame, diagnostics)?;
                Some(BoundaryArray::from_fn(n, l, t, |_, _, step| values[step]))
            }
            TracerSpec::External { source, .. } => {
                let source = required(source.as_ref(), frame.index, &format!("{field}.source"))?;
                let variable = match field {
                    TracerField::Temperature => SourceVariable::Temperature,
                    TracerField::Salinity => SourceVariable::Salinity,
                };
                Some(self.external(source, variable, frame, diagnostics)?)
            }
        };
        Ok(Some(CompiledTracer { field, values, nudge }))
    }

    fn tidal_currents(&self, frame: &SegmentFrame<'_>) -> Result<(BoundaryArray, BoundaryArray)> {
        let u = frame.tidal(|h| h.u.as_ref(), "tides.velocity_u")?;
        let v = frame.tidal(|h| h.v.as_ref(), "tides.velocity_v")?;
        Ok((u.broadcast_levels(frame.n_levels), v.broadcast_levels(frame.n_levels)))
    }

    fn external_currents(
        &self,
        source: &ExternalDataSource,
        frame: &SegmentFrame<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<(BoundaryArray, BoundaryArray)> {
        let mut output = ExternalSeriesSampler::new(self.provider, self.options).sample(
            source,
            &frame.targets,
            &frame.window.timestamps(),
            &[SourceVariable::U, SourceVariable::V],
        )?;
        diagnostics.extend(std::mem::take(&mut output.diagnostics));
        let u = required(output.take(SourceVariable::U), frame.index, "velocity.source.variables.u")?;
        let v = required(output.take(SourceVariable::V), frame.index, "velocity.source.variables.v")?;
        Ok((u, v))
    }

    fn combined_currents(
        &self,
        source: &ExternalDataSource,
        frame: &SegmentFrame<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<(BoundaryArray, BoundaryArray)> {
        let (tide_u, tide_v) = self.tidal_currents(frame)?;
        let (residual_u, residual_v) = self.external_currents(source, frame, diagnostics)?;
        Ok((
            sum(&tide_u, &residual_u, frame.index, "velocity")?,
            sum(&tide_v, &residual_v, frame.index, "velocity")?,
        ))
    }

    fn external(
        &self,
        source: &ExternalDataSource,
        variable: SourceVariable,
        frame: &SegmentFrame<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<BoundaryArray> {
        let mut output = ExternalSeriesSampler::new(self.provider, self.options).sample(
            source,
            &frame.targets,
            &frame.window.timestamps(),
            &[variable],
        )?;
        diagnostics.extend(std::mem::take(&mut output.diagnostics));
        required(
            output.take(variable),
            frame.index,
            &format!("source.variables.{variable}"),
        )
    }

    /// File column at the output offsets, clamped within tolerance.
    fn series_values(
        &self,
        series: &TimeSeriesRef,
        frame: &SegmentFrame<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<f64>> {
        let wrap = |source| BoundaryError::TimeSeries {
            path: series.path.clone(),
            source,
        };
        let file = read_timeseries_file(&series.path).map_err(wrap)?;
        file.column(series.column).map_err(wrap)?;

        let (first, last) = file.time_range();
        let tolerance = self.options.time_extrapolation_tolerance_s;
        let name = series.path.display().to_string();
        let mut clamped = BTreeSet::new();
        let mut farthest: Option<(f64, f64)> = None;
        for (step, &offset) in frame.offsets.iter().enumerate() {
            let edge = offset.clamp(first, last);
            let gap = (offset - edge).abs();
            if gap == 0.0 {
                continue;
            }
            if gap > tolerance {
                return Err(BoundaryError::coverage(
                    &name,
                    format!(
                        "output time {offset} s lies {gap} s outside the file's range [{first}, {last}] s"
                    ),
                ));
            }
            clamped.insert(step);
            if farthest.map_or(true, |(_, g)| gap > g) {
                farthest = Some((offset, gap));
            }
        }
        if let Some((offset, _)) = farthest {
            let at = |s: f64| frame.window.start + Duration::milliseconds((s * 1000.0).round() as i64);
            diagnostics.push(CompileWarning::DataCoverage {
                source_name: name,
                segment: Some(frame.index),
                detail: CoverageDetail::TimeClamped {
                    count: clamped.len(),
                    farthest: at(offset),
                    edge: at(offset.clamp(first, last)),
                },
            });
        }

        frame
            .offsets
            .iter()
            .map(|&offset| file.interpolate(series.column, offset).map_err(wrap))
            .collect()
    }
}
