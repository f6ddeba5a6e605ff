//! ExternalSeriesSampler: gridded source → target points × levels × times.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use super::horizontal::HorizontalPlan;
use super::temporal::{plan_times, TemporalPlan, TimeWeight};
use super::vertical::{interpolate_profile, VerticalMethod};
use super::{CoordinateMapping, ExternalDataSource, SourceVariable};
use crate::config::CompilerOptions;
use crate::dataset::{Dataset, DatasetError, DatasetProvider, Variable};
use crate::diagnostics::{CompileWarning, CoverageDetail, Diagnostics};
use crate::error::{BoundaryError, Result};
use crate::types::BoundaryArray;

/// A location to sample, with the depths (positive down) of its levels.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleTarget {
    /// Longitude (degrees east).
    pub lon: f64,
    /// Latitude (degrees north).
    pub lat: f64,
    /// Depth of each output level, bottom first.
    pub depths: Vec<f64>,
}

impl SampleTarget {
    /// Surface-only target (elevation, depth-averaged quantities).
    pub fn surface(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            depths: vec![0.0],
        }
    }
}

/// Sampled arrays keyed by quantity, plus coverage warnings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleOutput {
    /// One node × level × time array per requested quantity.
    pub values: BTreeMap<SourceVariable, BoundaryArray>,
    /// Recoverable coverage conditions met while sampling.
    pub diagnostics: Diagnostics,
}

impl SampleOutput {
    /// Remove and return the array for a quantity.
    pub fn take(&mut self, variable: SourceVariable) -> Option<BoundaryArray> {
        self.values.remove(&variable)
    }
}

/// Where each role lives in a variable's flat storage.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Strides {
    x: usize,
    y: usize,
    time: Option<usize>,
    depth: Option<usize>,
}

impl Strides {
    pub(crate) fn resolve(variable: &Variable, name: &str, mapping: &CoordinateMapping) -> Result<Self> {
        let dims = variable.dims();
        let shape = variable.shape();
        let mut strides = vec![0usize; dims.len()];
        let mut acc = 1;
        for i in (0..dims.len()).rev() {
            strides[i] = acc;
            acc *= shape[i];
        }

        let mut out = Strides::default();
        let (mut has_x, mut has_y) = (false, false);
        for (i, dim) in dims.iter().enumerate() {
            if *dim == mapping.x {
                out.x = strides[i];
                has_x = true;
            } else if *dim == mapping.y {
                out.y = strides[i];
                has_y = true;
            } else if *dim == mapping.time {
                out.time = Some(strides[i]);
            } else if *dim == mapping.depth {
                out.depth = Some(strides[i]);
            } else if shape[i] > 1 {
                return Err(DatasetError::Invalid(format!(
                    "variable `{name}` has unmapped dimension `{dim}` of length {}",
                    shape[i]
                ))
                .into());
            }
        }
        if !(has_x && has_y) {
            return Err(DatasetError::Invalid(format!(
                "variable `{name}` is not defined on the `{}`/`{}` axes",
                mapping.x, mapping.y
            ))
            .into());
        }
        Ok(out)
    }

    #[inline]
    pub(crate) fn offset(&self, iy: usize, ix: usize, it: usize, iz: usize) -> usize {
        iy * self.y + ix * self.x + self.time.map_or(0, |s| it * s) + self.depth.map_or(0, |s| iz * s)
    }
}

/// Interpolates external gridded sources onto target points.
///
/// [`sample`](Self::sample) serves boundary segments (boundary nodes ×
/// levels × output times); [`profiles`](Self::profiles) serves hotstart
/// (all grid nodes at one time, depths evaluated later).
pub struct ExternalSeriesSampler<'a> {
    provider: &'a dyn DatasetProvider,
    options: &'a CompilerOptions,
}

impl<'a> ExternalSeriesSampler<'a> {
    /// Sampler reading through `provider`.
    pub fn new(provider: &'a dyn DatasetProvider, options: &'a CompilerOptions) -> Self {
        Self { provider, options }
    }

    /// Sample `variables` from `source` at every target and time.
    ///
    /// All targets must have the same number of levels. Elevation is
    /// always sampled as a single surface level.
    pub fn sample(
        &self,
        source: &ExternalDataSource,
        targets: &[SampleTarget],
        times: &[DateTime<Utc>],
        variables: &[SourceVariable],
    ) -> Result<SampleOutput> {
        let n_levels = targets.first().map_or(1, |t| t.depths.len());
        if n_levels == 0 || targets.iter().any(|t| t.depths.len() != n_levels) {
            return Err(BoundaryError::configuration(
                None,
                "targets",
                "every sample target needs the same, non-zero number of levels",
            ));
        }

        // Resolve names up front so a bad mapping fails before any interpolation.
        let dataset = self.provider.open(&source.location)?;
        let source_name = dataset.name().to_string();
        let mut resolved = Vec::with_capacity(variables.len());
        for &variable in variables {
            let (data, strides) = resolve_variable(&dataset, source, variable, &source_name)?;
            resolved.push((variable, data, strides));
        }

        let mut output = SampleOutput::default();
        let points: Vec<(f64, f64)> = targets.iter().map(|t| (t.lon, t.lat)).collect();
        let plan = self.horizontal_plan(&dataset, source, &points, &mut output.diagnostics)?;

        let mut temporal: Option<TemporalPlan> = None;
        let mut masked = BTreeSet::new();

        for (variable, data, strides) in resolved {
            let time_plan = match strides.time {
                Some(_) => {
                    if temporal.is_none() {
                        temporal = Some(self.temporal_plan(&dataset, source, times, &mut output.diagnostics)?);
                    }
                    temporal.as_ref()
                }
                None => None,
            };
            let source_depths = match strides.depth {
                Some(_) => Some(dataset.numeric_axis(&source.coordinates.depth)?),
                None => None,
            };
            let levels = if variable.is_three_dimensional() { n_levels } else { 1 };

            let ctx = SliceContext {
                dataset: &dataset,
                source,
                data,
                strides,
                plan: &plan,
                points: &points,
                source_depths,
            };
            let array = match time_plan {
                Some(tp) => {
                    let mut snapshots = BTreeMap::new();
                    for it in tp.used_indices() {
                        snapshots.insert(it, ctx.snapshot(it, targets, variable, &mut masked)?);
                    }
                    BoundaryArray::from_fn(targets.len(), levels, times.len(), |p, k, t| {
                        let w = tp.weights[t];
                        let at = |i: usize| snapshots[&i][p * levels + k];
                        (1.0 - w.w_hi) * at(w.lo) + w.w_hi * at(w.hi)
                    })
                }
                None => {
                    let snapshot = ctx.snapshot(0, targets, variable, &mut masked)?;
                    BoundaryArray::from_fn(targets.len(), levels, times.len(), |p, k, _| {
                        snapshot[p * levels + k]
                    })
                }
            };
            output.values.insert(variable, array);
        }

        push_masked(&mut output.diagnostics, source_name, masked);
        Ok(output)
    }

    /// Horizontally interpolated source profiles of `variable` at `points`
    /// and instant `at`.
    ///
    /// The source is opened and the horizontal plan built once; any number
    /// of target depths can then be evaluated with [`SourceProfiles::at`]
    /// without touching the source again.
    pub fn profiles(
        &self,
        source: &ExternalDataSource,
        points: &[(f64, f64)],
        at: DateTime<Utc>,
        variable: SourceVariable,
    ) -> Result<SourceProfiles> {
        let dataset = self.provider.open(&source.location)?;
        let source_name = dataset.name().to_string();
        let (data, strides) = resolve_variable(&dataset, source, variable, &source_name)?;

        let mut diagnostics = Diagnostics::new();
        let plan = self.horizontal_plan(&dataset, source, points, &mut diagnostics)?;
        let weight = match strides.time {
            Some(_) => self
                .temporal_plan(&dataset, source, &[at], &mut diagnostics)?
                .weights
                .first()
                .copied(),
            None => None,
        }
        .unwrap_or(TimeWeight {
            lo: 0,
            hi: 0,
            w_hi: 0.0,
        });
        let source_depths = match strides.depth {
            Some(_) => Some(dataset.numeric_axis(&source.coordinates.depth)?),
            None => None,
        };

        let ctx = SliceContext {
            dataset: &dataset,
            source,
            data,
            strides,
            plan: &plan,
            points,
            source_depths,
        };
        let mut masked = BTreeSet::new();
        let lo = ctx.profiles(weight.lo, &mut masked)?;
        let hi = if weight.hi != weight.lo {
            Some((weight.w_hi, ctx.profiles(weight.hi, &mut masked)?))
        } else {
            None
        };
        push_masked(&mut diagnostics, source_name, masked);

        Ok(SourceProfiles {
            method: source.vertical,
            depths: source_depths.map(<[f64]>::to_vec),
            lo,
            hi,
            diagnostics,
        })
    }

    fn horizontal_plan(
        &self,
        dataset: &Dataset,
        source: &ExternalDataSource,
        points: &[(f64, f64)],
        diagnostics: &mut Diagnostics,
    ) -> Result<HorizontalPlan> {
        let xs = dataset.numeric_axis(&source.coordinates.x)?;
        let ys = dataset.numeric_axis(&source.coordinates.y)?;
        let plan = HorizontalPlan::new(
            source.horizontal,
            xs,
            ys,
            points,
            self.options.spatial_tolerance_degrees,
            dataset.name(),
        )?;
        if !plan.outside().is_empty() {
            diagnostics.push(CompileWarning::DataCoverage {
                source_name: dataset.name().to_string(),
                segment: None,
                detail: CoverageDetail::OutsideExtent {
                    points: plan.outside().to_vec(),
                },
            });
        }
        Ok(plan)
    }

    fn temporal_plan(
        &self,
        dataset: &Dataset,
        source: &ExternalDataSource,
        times: &[DateTime<Utc>],
        diagnostics: &mut Diagnostics,
    ) -> Result<TemporalPlan> {
        let axis = dataset.time_axis(&source.coordinates.time)?;
        let planned = plan_times(axis, times, self.options.time_extrapolation_tolerance_s, dataset.name())?;
        if let Some(detail) = planned.clamped.clone() {
            diagnostics.push(CompileWarning::DataCoverage {
                source_name: dataset.name().to_string(),
                segment: None,
                detail,
            });
        }
        Ok(planned)
    }
}

/// Source-level profiles at fixed points and one instant.
///
/// Built by [`ExternalSeriesSampler::profiles`]; only the vertical step
/// remains when a depth is requested.
#[derive(Clone, Debug)]
pub struct SourceProfiles {
    method: VerticalMethod,
    depths: Option<Vec<f64>>,
    lo: Vec<Vec<f64>>,
    hi: Option<(f64, Vec<Vec<f64>>)>,
    /// Coverage conditions met while building the profiles.
    pub diagnostics: Diagnostics,
}

impl SourceProfiles {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.lo.len()
    }

    /// True if there are no points.
    pub fn is_empty(&self) -> bool {
        self.lo.is_empty()
    }

    /// Value at `point` and `depth` (positive down), NaN for an unknown point.
    pub fn at(&self, point: usize, depth: f64) -> f64 {
        let Some(lo) = self.lo.get(point) else {
            return f64::NAN;
        };
        let v_lo = vertical_at(self.method, self.depths.as_deref(), lo, depth);
        match &self.hi {
            Some((w_hi, hi)) => {
                let v_hi = vertical_at(self.method, self.depths.as_deref(), &hi[point], depth);
                (1.0 - w_hi) * v_lo + w_hi * v_hi
            }
            None => v_lo,
        }
    }
}

fn resolve_variable<'d>(
    dataset: &'d Dataset,
    source: &ExternalDataSource,
    variable: SourceVariable,
    source_name: &str,
) -> Result<(&'d Variable, Strides)> {
    let mapped = source
        .mapped_name(variable)
        .ok_or_else(|| BoundaryError::missing(None, format!("source.variables.{variable}")))?;
    let data = dataset
        .variable(mapped)
        .ok_or_else(|| BoundaryError::VariableNotFound {
            source_name: source_name.to_string(),
            variable: variable.to_string(),
            mapped_name: mapped.to_string(),
        })?;
    let strides = Strides::resolve(data, mapped, &source.coordinates)?;
    Ok((data, strides))
}

fn push_masked(diagnostics: &mut Diagnostics, source_name: String, masked: BTreeSet<usize>) {
    if !masked.is_empty() {
        diagnostics.push(CompileWarning::DataCoverage {
            source_name,
            segment: None,
            detail: CoverageDetail::MaskedFallback {
                points: masked.into_iter().collect(),
            },
        });
    }
}

fn vertical_at(method: VerticalMethod, depths: Option<&[f64]>, profile: &[f64], depth: f64) -> f64 {
    match depths {
        Some(depths) => interpolate_profile(method, depths, profile, depth),
        None => profile.first().copied().unwrap_or(f64::NAN),
    }
}

struct SliceContext<'s> {
    dataset: &'s Dataset,
    source: &'s ExternalDataSource,
    data: &'s Variable,
    strides: Strides,
    plan: &'s HorizontalPlan,
    points: &'s [(f64, f64)],
    source_depths: Option<&'s [f64]>,
}

impl SliceContext<'_> {
    /// Source-level profile at every point for source time index `it`.
    fn profiles(&self, it: usize, masked: &mut BTreeSet<usize>) -> Result<Vec<Vec<f64>>> {
        let values = self.data.data();
        let n_source_levels = self.source_depths.map_or(1, <[f64]>::len);
        let mut out = Vec::with_capacity(self.points.len());

        for (p, &(lon, lat)) in self.points.iter().enumerate() {
            let mut profile = Vec::with_capacity(n_source_levels);
            for iz in 0..n_source_levels {
                let (v, fallback) = self.plan.interpolate(p, |iy, ix| {
                    values
                        .get(self.strides.offset(iy, ix, it, iz))
                        .copied()
                        .unwrap_or(f64::NAN)
                });
                if fallback && v.is_finite() {
                    masked.insert(p);
                }
                profile.push(v);
            }
            if profile.iter().all(|v| !v.is_finite()) {
                return Err(BoundaryError::coverage(
                    self.dataset.name(),
                    format!("no valid data at target point {p} ({lon:.4}, {lat:.4})"),
                ));
            }
            out.push(profile);
        }
        Ok(out)
    }

    /// Values at every (target, level) for source time index `it`.
    fn snapshot(
        &self,
        it: usize,
        targets: &[SampleTarget],
        variable: SourceVariable,
        masked: &mut BTreeSet<usize>,
    ) -> Result<Vec<f64>> {
        let three_dimensional = variable.is_three_dimensional();
        let profiles = self.profiles(it, masked)?;
        let mut out = Vec::new();
        for (target, profile) in targets.iter().zip(&profiles) {
            if three_dimensional {
                for &depth in &target.depths {
                    out.push(vertical_at(self.source.vertical, self.source_depths, profile, depth));
                }
            } else {
                out.push(vertical_at(self.source.vertical, self.source_depths, profile, 0.0));
            }
        }
        Ok(out)
    }
}
