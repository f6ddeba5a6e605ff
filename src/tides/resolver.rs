//! TidalConstituentResolver: atlas fields → per-node harmonic constants.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::{nodal_corrections, AtlasReference, Constituent, NodalCorrection, TidalConfiguration};
use crate::config::CompilerOptions;
use crate::dataset::DatasetProvider;
use crate::diagnostics::{CompileWarning, CoverageDetail, Diagnostics};
use crate::error::{BoundaryError, Result};
use crate::sampling::{CoordinateMapping, HorizontalMethod, HorizontalPlan, Strides};

/// Which quantities to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TidalComponents {
    /// Elevation amplitude/phase.
    pub elevation: bool,
    /// u and v amplitude/phase.
    pub velocity: bool,
}

/// Amplitude and Greenwich phase lag per constituent and node.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentHarmonics {
    /// `amplitude[c][node]`
    pub amplitude: Vec<Vec<f64>>,
    /// `phase[c][node]` in degrees, [0, 360).
    pub phase: Vec<Vec<f64>>,
}

impl ComponentHarmonics {
    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.amplitude.first().map_or(0, Vec::len)
    }
}

/// Time-independent tidal coefficients for a set of boundary nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct HarmonicCoefficients {
    /// Constituents, in configuration order.
    pub constituents: Vec<Constituent>,
    /// Nodal factor and V₀ + u per constituent at the simulation start.
    pub nodal: Vec<NodalCorrection>,
    /// Elevation constants, if requested.
    pub elevation: Option<ComponentHarmonics>,
    /// Eastward velocity constants, if requested.
    pub u: Option<ComponentHarmonics>,
    /// Northward velocity constants, if requested.
    pub v: Option<ComponentHarmonics>,
}

/// Interpolates tidal atlases onto boundary nodes.
pub struct TidalConstituentResolver<'a> {
    provider: &'a dyn DatasetProvider,
    options: &'a CompilerOptions,
}

impl<'a> TidalConstituentResolver<'a> {
    /// Resolver reading atlases through `provider`.
    pub fn new(provider: &'a dyn DatasetProvider, options: &'a CompilerOptions) -> Self {
        Self { provider, options }
    }

    /// Resolve harmonic constants at `points` (lon, lat) for `start`.
    ///
    /// Nodes outside the atlas take nearest-edge constants and raise a
    /// coverage warning. Land-masked cells fall back to the nearest wet
    /// cell.
    pub fn resolve(
        &self,
        tides: &TidalConfiguration,
        points: &[(f64, f64)],
        start: DateTime<Utc>,
        components: TidalComponents,
    ) -> Result<(HarmonicCoefficients, Diagnostics)> {
        tides.validate(components.elevation, components.velocity)?;
        let constituents = tides.resolved_constituents()?;
        let nodal = nodal_corrections(&constituents, start, tides.nodal);
        let mut diagnostics = Diagnostics::new();

        let mut component = |atlas: Option<&AtlasReference>, field: &str| -> Result<Option<ComponentHarmonics>> {
            match atlas {
                Some(atlas) => self
                    .interpolate_atlas(atlas, &constituents, points, &mut diagnostics)
                    .map(Some),
                None => Err(BoundaryError::missing(None, format!("tides.{field}"))),
            }
        };

        let elevation = if components.elevation {
            component(tides.elevation.as_ref(), "elevation")?
        } else {
            None
        };
        let (u, v) = if components.velocity {
            (
                component(tides.velocity_u.as_ref(), "velocity_u")?,
                component(tides.velocity_v.as_ref(), "velocity_v")?,
            )
        } else {
            (None, None)
        };

        tracing::debug!(
            database = %tides.database,
            constituents = constituents.len(),
            nodes = points.len(),
            "resolved tidal constants"
        );
        Ok((
            HarmonicCoefficients {
                constituents,
                nodal,
                elevation,
                u,
                v,
            },
            diagnostics,
        ))
    }

    fn interpolate_atlas(
        &self,
        atlas: &AtlasReference,
        constituents: &[Constituent],
        points: &[(f64, f64)],
        diagnostics: &mut Diagnostics,
    ) -> Result<ComponentHarmonics> {
        let dataset = self.provider.open(&atlas.location)?;
        let source_name = dataset.name().to_string();
        let xs = dataset.numeric_axis(&atlas.x)?;
        let ys = dataset.numeric_axis(&atlas.y)?;
        let plan = HorizontalPlan::new(
            HorizontalMethod::Bilinear,
            xs,
            ys,
            points,
            self.options.spatial_tolerance_degrees,
            &source_name,
        )?;
        if !plan.outside().is_empty() {
            diagnostics.push(CompileWarning::DataCoverage {
                source_name: source_name.clone(),
                segment: None,
                detail: CoverageDetail::OutsideExtent {
                    points: plan.outside().to_vec(),
                },
            });
        }

        let mapping = CoordinateMapping {
            x: atlas.x.clone(),
            y: atlas.y.clone(),
            ..CoordinateMapping::default()
        };
        let lookup = |constituent: Constituent, name: String| {
            let variable = dataset
                .variable(&name)
                .ok_or_else(|| BoundaryError::VariableNotFound {
                    source_name: source_name.clone(),
                    variable: format!("{constituent} harmonic constant"),
                    mapped_name: name.clone(),
                })?;
            let strides = Strides::resolve(variable, &name, &mapping)?;
            Ok::<_, BoundaryError>((variable.data(), strides))
        };

        let mut masked = BTreeSet::new();
        let mut amplitude = Vec::with_capacity(constituents.len());
        let mut phase = Vec::with_capacity(constituents.len());
        for &c in constituents {
            let (amp, amp_strides) = lookup(c, atlas.amplitude_name(c))?;
            let (pha, pha_strides) = lookup(c, atlas.phase_name(c))?;
            // Interpolate the complex constant so phases do not wrap through 0°/360°.
            let cell = |iy: usize, ix: usize| -> (f64, f64) {
                let a = amp.get(amp_strides.offset(iy, ix, 0, 0)).copied().unwrap_or(f64::NAN);
                let g = pha.get(pha_strides.offset(iy, ix, 0, 0)).copied().unwrap_or(f64::NAN);
                let g = g.to_radians();
                (a * g.cos(), a * g.sin())
            };
            let mut amp_c = Vec::with_capacity(points.len());
            let mut pha_c = Vec::with_capacity(points.len());
            for p in 0..points.len() {
                let (re, fb_re) = plan.interpolate(p, |iy, ix| cell(iy, ix).0);
                let (im, fb_im) = plan.interpolate(p, |iy, ix| cell(iy, ix).1);
                if !(re.is_finite() && im.is_finite()) {
                    return Err(BoundaryError::coverage(
                        &source_name,
                        format!("atlas field for {c} has no valid cells"),
                    ));
                }
                if fb_re || fb_im {
                    masked.insert(p);
                }
                amp_c.push(re.hypot(im));
                pha_c.push(im.atan2(re).to_degrees().rem_euclid(360.0));
            }
            amplitude.push(amp_c);
            phase.push(pha_c);
        }

        if !masked.is_empty() {
            diagnostics.push(CompileWarning::DataCoverage {
                source_name,
                segment: None,
                detail: CoverageDetail::MaskedFallback {
                    points: masked.into_iter().collect(),
                },
            });
        }
        Ok(ComponentHarmonics { amplitude, phase })
    }
}
