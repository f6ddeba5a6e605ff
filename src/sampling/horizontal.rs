//! Horizontal interpolation from a rectilinear source grid onto points.
//!
//! A [`HorizontalPlan`] is built once per (source grid, target points)
//! pair and reused for every variable, level and time slice. Each target
//! gets a stencil of up to four source cells with weights:
//!
//! | Method | Stencil |
//! |--------|---------|
//! | `Nearest` | closest cell, weight 1 |
//! | `Idw` | four surrounding cells, weight 1/d² |
//! | `Bilinear` | four surrounding cells, tensor-product weights |
//!
//! Targets beyond the grid edge are clamped onto it, so they take
//! nearest-edge values. A longitude axis that spans the full circle wraps
//! instead: targets between its last and first column interpolate across
//! the seam. Masked (NaN) cells drop out of the stencil; if the
//! whole stencil is masked the nearest valid cell of the slice is used.

use serde::{Deserialize, Serialize};

use crate::error::{BoundaryError, Result};
use crate::geo::LongitudeConvention;

/// Horizontal interpolation method, configured per source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalMethod {
    /// Value of the closest source cell.
    Nearest,
    /// Inverse-distance weighting over the surrounding cells.
    Idw,
    /// Bilinear interpolation.
    #[default]
    Bilinear,
}

/// Position of a value on a monotonic axis.
#[derive(Clone, Copy, Debug, PartialEq)]
struct AxisBracket {
    lo: usize,
    hi: usize,
    frac: f64,
    /// Distance beyond the axis range, zero when inside.
    excess: f64,
    /// Coordinates of `lo` and `hi`, unwrapped across a periodic seam.
    at_lo: f64,
    at_hi: f64,
}

/// Bracket `v` on an ascending or descending axis, clamping at the edges.
fn bracket(axis: &[f64], v: f64) -> AxisBracket {
    let n = axis.len();
    if n < 2 {
        let at = axis.first().copied().unwrap_or(0.0);
        return AxisBracket {
            lo: 0,
            hi: 0,
            frac: 0.0,
            excess: 0.0,
            at_lo: at,
            at_hi: at,
        };
    }
    let ascending = axis[n - 1] >= axis[0];
    let (min, max) = if ascending {
        (axis[0], axis[n - 1])
    } else {
        (axis[n - 1], axis[0])
    };
    let excess = if v < min {
        min - v
    } else if v > max {
        v - max
    } else {
        0.0
    };
    let idx = if ascending {
        axis.partition_point(|&a| a <= v)
    } else {
        axis.partition_point(|&a| a >= v)
    };
    let lo = idx.saturating_sub(1).min(n - 2);
    let hi = lo + 1;
    let span = axis[hi] - axis[lo];
    let frac = if span.abs() > 0.0 {
        ((v - axis[lo]) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    AxisBracket {
        lo,
        hi,
        frac,
        excess,
        at_lo: axis[lo],
        at_hi: axis[hi],
    }
}

/// True for an ascending, evenly spaced longitude axis whose last column
/// sits one step short of the first plus 360°.
fn is_full_circle(xs: &[f64]) -> bool {
    let n = xs.len();
    if n < 3 || xs.windows(2).any(|w| w[1] <= w[0]) {
        return false;
    }
    let step = (xs[n - 1] - xs[0]) / (n - 1) as f64;
    let gap = xs[0] + 360.0 - xs[n - 1];
    gap > 0.0 && (gap - step).abs() <= 0.01 * step
}

/// Bracket longitude `x` on a full-circle axis, wrapping across the seam.
fn periodic_bracket(xs: &[f64], x: f64) -> AxisBracket {
    let n = xs.len();
    let first = xs[0];
    let last = xs[n - 1];
    let x = first + (x - first).rem_euclid(360.0);
    if x <= last {
        return bracket(xs, x);
    }
    let seam = first + 360.0;
    AxisBracket {
        lo: n - 1,
        hi: 0,
        frac: ((x - last) / (seam - last)).clamp(0.0, 1.0),
        excess: 0.0,
        at_lo: last,
        at_hi: seam,
    }
}

/// One weighted source cell.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Cell {
    iy: usize,
    ix: usize,
    weight: f64,
}

/// Precomputed stencils for a set of target points.
#[derive(Clone, Debug)]
pub struct HorizontalPlan {
    xs: Vec<f64>,
    ys: Vec<f64>,
    targets: Vec<(f64, f64)>,
    stencils: Vec<Vec<Cell>>,
    outside: Vec<usize>,
    periodic: bool,
}

impl HorizontalPlan {
    /// Build stencils for `points` given as (lon, lat).
    ///
    /// Fails with a coverage error only when every point lies farther
    /// than `tolerance_deg` outside the grid.
    pub fn new(
        method: HorizontalMethod,
        xs: &[f64],
        ys: &[f64],
        points: &[(f64, f64)],
        tolerance_deg: f64,
        source_name: &str,
    ) -> Result<Self> {
        if xs.is_empty() || ys.is_empty() {
            return Err(BoundaryError::coverage(source_name, "source grid has an empty horizontal axis"));
        }
        let convention = LongitudeConvention::detect(xs);
        let periodic = is_full_circle(xs);
        let mut targets = Vec::with_capacity(points.len());
        let mut stencils = Vec::with_capacity(points.len());
        let mut outside = Vec::new();
        let mut nearest_excess = f64::INFINITY;

        for (i, &(lon, lat)) in points.iter().enumerate() {
            let x = convention.normalize(lon);
            let bx = if periodic { periodic_bracket(xs, x) } else { bracket(xs, x) };
            let by = bracket(ys, lat);
            let excess = bx.excess.max(by.excess);
            if excess > 1e-9 {
                outside.push(i);
            }
            nearest_excess = nearest_excess.min(excess);

            let cx = lerp(bx);
            let cy = lerp(by);
            targets.push((cx, cy));
            stencils.push(stencil(method, bx, by, cx, cy));
        }

        if !points.is_empty() && outside.len() == points.len() && nearest_excess > tolerance_deg {
            return Err(BoundaryError::coverage(
                source_name,
                format!(
                    "all {} target points lie outside the source extent (closest is {:.3}° beyond, tolerance {:.3}°)",
                    points.len(),
                    nearest_excess,
                    tolerance_deg
                ),
            ));
        }

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            targets,
            stencils,
            outside,
            periodic,
        })
    }

    /// Number of target points.
    pub fn len(&self) -> usize {
        self.stencils.len()
    }

    /// True if there are no targets.
    pub fn is_empty(&self) -> bool {
        self.stencils.is_empty()
    }

    /// Indices of targets that were clamped onto the grid edge.
    pub fn outside(&self) -> &[usize] {
        &self.outside
    }

    /// Interpolate one slice at target `point`.
    ///
    /// `field(iy, ix)` returns the slice value, NaN where masked. The
    /// flag is true when the nearest-valid fallback was needed. Returns
    /// NaN only if the whole slice is masked.
    pub fn interpolate(&self, point: usize, field: impl Fn(usize, usize) -> f64) -> (f64, bool) {
        let Some(cells) = self.stencils.get(point) else {
            return (f64::NAN, false);
        };
        let mut sum = 0.0;
        let mut weight = 0.0;
        for cell in cells {
            let v = field(cell.iy, cell.ix);
            if v.is_finite() {
                sum += cell.weight * v;
                weight += cell.weight;
            }
        }
        if weight > 0.0 {
            return (sum / weight, false);
        }
        (self.nearest_valid(point, &field), true)
    }

    fn nearest_valid(&self, point: usize, field: &impl Fn(usize, usize) -> f64) -> f64 {
        let (tx, ty) = self.targets[point];
        let mut best = (f64::INFINITY, f64::NAN);
        for (iy, &y) in self.ys.iter().enumerate() {
            for (ix, &x) in self.xs.iter().enumerate() {
                let v = field(iy, ix);
                if !v.is_finite() {
                    continue;
                }
                let mut dx = (x - tx).abs();
                if self.periodic {
                    dx = dx.rem_euclid(360.0);
                    dx = dx.min(360.0 - dx);
                }
                let d2 = dx.powi(2) + (y - ty).powi(2);
                if d2 < best.0 {
                    best = (d2, v);
                }
            }
        }
        best.1
    }
}

fn lerp(b: AxisBracket) -> f64 {
    b.at_lo + b.frac * (b.at_hi - b.at_lo)
}

fn stencil(method: HorizontalMethod, bx: AxisBracket, by: AxisBracket, cx: f64, cy: f64) -> Vec<Cell> {
    let corners = [(by.lo, bx.lo), (by.lo, bx.hi), (by.hi, bx.lo), (by.hi, bx.hi)];
    let positions = [
        (by.at_lo, bx.at_lo),
        (by.at_lo, bx.at_hi),
        (by.at_hi, bx.at_lo),
        (by.at_hi, bx.at_hi),
    ];
    match method {
        HorizontalMethod::Nearest => {
            let ix = if bx.frac < 0.5 { bx.lo } else { bx.hi };
            let iy = if by.frac < 0.5 { by.lo } else { by.hi };
            vec![Cell { iy, ix, weight: 1.0 }]
        }
        HorizontalMethod::Bilinear => {
            let (fx, fy) = (bx.frac, by.frac);
            let weights = [(1.0 - fx) * (1.0 - fy), fx * (1.0 - fy), (1.0 - fx) * fy, fx * fy];
            corners
                .iter()
                .zip(weights)
                .filter(|(_, w)| *w > 0.0)
                .map(|(&(iy, ix), weight)| Cell { iy, ix, weight })
                .collect()
        }
        HorizontalMethod::Idw => {
            let mut cells = Vec::with_capacity(4);
            for (&(iy, ix), &(y, x)) in corners.iter().zip(&positions) {
                if cells.iter().any(|c: &Cell| c.iy == iy && c.ix == ix) {
                    continue;
                }
                let d2 = (x - cx).powi(2) + (y - cy).powi(2);
                if d2 < 1e-24 {
                    return vec![Cell { iy, ix, weight: 1.0 }];
                }
                cells.push(Cell {
                    iy,
                    ix,
                    weight: 1.0 / d2,
                });
            }
            cells
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // field(iy, ix) = 10·y + x on a unit grid
    fn linear<'a>(ys: &'a [f64], xs: &'a [f64]) -> impl Fn(usize, usize) -> f64 + 'a {
        move |iy, ix| 10.0 * ys[iy] + xs[ix]
    }

    #[test]
    fn test_bracket_descending_axis() {
        let axis = [3.0, 2.0, 1.0, 0.0];
        let b = bracket(&axis, 1.25);
        assert_eq!((b.lo, b.hi), (1, 2));
        assert!((b.frac - 0.75).abs() < 1e-12);
        assert_eq!(b.excess, 0.0);
        let b = bracket(&axis, -0.5);
        assert!((b.excess - 0.5).abs() < 1e-12);
        assert_eq!(b.frac, 1.0);
    }

    #[test]
    fn test_bilinear_reproduces_linear_field() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 2.0];
        let plan = HorizontalPlan::new(HorizontalMethod::Bilinear, &xs, &ys, &[(0.5, 1.25)], 1.0, "s").unwrap();
        let (v, fallback) = plan.interpolate(0, linear(&ys, &xs));
        assert!((v - 13.0).abs() < 1e-12);
        assert!(!fallback);
    }

    #[test]
    fn test_nearest_and_idw() {
        let xs = [0.0, 1.0];
        let ys = [0.0, 1.0];
        let pts = [(0.2, 0.9)];
        let nearest = HorizontalPlan::new(HorizontalMethod::Nearest, &xs, &ys, &pts, 1.0, "s").unwrap();
        assert_eq!(nearest.interpolate(0, linear(&ys, &xs)).0, 10.0);

        let idw = HorizontalPlan::new(HorizontalMethod::Idw, &xs, &ys, &[(1.0, 0.0)], 1.0, "s").unwrap();
        assert_eq!(idw.interpolate(0, linear(&ys, &xs)).0, 1.0);
        let idw = HorizontalPlan::new(HorizontalMethod::Idw, &xs, &ys, &[(0.5, 0.5)], 1.0, "s").unwrap();
        assert!((idw.interpolate(0, linear(&ys, &xs)).0 - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_outside_points_use_edge_values() {
        let xs = [0.0, 1.0];
        let ys = [0.0, 1.0];
        let plan = HorizontalPlan::new(
            HorizontalMethod::Bilinear,
            &xs,
            &ys,
            &[(0.5, 0.5), (1.4, 0.5)],
            1.0,
            "s",
        )
        .unwrap();
        assert_eq!(plan.outside(), &[1]);
        assert!((plan.interpolate(1, linear(&ys, &xs)).0 - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_points_far_outside_is_error() {
        let xs = [0.0, 1.0];
        let ys = [0.0, 1.0];
        let err = HorizontalPlan::new(HorizontalMethod::Bilinear, &xs, &ys, &[(5.0, 5.0)], 1.0, "hycom").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DataCoverage);
        // within tolerance: clamped, not an error
        assert!(HorizontalPlan::new(HorizontalMethod::Bilinear, &xs, &ys, &[(1.5, 0.5)], 1.0, "s").is_ok());
    }

    #[test]
    fn test_masked_stencil_falls_back_to_nearest_valid() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0];
        let plan = HorizontalPlan::new(HorizontalMethod::Bilinear, &xs, &ys, &[(0.5, 0.5)], 1.0, "s").unwrap();
        let field = |iy: usize, ix: usize| if ix < 2 { f64::NAN } else { 10.0 * iy as f64 + ix as f64 };
        let (v, fallback) = plan.interpolate(0, field);
        assert!(fallback);
        assert_eq!(v, 2.0);
    }

    #[test]
    fn test_partially_masked_stencil_renormalises() {
        let xs = [0.0, 1.0];
        let ys = [0.0, 1.0];
        let plan = HorizontalPlan::new(HorizontalMethod::Bilinear, &xs, &ys, &[(0.5, 0.5)], 1.0, "s").unwrap();
        let field = |iy: usize, ix: usize| if iy == 1 && ix == 1 { f64::NAN } else { 4.0 };
        assert_eq!(plan.interpolate(0, field), (4.0, false));
    }

    #[test]
    fn test_longitude_convention_matched() {
        let xs = [350.0, 351.0];
        let ys = [0.0, 1.0];
        let plan = HorizontalPlan::new(HorizontalMethod::Bilinear, &xs, &ys, &[(-9.5, 0.0)], 1.0, "s").unwrap();
        assert!(plan.outside().is_empty());
        let (v, _) = plan.interpolate(0, |_, ix| xs[ix]);
        assert!((v - 350.5).abs() < 1e-9);
    }

    #[test]
    fn test_full_circle_axis_wraps_across_seam() {
        let xs = [0.0, 90.0, 180.0, 270.0];
        let ys = [0.0, 1.0];
        let column = |_: usize, ix: usize| ix as f64;
        let plan = HorizontalPlan::new(
            HorizontalMethod::Bilinear,
            &xs,
            &ys,
            &[(315.0, 0.0), (-45.0, 0.0), (359.0, 0.0), (45.0, 0.0)],
            1.0,
            "global",
        )
        .unwrap();
        assert!(plan.outside().is_empty());
        assert!((plan.interpolate(0, column).0 - 1.5).abs() < 1e-12);
        assert!((plan.interpolate(1, column).0 - 1.5).abs() < 1e-12);
        assert!((plan.interpolate(2, column).0 - 3.0 * (1.0 / 90.0)).abs() < 1e-12);
        assert!((plan.interpolate(3, column).0 - 0.5).abs() < 1e-12);

        let idw = HorizontalPlan::new(HorizontalMethod::Idw, &xs, &ys, &[(315.0, 0.5)], 1.0, "global").unwrap();
        assert!((idw.interpolate(0, column).0 - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_regional_axis_does_not_wrap() {
        assert!(!is_full_circle(&[0.0, 90.0, 180.0]));
        assert!(is_full_circle(&[-180.0, -90.0, 0.0, 90.0]));
        let b = bracket(&[0.0, 90.0, 180.0], 200.0);
        assert!((b.excess - 20.0).abs() < 1e-12);
    }
}
