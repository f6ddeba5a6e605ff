//! Vertical interpolation of source profiles onto target depths.

use serde::{Deserialize, Serialize};

/// Vertical interpolation method, configured per source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalMethod {
    /// Linear in depth.
    #[default]
    Linear,
    /// Linear in ln(1 + depth), resolving the upper ocean more finely.
    LogDepth,
}

impl VerticalMethod {
    fn transform(self, depth: f64) -> f64 {
        match self {
            Self::Linear => depth,
            Self::LogDepth => depth.max(0.0).ln_1p(),
        }
    }
}

/// Interpolate a profile (`depths` positive down, any order) at `target`.
///
/// Masked (NaN) levels are skipped. Targets shallower or deeper than the
/// valid part of the profile take the nearest valid value. Returns NaN if
/// no level is valid.
pub fn interpolate_profile(method: VerticalMethod, depths: &[f64], values: &[f64], target: f64) -> f64 {
    let mut valid: Vec<(f64, f64)> = depths
        .iter()
        .zip(values)
        .filter(|(d, v)| d.is_finite() && v.is_finite())
        .map(|(&d, &v)| (d, v))
        .collect();
    match valid.len() {
        0 => return f64::NAN,
        1 => return valid[0].1,
        _ => {}
    }
    valid.sort_by(|a, b| a.0.total_cmp(&b.0));

    let first = valid[0];
    let last = valid[valid.len() - 1];
    if target <= first.0 {
        return first.1;
    }
    if target >= last.0 {
        return last.1;
    }
    let hi = valid.partition_point(|&(d, _)| d <= target).min(valid.len() - 1);
    let (d0, v0) = valid[hi - 1];
    let (d1, v1) = valid[hi];
    let (z0, z1, z) = (method.transform(d0), method.transform(d1), method.transform(target));
    if (z1 - z0).abs() < f64::EPSILON {
        return v0;
    }
    v0 + (z - z0) / (z1 - z0) * (v1 - v0)
}
