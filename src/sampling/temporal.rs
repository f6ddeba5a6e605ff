//! Time bracketing with the clamp-and-warn coverage policy.

use chrono::{DateTime, Duration, Utc};

use crate::diagnostics::CoverageDetail;
use crate::error::{BoundaryError, Result};

/// Linear weights between two source time indices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeWeight {
    /// Earlier source index.
    pub lo: usize,
    /// Later source index (equal to `lo` when clamped or exact).
    pub hi: usize,
    /// Weight of `hi`; `lo` gets `1 - w_hi`.
    pub w_hi: f64,
}

/// Weights for every requested time plus any clamping that occurred.
#[derive(Clone, Debug, PartialEq)]
pub struct TemporalPlan {
    /// One entry per requested time.
    pub weights: Vec<TimeWeight>,
    /// Set when some requested times were clamped to the axis edge.
    pub clamped: Option<CoverageDetail>,
}

impl TemporalPlan {
    /// Source indices referenced by any weight, ascending.
    pub fn used_indices(&self) -> Vec<usize> {
        let mut used: Vec<usize> = self
            .weights
            .iter()
            .flat_map(|w| [w.lo, w.hi])
            .collect();
        used.sort_unstable();
        used.dedup();
        used
    }
}

/// Plan interpolation of `axis` onto `targets`.
///
/// Times outside the axis are clamped to its edge when within
/// `tolerance_s` seconds of it; farther out the whole request fails.
pub fn plan_times(
    axis: &[DateTime<Utc>],
    targets: &[DateTime<Utc>],
    tolerance_s: f64,
    source_name: &str,
) -> Result<TemporalPlan> {
    let (Some(&first), Some(&last)) = (axis.first(), axis.last()) else {
        return Err(BoundaryError::coverage(source_name, "source has an empty time axis"));
    };
    if axis.windows(2).any(|w| w[1] <= w[0]) {
        return Err(BoundaryError::coverage(
            source_name,
            "source time axis is not strictly increasing",
        ));
    }

    let mut weights = Vec::with_capacity(targets.len());
    let mut clamped: Vec<(DateTime<Utc>, DateTime<Utc>, f64)> = Vec::new();

    for &t in targets {
        let (edge, gap) = if t < first {
            (Some((0, first)), seconds(first - t))
        } else if t > last {
            (Some((axis.len() - 1, last)), seconds(t - last))
        } else {
            (None, 0.0)
        };

        if let Some((index, edge_time)) = edge {
            if gap > tolerance_s {
                return Err(BoundaryError::coverage(
                    source_name,
                    format!(
                        "requested time {t} lies {:.1} h outside coverage {first} .. {last} (tolerance {:.1} h)",
                        gap / 3600.0,
                        tolerance_s / 3600.0
                    ),
                ));
            }
            clamped.push((t, edge_time, gap));
            weights.push(TimeWeight {
                lo: index,
                hi: index,
                w_hi: 0.0,
            });
            continue;
        }

        let hi = axis.partition_point(|&a| a < t).min(axis.len() - 1);
        if axis[hi] == t || hi == 0 {
            weights.push(TimeWeight {
                lo: hi,
                hi,
                w_hi: 0.0,
            });
            continue;
        }
        let lo = hi - 1;
        let span = seconds(axis[hi] - axis[lo]);
        weights.push(TimeWeight {
            lo,
            hi,
            w_hi: seconds(t - axis[lo]) / span,
        });
    }

    let clamped = clamped
        .iter()
        .max_by(|a, b| a.2.total_cmp(&b.2))
        .map(|&(farthest, edge, _)| CoverageDetail::TimeClamped {
            count: clamped.len(),
            farthest,
            edge,
        });

    Ok(TemporalPlan { weights, clamped })
}

fn seconds(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}
