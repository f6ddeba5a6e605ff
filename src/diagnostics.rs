//! Recoverable warnings collected during compilation.
//!
//! Partial coverage and out-of-band hotstart values do not stop a run; they
//! are recorded here, logged through `tracing`, and handed back to the
//! caller next to the compiled output so it can decide whether to proceed.
//!
//! # Example
//!
//! ```
//! use bctides::diagnostics::{CompileWarning, Diagnostics, TracerField};
//!
//! let mut diagnostics = Diagnostics::new();
//! diagnostics.push(CompileWarning::SanityRange {
//!     field: TracerField::Salinity,
//!     count: 3,
//!     min: -0.2,
//!     max: 35.1,
//!     band: (0.0, 42.0),
//! });
//! assert_eq!(diagnostics.len(), 1);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::SegmentIndex;

/// Tracer identifier used in warnings and hotstart output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracerField {
    /// Potential temperature (°C).
    Temperature,
    /// Practical salinity (PSU).
    Salinity,
}

impl fmt::Display for TracerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Salinity => write!(f, "salinity"),
        }
    }
}

/// What part of a request was not covered by a source.
#[derive(Clone, Debug, PartialEq)]
pub enum CoverageDetail {
    /// Requested times beyond the source's time axis were clamped to its edge.
    TimeClamped {
        /// Number of requested time stamps that were clamped.
        count: usize,
        /// Requested time farthest from the covered range.
        farthest: DateTime<Utc>,
        /// Edge of the covered range that was used instead.
        edge: DateTime<Utc>,
    },
    /// Target points outside the source extent used nearest-edge values.
    OutsideExtent {
        /// Indices into the target point list.
        points: Vec<usize>,
    },
    /// Target points whose surrounding source cells were masked used the
    /// nearest valid cell.
    MaskedFallback {
        /// Indices into the target point list.
        points: Vec<usize>,
    },
}

/// A recoverable condition surfaced to the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum CompileWarning {
    /// Partial out-of-range coverage of a source (time or space).
    DataCoverage {
        /// Source label.
        source_name: String,
        /// Segment being compiled, `None` for hotstart / global work.
        segment: Option<SegmentIndex>,
        /// What was substituted.
        detail: CoverageDetail,
    },
    /// Hotstart tracer values outside the configured sanity band.
    SanityRange {
        /// Affected tracer.
        field: TracerField,
        /// Number of node/level values outside the band.
        count: usize,
        /// Minimum value found.
        min: f64,
        /// Maximum value found.
        max: f64,
        /// Configured band (lower, upper).
        band: (f64, f64),
    },
}

impl CompileWarning {
    /// Attribute a coverage warning to a segment (no-op if already attributed).
    pub fn with_segment(mut self, index: SegmentIndex) -> Self {
        if let Self::DataCoverage { segment, .. } = &mut self {
            segment.get_or_insert(index);
        }
        self
    }

    /// Segment the warning belongs to, if any.
    pub fn segment(&self) -> Option<SegmentIndex> {
        match self {
            Self::DataCoverage { segment, .. } => *segment,
            Self::SanityRange { .. } => None,
        }
    }
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataCoverage {
                source_name,
                segment,
                detail,
            } => {
                if let Some(seg) = segment {
                    write!(f, "{seg}: ")?;
                }
                match detail {
                    CoverageDetail::TimeClamped {
                        count,
                        farthest,
                        edge,
                    } => write!(
                        f,
                        "source `{}`: {} requested time(s) outside coverage (farthest {}), clamped to {}",
                        source_name, count, farthest, edge
                    ),
                    CoverageDetail::OutsideExtent { points } => write!(
                        f,
                        "source `{}`: {} point(s) outside spatial extent, nearest-edge values used",
                        source_name,
                        points.len()
                    ),
                    CoverageDetail::MaskedFallback { points } => write!(
                        f,
                        "source `{}`: {} point(s) fell on masked cells, nearest valid values used",
                        source_name,
                        points.len()
                    ),
                }
            }
            Self::SanityRange {
                field,
                count,
                min,
                max,
                band,
            } => write!(
                f,
                "hotstart {}: {} value(s) outside [{:.2}, {:.2}] (range {:.3}..{:.3})",
                field, count, band.0, band.1, min, max
            ),
        }
    }
}

/// Ordered collection of warnings from one compilation run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    warnings: Vec<CompileWarning>,
}

impl Diagnostics {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it.
    pub fn push(&mut self, warning: CompileWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Append warnings collected elsewhere (already logged).
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    /// Append warnings not already present.
    pub fn merge_unique(&mut self, other: Diagnostics) {
        for warning in other.warnings {
            if !self.warnings.contains(&warning) {
                self.warnings.push(warning);
            }
        }
    }

    /// Attribute every coverage warning to a segment.
    pub fn attribute_to(mut self, index: SegmentIndex) -> Self {
        self.warnings = self
            .warnings
            .into_iter()
            .map(|w| w.with_segment(index))
            .collect();
        self
    }

    /// Number of warnings.
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Iterate over the warnings in the order they were raised.
    pub fn iter(&self) -> impl Iterator<Item = &CompileWarning> {
        self.warnings.iter()
    }

    /// Coverage warnings only.
    pub fn coverage_warnings(&self) -> impl Iterator<Item = &CompileWarning> {
        self.warnings
            .iter()
            .filter(|w| matches!(w, CompileWarning::DataCoverage { .. }))
    }

    /// Sanity-range warnings only.
    pub fn sanity_warnings(&self) -> impl Iterator<Item = &CompileWarning> {
        self.warnings
            .iter()
            .filter(|w| matches!(w, CompileWarning::SanityRange { .. }))
    }

    /// One line per warning.
    pub fn summary(&self) -> String {
        if self.warnings.is_empty() {
            return "no warnings".to_string();
        }
        let lines: Vec<String> = self.warnings.iter().map(|w| format!("- {w}")).collect();
        format!("{} warning(s):\n{}", self.warnings.len(), lines.join("\n"))
    }
}

impl IntoIterator for Diagnostics {
    type Item = CompileWarning;
    type IntoIter = std::vec::IntoIter<CompileWarning>;

    fn into_iter(self) -> Self::IntoIter {
        self.warnings.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outside(points: Vec<usize>) -> CompileWarning {
        CompileWarning::DataCoverage {
            source_name: "atlas".into(),
            segment: None,
            detail: CoverageDetail::OutsideExtent { points },
        }
    }

    #[test]
    fn test_attribute_to_segment() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(outside(vec![0, 4]));
        let diagnostics = diagnostics.attribute_to(SegmentIndex::new(2));
        let first = diagnostics.iter().next().unwrap();
        assert_eq!(first.segment(), Some(SegmentIndex::new(2)));
        assert!(first.to_string().starts_with("segment #2: "));
    }

    #[test]
    fn test_existing_segment_is_kept() {
        let w = outside(vec![1])
            .with_segment(SegmentIndex::new(0))
            .with_segment(SegmentIndex::new(5));
        assert_eq!(w.segment(), Some(SegmentIndex::new(0)));
    }

    #[test]
    fn test_filters() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(outside(vec![1]));
        diagnostics.push(CompileWarning::SanityRange {
            field: TracerField::Temperature,
            count: 1,
            min: 41.0,
            max: 41.0,
            band: (-2.5, 40.0),
        });
        assert_eq!(diagnostics.coverage_warnings().count(), 1);
        assert_eq!(diagnostics.sanity_warnings().count(), 1);
        assert!(diagnostics.summary().starts_with("2 warning(s)"));
    }

    #[test]
    fn test_merge_unique() {
        let mut a = Diagnostics::new();
        a.push(outside(vec![1]));
        let mut b = Diagnostics::new();
        b.push(outside(vec![1]));
        b.push(outside(vec![2]));
        a.merge_unique(b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(Diagnostics::new().summary(), "no warnings");
    }
}
