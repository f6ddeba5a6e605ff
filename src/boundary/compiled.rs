//! Compiled boundary output.
//!
//! Plain arrays with metadata, ready for a writer that lays them out in
//! the solver's native files. Arrays are node × level × time (see
//! [`BoundaryArray`]); unforced quantities are `None`.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::legacy::LegacyFlags;
use crate::config::TimeWindow;
use crate::diagnostics::TracerField;
use crate::types::{BoundaryArray, NodeIndex, SegmentIndex};

/// Relaxation weights towards the prescribed series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relaxation {
    /// Weight applied during inflow, in [0, 1].
    pub inflow: f64,
    /// Weight applied during outflow, in [0, 1].
    pub outflow: f64,
}

/// Surface elevation series (m), one level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledElevation {
    /// node × 1 × time
    pub values: BoundaryArray,
}

impl CompiledElevation {
    /// Units of `values`.
    pub fn units(&self) -> &'static str {
        "m"
    }
}

/// Compiled velocity forcing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CompiledVelocity {
    /// Segment discharge (m³/s, negative is inflow), repeated at each node.
    Discharge {
        /// node × 1 × time
        values: BoundaryArray,
    },
    /// Eastward and northward velocity (m/s).
    Components {
        /// node × level × time
        u: BoundaryArray,
        /// node × level × time
        v: BoundaryArray,
        /// Present for relaxed boundaries.
        relaxation: Option<Relaxation>,
    },
    /// Flather reference means; the solver computes the flow itself.
    Radiation {
        /// Mean elevation per node (m).
        mean_elevation: Vec<f64>,
        /// Mean normal velocity per node (m/s).
        mean_velocity: Vec<f64>,
    },
}

impl CompiledVelocity {
    /// Units of the series.
    pub fn units(&self) -> &'static str {
        match self {
            Self::Discharge { .. } => "m3/s",
            Self::Components { .. } | Self::Radiation { .. } => "m/s",
        }
    }

    /// Relaxation weights, if any.
    pub fn relaxation(&self) -> Option<Relaxation> {
        match self {
            Self::Components { relaxation, .. } => *relaxation,
            _ => None,
        }
    }
}

/// Compiled tracer forcing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledTracer {
    /// Which tracer.
    pub field: TracerField,
    /// node × level × time; `None` relaxes towards the solver's initial profile.
    pub values: Option<BoundaryArray>,
    /// Nudging factor in [0, 1].
    pub nudge: f64,
}

impl CompiledTracer {
    /// Units of `values`.
    pub fn units(&self) -> &'static str {
        match self.field {
            TracerField::Temperature => "degC",
            TracerField::Salinity => "PSU",
        }
    }
}

/// All compiled quantities of one open boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledSegment {
    /// Open-boundary index.
    pub index: SegmentIndex,
    /// Boundary nodes, in grid order.
    pub nodes: Vec<NodeIndex>,
    /// Flag encoding of the compiled variants.
    pub flags: LegacyFlags,
    /// Elevation, if forced.
    pub elevation: Option<CompiledElevation>,
    /// Velocity, if forced.
    pub velocity: Option<CompiledVelocity>,
    /// Temperature, if forced.
    pub temperature: Option<CompiledTracer>,
    /// Salinity, if forced.
    pub salinity: Option<CompiledTracer>,
}

impl CompiledSegment {
    /// Number of boundary nodes.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// Whole-domain compiled boundary forcing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledBoundary {
    /// Output time window.
    pub window: TimeWindow,
    /// Vertical levels of 3-D arrays.
    pub n_levels: usize,
    /// Segments in ascending index order.
    pub segments: Vec<CompiledSegment>,
}

impl CompiledBoundary {
    /// Number of segments.
    pub fn n_segments(&self) -> usize {
        self.segments.len()
    }

    /// Look up a segment.
    pub fn segment(&self, index: SegmentIndex) -> Option<&CompiledSegment> {
        self.segments.iter().find(|s| s.index == index)
    }

    /// Flags per segment, in segment order.
    pub fn legacy_flags(&self) -> Vec<LegacyFlags> {
        self.segments.iter().map(|s| s.flags).collect()
    }

    /// Human-readable overview.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} open boundaries, {} levels, {} output steps of {} s from {}\n",
            self.segments.len(),
            self.n_levels,
            self.window.n_steps(),
            self.window.step_s,
            self.window.start
        );
        for segment in &self.segments {
            let _ = write!(out, "  {}: {} nodes, flags {}", segment.index, segment.n_nodes(), segment.flags);
            if let Some(relax) = segment.velocity.as_ref().and_then(CompiledVelocity::relaxation) {
                let _ = write!(out, ", relax {:.2}/{:.2}", relax.inflow, relax.outflow);
            }
            if let Some((lo, hi)) = segment.elevation.as_ref().and_then(|e| e.values.range()) {
                let _ = write!(out, ", elevation {lo:.3}..{hi:.3} m");
            }
            out.push('\n');
        }
        out
    }
}
