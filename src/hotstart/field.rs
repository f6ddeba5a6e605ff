//! Hotstart output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diagnostics::TracerField;
use crate::types::BoundaryArray;

/// Initial state on every grid node and level.
///
/// 3-D fields are node × level × 1 arrays. Dynamic fields are a cold start:
/// all zero, the solver applies its own turbulence floors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotstartField {
    /// Time the tracers were sampled at.
    pub reference_time: DateTime<Utc>,
    /// Temperature (°C).
    pub temperature: BoundaryArray,
    /// Salinity (PSU), never negative.
    pub salinity: BoundaryArray,
    /// Surface elevation per node (m).
    pub elevation: Vec<f64>,
    /// Eastward velocity.
    pub u: BoundaryArray,
    /// Northward velocity.
    pub v: BoundaryArray,
    /// Vertical velocity.
    pub w: BoundaryArray,
    /// Turbulent kinetic energy.
    pub q2: BoundaryArray,
    /// Turbulent mixing length.
    pub xl: BoundaryArray,
}

impl HotstartField {
    /// Cold-start dynamics around sampled tracers of equal shape.
    pub(crate) fn cold_start(
        reference_time: DateTime<Utc>,
        temperature: BoundaryArray,
        salinity: BoundaryArray,
    ) -> Self {
        let (n_nodes, n_levels, _) = temperature.shape();
        let zeros = BoundaryArray::zeros(n_nodes, n_levels, 1);
        Self {
            reference_time,
            temperature,
            salinity,
            elevation: vec![0.0; n_nodes],
            u: zeros.clone(),
            v: zeros.clone(),
            w: zeros.clone(),
            q2: zeros.clone(),
            xl: zeros,
        }
    }

    /// Number of grid nodes.
    pub fn n_nodes(&self) -> usize {
        self.temperature.n_nodes()
    }

    /// Number of vertical levels.
    pub fn n_levels(&self) -> usize {
        self.temperature.n_levels()
    }

    /// Tracer array.
    pub fn tracer(&self, field: TracerField) -> &BoundaryArray {
        match field {
            TracerField::Temperature => &self.temperature,
            TracerField::Salinity => &self.salinity,
        }
    }

    /// Tracer value at a node and level.
    pub fn tracer_at(&self, field: TracerField, node: usize, level: usize) -> Option<f64> {
        self.tracer(field).get(node, level, 0)
    }
}
