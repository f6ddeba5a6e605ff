//! Horizontal grid as seen by the boundary compiler.
//!
//! The compiler only needs read access to node positions, still-water
//! depths, the vertical level definition and the ordered node lists of
//! the open boundaries. [`BoundaryGrid`] captures that; [`Grid`] is a
//! plain in-memory implementation.

use serde::{Deserialize, Serialize};

use crate::error::{BoundaryError, Result};
use crate::geo::{CoordinateProjection, CoordinateSystem};
use crate::types::{NodeIndex, SegmentIndex};
use crate::vertical::VerticalGrid;

/// A grid node located in geographic coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodePoint {
    /// Grid node this point came from.
    pub node: NodeIndex,
    /// Longitude (degrees east).
    pub lon: f64,
    /// Latitude (degrees north).
    pub lat: f64,
    /// Still-water depth (m, positive down).
    pub depth: f64,
}

/// Read-only grid geometry consumed by the compiler.
pub trait BoundaryGrid: Send + Sync {
    /// Node coordinates in the grid's native coordinate system.
    fn node_coordinates(&self) -> &[(f64, f64)];

    /// Still-water depth per node (m, positive down).
    fn depths(&self) -> &[f64];

    /// Vertical level definition shared by all nodes.
    fn vertical(&self) -> &VerticalGrid;

    /// Native coordinate system of [`node_coordinates`](Self::node_coordinates).
    fn coordinate_system(&self) -> &CoordinateSystem;

    /// Number of open-boundary segments.
    fn n_open_boundaries(&self) -> usize;

    /// Ordered node list of an open boundary.
    fn open_boundary(&self, segment: SegmentIndex) -> Option<&[NodeIndex]>;

    /// Number of horizontal nodes.
    fn n_nodes(&self) -> usize {
        self.node_coordinates().len()
    }

    /// Number of vertical levels.
    fn n_levels(&self) -> usize {
        self.vertical().n_levels()
    }

    /// Geographic location of a single node.
    fn node_point(&self, node: NodeIndex) -> Option<NodePoint> {
        let (x, y) = *self.node_coordinates().get(node.get())?;
        let depth = self.depths().get(node.get()).copied().unwrap_or(0.0);
        let (lon, lat) = self.coordinate_system().to_geographic(x, y);
        Some(NodePoint {
            node,
            lon,
            lat,
            depth,
        })
    }

    /// Geographic locations of the nodes of one open boundary, in order.
    fn boundary_points(&self, segment: SegmentIndex) -> Result<Vec<NodePoint>> {
        let nodes = self.open_boundary(segment).ok_or_else(|| {
            BoundaryError::configuration(
                Some(segment),
                "segment",
                format!(
                    "grid has {} open boundaries, no {}",
                    self.n_open_boundaries(),
                    segment
                ),
            )
        })?;
        nodes
            .iter()
            .map(|&node| {
                self.node_point(node).ok_or_else(|| {
                    BoundaryError::configuration(
                        Some(segment),
                        "nodes",
                        format!("{node} is not a grid node"),
                    )
                })
            })
            .collect()
    }

    /// Geographic locations of every grid node.
    fn all_points(&self) -> Vec<NodePoint> {
        (0..self.n_nodes())
            .filter_map(|i| self.node_point(NodeIndex::new(i)))
            .collect()
    }
}

/// In-memory grid.
///
/// # Example
///
/// ```
/// use bctides::mesh::{BoundaryGrid, Grid};
/// use bctides::types::{NodeIndex, SegmentIndex};
/// use bctides::vertical::VerticalGrid;
///
/// let grid = Grid::new(
///     vec![(-70.0, 40.0), (-70.1, 40.0), (-70.2, 40.0)],
///     vec![10.0, 20.0, 30.0],
///     VerticalGrid::uniform_sigma(5),
/// )
/// .with_open_boundary(vec![NodeIndex::new(0), NodeIndex::new(1)]);
///
/// assert_eq!(grid.n_open_boundaries(), 1);
/// assert_eq!(grid.boundary_points(SegmentIndex::new(0)).unwrap().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    coordinates: Vec<(f64, f64)>,
    depths: Vec<f64>,
    vertical: VerticalGrid,
    #[serde(default)]
    coordinate_system: CoordinateSystem,
    #[serde(default)]
    open_boundaries: Vec<Vec<NodeIndex>>,
}

impl Grid {
    /// Create a grid in geographic coordinates with no open boundaries.
    pub fn new(coordinates: Vec<(f64, f64)>, depths: Vec<f64>, vertical: VerticalGrid) -> Self {
        Self {
            coordinates,
            depths,
            vertical,
            coordinate_system: CoordinateSystem::Geographic,
            open_boundaries: Vec::new(),
        }
    }

    /// Builder: append an open boundary.
    pub fn with_open_boundary(mut self, nodes: Vec<NodeIndex>) -> Self {
        self.open_boundaries.push(nodes);
        self
    }

    /// Builder: declare the native coordinate system.
    pub fn with_coordinate_system(mut self, system: CoordinateSystem) -> Self {
        self.coordinate_system = system;
        self
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.depths.len() != self.coordinates.len() {
            return Err(BoundaryError::configuration(
                None,
                "grid.depths",
                format!(
                    "{} depths for {} nodes",
                    self.depths.len(),
                    self.coordinates.len()
                ),
            ));
        }
        self.vertical
            .validate()
            .map_err(|msg| BoundaryError::configuration(None, "grid.vertical", msg))?;
        for (i, nodes) in self.open_boundaries.iter().enumerate() {
            let segment = SegmentIndex::new(i);
            if nodes.is_empty() {
                return Err(BoundaryError::configuration(
                    Some(segment),
                    "nodes",
                    "open boundary has no nodes",
                ));
            }
            if let Some(bad) = nodes.iter().find(|n| n.get() >= self.coordinates.len()) {
                return Err(BoundaryError::configuration(
                    Some(segment),
                    "nodes",
                    format!("{bad} is not a grid node"),
                ));
            }
        }
        Ok(())
    }
}

impl BoundaryGrid for Grid {
    fn node_coordinates(&self) -> &[(f64, f64)] {
        &self.coordinates
    }

    fn depths(&self) -> &[f64] {
        &self.depths
    }

    fn vertical(&self) -> &VerticalGrid {
        &self.vertical
    }

    fn coordinate_system(&self) -> &CoordinateSystem {
        &self.coordinate_system
    }

    fn n_open_boundaries(&self) -> usize {
        self.open_boundaries.len()
    }

    fn open_boundary(&self, segment: SegmentIndex) -> Option<&[NodeIndex]> {
        self.open_boundaries.get(segment.get()).map(Vec::as_slice)
    }
}
