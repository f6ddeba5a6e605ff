//! Vertical level definitions shared by every grid node.
//!
//! Level 0 is the bed, the last level is the surface. Both flavours
//! resolve to positive-down depths for a node of still-water depth `h`,
//! which is what the samplers need to interpolate source profiles.

use serde::{Deserialize, Serialize};

use super::stretching::Stretching;
use crate::types::{Depth, Sigma};

/// Vertical discretisation of the grid.
///
/// # Example
///
/// ```
/// use bctides::vertical::VerticalGrid;
///
/// let vgrid = VerticalGrid::uniform_sigma(3);
/// let depths: Vec<f64> = vgrid.level_depths(100.0).iter().map(|d| d.meters()).collect();
/// assert_eq!(depths, vec![100.0, 50.0, 0.0]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum VerticalGrid {
    /// Terrain-following levels.
    Sigma {
        /// σ at each level, bottom to surface.
        sigma: Vec<f64>,
    },
    /// Fixed depths (positive down), bottom to surface, truncated at the bed.
    ZLevels {
        /// Depth of each level in metres.
        depths: Vec<f64>,
    },
}

impl VerticalGrid {
    /// σ grid from a stretching function.
    pub fn sigma(n_levels: usize, stretching: Stretching) -> Self {
        Self::Sigma {
            sigma: stretching.levels(n_levels),
        }
    }

    /// Equally spaced σ grid.
    pub fn uniform_sigma(n_levels: usize) -> Self {
        Self::sigma(n_levels, Stretching::Uniform)
    }

    /// Depth-averaged (2-D) grid with a single surface level.
    pub fn barotropic() -> Self {
        Self::Sigma { sigma: vec![0.0] }
    }

    /// Fixed z-levels; `depths` must run from deepest to shallowest.
    pub fn z_levels(depths: Vec<f64>) -> Self {
        Self::ZLevels { depths }
    }

    /// Number of levels.
    pub fn n_levels(&self) -> usize {
        match self {
            Self::Sigma { sigma } => sigma.len(),
            Self::ZLevels { depths } => depths.len(),
        }
    }

    /// Depth of every level at a node with still-water depth `h`.
    ///
    /// Z-levels deeper than the local bed collapse onto the bed.
    pub fn level_depths(&self, h: f64) -> Vec<Depth> {
        let h = h.max(0.0);
        match self {
            Self::Sigma { sigma } => sigma.iter().map(|&s| Sigma::new(s).to_depth(h)).collect(),
            Self::ZLevels { depths } => depths.iter().map(|&d| Depth::new(d.min(h))).collect(),
        }
    }

    /// Check ordering (bottom to surface) and ranges.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Sigma { sigma } => {
                if sigma.is_empty() {
                    return Err("sigma grid has no levels".into());
                }
                if sigma.iter().any(|s| !(-1.0..=0.0).contains(s)) {
                    return Err("sigma values must lie in [-1, 0]".into());
                }
                if sigma.windows(2).any(|w| w[1] <= w[0]) {
                    return Err("sigma values must increase from bed to surface".into());
                }
            }
            Self::ZLevels { depths } => {
                if depths.is_empty() {
                    return Err("z-level grid has no levels".into());
                }
                if depths.windows(2).any(|w| w[1] >= w[0]) {
                    return Err("z-level depths must decrease from bed to surface".into());
                }
            }
        }
        Ok(())
    }
}
