//! Physical quantity newtypes for the vertical coordinate.
//!
//! Source datasets express the vertical as positive-down depth in metres,
//! while terrain-following grids use a dimensionless σ ∈ [-1, 0]. Keeping
//! them distinct avoids sign mistakes when mapping grid levels onto
//! source depth axes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Depth below the undisturbed surface, positive downward (metres).
///
/// # Example
///
/// ```
/// use bctides::types::Depth;
///
/// let d = Depth::new(25.0);
/// assert_eq!(d.meters(), 25.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Depth(f64);

impl Depth {
    /// Create a new depth value. Negative inputs are clamped to the surface.
    #[inline]
    pub fn new(meters: f64) -> Self {
        Self(meters.max(0.0))
    }

    /// The surface (zero depth).
    pub const SURFACE: Self = Self(0.0);

    /// Depth in metres.
    #[inline]
    pub fn meters(self) -> f64 {
        self.0
    }

    /// Elevation of this depth relative to the reference surface (z, positive up).
    #[inline]
    pub fn to_z(self) -> f64 {
        -self.0
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}m", self.0)
    }
}

/// Terrain-following coordinate, σ ∈ [-1, 0].
///
/// σ = -1 at the bed, σ = 0 at the surface.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Sigma(f64);

impl Sigma {
    /// Create a sigma value, clamped into [-1, 0].
    #[inline]
    pub fn new(value: f64) -> Self {
        Self(value.clamp(-1.0, 0.0))
    }

    /// Bottom (σ = -1).
    pub const BOTTOM: Self = Self(-1.0);

    /// Surface (σ = 0).
    pub const SURFACE: Self = Self(0.0);

    /// Raw σ value.
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Depth of this σ level in a still water column of total depth `h`.
    ///
    /// The reference surface is used (η = 0): a hotstart or boundary
    /// profile is defined before the free surface is known.
    #[inline]
    pub fn to_depth(self, h: f64) -> Depth {
        Depth::new(-self.0 * h.max(0.0))
    }
}
