//! Projections between grid coordinates and geographic (lon, lat).
//!
//! # Example
//!
//! ```
//! use bctides::geo::{CoordinateProjection, LocalProjection};
//!
//! let proj = LocalProjection::new(-70.0, 42.0);
//! let (x, y) = proj.from_geographic(-69.9, 42.05);
//! let (lon, lat) = proj.to_geographic(x, y);
//! assert!((lon + 69.9).abs() < 1e-9);
//! assert!((lat - 42.05).abs() < 1e-9);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Conversion between a grid's native horizontal coordinates and
/// geographic (longitude, latitude) in degrees.
pub trait CoordinateProjection {
    /// Grid (x, y) to (lon, lat).
    fn to_geographic(&self, x: f64, y: f64) -> (f64, f64);

    /// (lon, lat) to grid (x, y).
    fn from_geographic(&self, lon: f64, lat: f64) -> (f64, f64);
}

/// Local tangent-plane projection on the WGS84 ellipsoid.
///
/// Accurate to ~0.1% within 50 km of the reference point, which covers
/// typical estuary and shelf grids built in local metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ReferencePoint", into = "ReferencePoint")]
pub struct LocalProjection {
    ref_lon: f64,
    ref_lat: f64,
    meters_per_deg_lon: f64,
    meters_per_deg_lat: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ReferencePoint {
    ref_lon: f64,
    ref_lat: f64,
}

impl From<ReferencePoint> for LocalProjection {
    fn from(p: ReferencePoint) -> Self {
        Self::new(p.ref_lon, p.ref_lat)
    }
}

impl From<LocalProjection> for ReferencePoint {
    fn from(p: LocalProjection) -> Self {
        Self {
            ref_lon: p.ref_lon,
            ref_lat: p.ref_lat,
        }
    }
}

impl LocalProjection {
    /// WGS84 equatorial radius in meters
    const A: f64 = 6_378_137.0;
    /// WGS84 flattening
    const F: f64 = 1.0 / 298.257_223_563;

    /// Projection centred on (`ref_lon`, `ref_lat`) degrees.
    pub fn new(ref_lon: f64, ref_lat: f64) -> Self {
        let phi = ref_lat * PI / 180.0;
        let e2 = Self::F * (2.0 - Self::F);
        let w2 = 1.0 - e2 * phi.sin().powi(2);

        // Meridional and prime-vertical radii of curvature
        let rho = Self::A * (1.0 - e2) / w2.powf(1.5);
        let nu = Self::A / w2.sqrt();

        Self {
            ref_lon,
            ref_lat,
            meters_per_deg_lon: nu * phi.cos() * PI / 180.0,
            meters_per_deg_lat: rho * PI / 180.0,
        }
    }

    /// Reference point (lon, lat).
    pub fn reference(&self) -> (f64, f64) {
        (self.ref_lon, self.ref_lat)
    }
}

impl CoordinateProjection for LocalProjection {
    fn to_geographic(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.ref_lon + x / self.meters_per_deg_lon,
            self.ref_lat + y / self.meters_per_deg_lat,
        )
    }

    fn from_geographic(&self, lon: f64, lat: f64) -> (f64, f64) {
        (
            (lon - self.ref_lon) * self.meters_per_deg_lon,
            (lat - self.ref_lat) * self.meters_per_deg_lat,
        )
    }
}

/// Coordinate system a grid's node coordinates are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CoordinateSystem {
    /// Coordinates are already (lon, lat) degrees.
    #[default]
    Geographic,
    /// Coordinates are metres in a local tangent plane.
    Local(LocalProjection),
}

impl CoordinateProjection for CoordinateSystem {
    fn to_geographic(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Self::Geographic => (x, y),
            Self::Local(p) => p.to_geographic(x, y),
        }
    }

    fn from_geographic(&self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Self::Geographic => (lon, lat),
            Self::Local(p) => p.from_geographic(lon, lat),
        }
    }
}

/// Longitude range used by a gridded source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongitudeConvention {
    /// `[-180, 180)`
    Signed,
    /// `[0, 360)`
    Positive,
}

impl LongitudeConvention {
    /// Infer the convention from a longitude axis.
    ///
    /// Any value above 180° means the source uses `[0, 360)`.
    pub fn detect(axis: &[f64]) -> Self {
        if axis.iter().any(|&lon| lon > 180.0) {
            Self::Positive
        } else {
            Self::Signed
        }
    }

    /// Wrap a longitude into this convention.
    pub fn normalize(self, lon: f64) -> f64 {
        let wrapped = lon.rem_euclid(360.0);
        match self {
            Self::Positive => wrapped,
            Self::Signed if wrapped >= 180.0 => wrapped - 360.0,
            Self::Signed => wrapped,
        }
    }
}
