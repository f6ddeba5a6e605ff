//! Horizontal coordinate handling.
//!
//! Grids may be expressed in projected metres or in geographic degrees,
//! while tidal atlases and ocean reanalyses are almost always geographic,
//! with longitudes either in `[-180, 180)` or `[0, 360)`. Everything that
//! looks up a source by position goes through this module first.

mod projection;

pub use projection::{CoordinateProjection, CoordinateSystem, LocalProjection, LongitudeConvention};
