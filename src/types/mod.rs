//! Strongly-typed domain types for safer APIs.
//!
//! - **Indices**: `SegmentIndex` and `NodeIndex` keep the boundary and
//!   grid index spaces apart.
//! - **Vertical quantities**: `Depth` (positive down) and `Sigma` (σ ∈ [-1, 0]).
//! - **Arrays**: `BoundaryArray`, dense node × level × time values.
//!
//! # Example
//!
//! ```
//! use bctides::types::{Depth, SegmentIndex, Sigma};
//!
//! let seg = SegmentIndex::new(0);
//! let d: Depth = Sigma::new(-0.5).to_depth(40.0);
//! assert_eq!(seg.get(), 0);
//! assert_eq!(d.meters(), 20.0);
//! ```

mod array;
mod indices;
mod physical;

pub use array::BoundaryArray;
pub use indices::{NodeIndex, SegmentIndex};
pub use physical::{Depth, Sigma};
