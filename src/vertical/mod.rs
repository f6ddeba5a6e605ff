//! Vertical coordinate systems.
//!
//! Terrain-following (σ) levels with optional stretching, or fixed
//! z-levels. Boundary and hotstart sampling converts every level to a
//! positive-down depth before interpolating source profiles:
//!
//! ```text
//! depth = -σ × h        (σ ∈ [-1, 0], still water)
//! ```

mod levels;
mod stretching;

pub use levels::VerticalGrid;
pub use stretching::Stretching;
