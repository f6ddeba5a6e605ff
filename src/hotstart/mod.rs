//! Full-domain initial conditions.
//!
//! Temperature and salinity are interpolated from the same kind of
//! external source used at the boundaries onto every grid node and level;
//! the dynamic fields start from rest.
//!
//! Sources come from an explicit [`HotstartSources`] first. Only when a
//! tracer has no explicit source are the boundary segments scanned for an
//! external tracer spec that can serve it.

mod field;
mod generator;

pub use field::HotstartField;
pub use generator::{HotstartGenerator, HotstartSources};
