//! Grid geometry collaborator.
//!
//! The compiler never reads mesh files itself; it is handed something
//! implementing [`BoundaryGrid`].

mod grid;

pub use grid::{BoundaryGrid, Grid, NodePoint};
