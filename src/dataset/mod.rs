//! Dataset access layer.
//!
//! Sources are addressed by [`DataLocation`] and opened through a
//! [`DatasetProvider`], which hands back a shared [`Dataset`]: named
//! coordinate axes plus row-major variables over those axes. Sampling
//! code never sees file formats.
//!
//! | Provider | Serves | Feature |
//! |----------|--------|---------|
//! | [`CatalogProvider`] | pre-loaded datasets | always |
//! | `NetcdfProvider` | NetCDF files (cached) | `netcdf` |

mod model;
#[cfg(feature = "netcdf")]
mod netcdf_file;
mod provider;

use thiserror::Error;

pub use model::{CfTimeUnits, Coordinate, Dataset, Variable};
#[cfg(feature = "netcdf")]
pub use netcdf_file::NetcdfProvider;
pub use provider::{CatalogProvider, DataLocation, DatasetProvider};

/// Error type for dataset access.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// NetCDF library error
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] ::netcdf::Error),

    /// Nothing at the requested location
    #[error("dataset not found: {location}")]
    NotFound { location: String },

    /// Axis referenced by a coordinate mapping is absent
    #[error("coordinate `{name}` not found in dataset `{dataset}`")]
    MissingCoordinate { dataset: String, name: String },

    /// Variable declared over an axis the dataset does not have
    #[error("variable `{variable}` uses unknown dimension `{dimension}`")]
    UnknownDimension { variable: String, dimension: String },

    /// Data length does not match the product of the axis lengths
    #[error("variable `{variable}` has {actual} values, expected {expected}")]
    ShapeMismatch {
        variable: String,
        expected: usize,
        actual: usize,
    },

    /// Malformed content
    #[error("invalid dataset: {0}")]
    Invalid(String),
}
