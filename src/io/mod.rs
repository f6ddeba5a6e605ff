//! Plain-text forcing readers.
//!
//! - **Uniform time series** (`*.th`): time plus one value column per
//!   boundary, feeding the time-series-file boundary variants
//! - **Constituent tables**: site harmonic constants that can stand in for
//!   a gridded tidal atlas
//!
//! Gridded sources are read through [`crate::dataset`], not here.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use bctides::io::{read_constituent_file, read_timeseries_file};
//!
//! let table = read_constituent_file(Path::new("tides.txt"))?;
//! for e in &table.entries {
//!     println!("{}: A={:.3} m, G={:.1}°", e.constituent, e.amplitude, e.phase_degrees);
//! }
//!
//! let flux = read_timeseries_file(Path::new("flux.th"))?;
//! let q = flux.interpolate(0, 1800.0)?;
//! ```

mod constituent_reader;
mod timeseries_reader;

pub use constituent_reader::{
    parse_constituents, read_constituent_file, ConstituentEntry, ConstituentFileError,
    ConstituentTable,
};
pub use timeseries_reader::{
    parse_timeseries, read_timeseries_file, TimeSeriesFileError, UniformTimeSeries,
};
