//! Tidal harmonics.
//!
//! - [`Constituent`]: catalogue of supported constituents and speeds
//! - [`AstronomicalArguments`]: Schureman nodal factors and V₀ + u
//! - [`TidalConfiguration`]: constituents plus atlas references
//! - [`TidalConstituentResolver`]: atlas → per-node amplitude/phase
//! - [`synthesize`]: harmonic reconstruction at output times
//!
//! # Example
//!
//! ```
//! use bctides::tides::{synthesize, ComponentHarmonics, Constituent, NodalCorrection};
//!
//! let harmonics = ComponentHarmonics {
//!     amplitude: vec![vec![1.0]],
//!     phase: vec![vec![0.0]],
//! };
//! let series = synthesize(&[Constituent::M2], &[NodalCorrection::IDENTITY], &harmonics, &[0.0]);
//! assert!((series.get(0, 0, 0).unwrap() - 1.0).abs() < 1e-12);
//! ```

mod config;
mod constituent;
mod nodal;
mod resolver;
mod synthesis;

pub use config::{AtlasReference, TidalConfiguration, CONSTITUENT_PLACEHOLDER};
pub use constituent::{expand_constituents, Constituent};
pub use nodal::{nodal_corrections, AstronomicalArguments, NodalCorrection, NodalPolicy};
pub use resolver::{ComponentHarmonics, HarmonicCoefficients, TidalComponents, TidalConstituentResolver};
pub use synthesis::{constituent_value, synthesize};
