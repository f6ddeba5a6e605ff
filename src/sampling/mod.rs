//! External series sampling.
//!
//! Turns a gridded source (reanalysis, parent model output) into values at
//! arbitrary target points, levels and times:
//!
//! 1. axis names are reconciled through the source's [`CoordinateMapping`]
//! 2. horizontal interpolation per source level ([`HorizontalMethod`])
//! 3. vertical interpolation onto target depths ([`VerticalMethod`])
//! 4. linear interpolation in time, clamping within tolerance
//!
//! Coverage gaps that can be bridged become warnings; gaps that cannot
//! become [`BoundaryError::DataCoverage`](crate::error::BoundaryError).

mod horizontal;
mod sampler;
mod source;
mod temporal;
mod vertical;

pub use horizontal::{HorizontalMethod, HorizontalPlan};
pub(crate) use sampler::Strides;
pub use sampler::{ExternalSeriesSampler, SampleOutput, SampleTarget, SourceProfiles};
pub use source::{CoordinateMapping, ExternalDataSource, SourceVariable};
pub use temporal::{plan_times, TemporalPlan, TimeWeight};
pub use vertical::{interpolate_profile, VerticalMethod};
