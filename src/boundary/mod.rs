//! Open-boundary forcing: from declarative specs to compiled arrays.
//!
//! # Pipeline
//!
//! ```text
//! BoundaryConfig ──segments()──► [BoundarySegment]
//!        (setup shorthand, legacy flags, overrides)
//!                                     │ validate_segment (all, in order)
//!                                     ▼
//!                         BoundarySegmentCompiler (per segment)
//!                 tides ─► TidalConstituentResolver ─► synthesize
//!                 sources ─► ExternalSeriesSampler
//!                                     │ ordered merge
//!                                     ▼
//!                              CompiledBoundary
//! ```
//!
//! # Variants
//!
//! | Quantity | Variants |
//! |----------|----------|
//! | `ElevationSpec` | none, time series file, constant, harmonic, external, harmonic + external |
//! | `VelocitySpec` | as elevation (file/constant are discharges), radiation, relaxed |
//! | `TracerSpec` | none, time series file, constant, initial profile, external |
//!
//! Harmonic + external is strictly additive: the external series is a
//! residual on top of the tide. No other blending is supported.

mod compiled;
mod compiler;
mod legacy;
mod segment;
mod setup;
mod taxonomy;
mod validate;

pub use compiled::{
    CompiledBoundary, CompiledElevation, CompiledSegment, CompiledTracer, CompiledVelocity,
    Relaxation,
};
pub use compiler::BoundaryConditionCompiler;
pub use legacy::{to_legacy, LegacyAuxiliary, LegacyFlags};
pub use segment::BoundarySegmentCompiler;
pub use setup::{
    expand, BoundaryConfig, LegacySegment, SegmentOverride, SetupDefaults, SetupType,
};
pub use taxonomy::{
    BoundarySegment, ElevationSpec, TimeSeriesRef, TracerSpec, VelocitySpec, DEFAULT_NUDGE,
};
pub use validate::validate_segment;
