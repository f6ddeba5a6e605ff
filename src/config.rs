//! Compiler options and the simulation time window.
//!
//! Options carry documented defaults and can be loaded from YAML:
//!
//! ```text
//! time_extrapolation_tolerance_s: 86400.0
//! spatial_tolerance_degrees: 1.0
//! hotstart_level_chunk: 8
//! sanity:
//!   temperature: [-2.5, 40.0]
//!   salinity: [0.0, 42.0]
//! ```
//!
//! Missing keys fall back to [`CompilerOptions::default`].

use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::BoundaryError;

/// Error type for option loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML syntax or type error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Value outside its allowed range
    #[error("invalid option `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Plausible physical ranges for hotstart tracers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanityBands {
    /// Temperature band (°C).
    pub temperature: (f64, f64),
    /// Salinity band (PSU).
    pub salinity: (f64, f64),
}

impl Default for SanityBands {
    fn default() -> Self {
        Self {
            temperature: (-2.5, 40.0),
            salinity: (0.0, 42.0),
        }
    }
}

/// Tunables shared by every stage of a compilation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// How far (seconds) beyond a source's time axis a request may lie and
    /// still be clamped with a warning instead of failing.
    pub time_extrapolation_tolerance_s: f64,
    /// How far (degrees) outside a source's extent all points may lie before
    /// the request is treated as entirely uncovered.
    pub spatial_tolerance_degrees: f64,
    /// Hotstart tracer sanity bands.
    pub sanity: SanityBands,
    /// Number of vertical levels sampled per hotstart chunk.
    pub hotstart_level_chunk: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            time_extrapolation_tolerance_s: 86_400.0,
            spatial_tolerance_degrees: 1.0,
            sanity: SanityBands::default(),
            hotstart_level_chunk: 8,
        }
    }
}

impl CompilerOptions {
    /// Parse options from a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_yaml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Read options from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Builder: set the time extrapolation tolerance.
    pub fn with_time_tolerance(mut self, tolerance: Duration) -> Self {
        self.time_extrapolation_tolerance_s = tolerance.num_milliseconds() as f64 / 1000.0;
        self
    }

    /// Builder: set the sanity bands.
    pub fn with_sanity(mut self, sanity: SanityBands) -> Self {
        self.sanity = sanity;
        self
    }

    /// Builder: set the hotstart chunk size.
    pub fn with_hotstart_level_chunk(mut self, levels: usize) -> Self {
        self.hotstart_level_chunk = levels;
        self
    }

    /// Check option ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.time_extrapolation_tolerance_s >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "time_extrapolation_tolerance_s",
                message: "must be non-negative".into(),
            });
        }
        if !(self.spatial_tolerance_degrees >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "spatial_tolerance_degrees",
                message: "must be non-negative".into(),
            });
        }
        if self.hotstart_level_chunk == 0 {
            return Err(ConfigError::Invalid {
                field: "hotstart_level_chunk",
                message: "must be at least 1".into(),
            });
        }
        for (field, band) in [
            ("sanity.temperature", self.sanity.temperature),
            ("sanity.salinity", self.sanity.salinity),
        ] {
            if !(band.0 < band.1) {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("lower bound {} must be below upper bound {}", band.0, band.1),
                });
            }
        }
        Ok(())
    }
}

/// Simulation window sampled at a fixed output step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Simulation start (t = 0).
    pub start: DateTime<Utc>,
    /// Simulation end (inclusive when it falls on a step).
    pub end: DateTime<Utc>,
    /// Output step in seconds.
    pub step_s: f64,
}

impl TimeWindow {
    /// Create a window.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Self {
        Self {
            start,
            end,
            step_s: step.num_milliseconds() as f64 / 1000.0,
        }
    }

    /// Single-instant window (used by hotstart sampling).
    pub fn instant(at: DateTime<Utc>) -> Self {
        Self {
            start: at,
            end: at,
            step_s: 1.0,
        }
    }

    /// Check that the window is well formed.
    pub fn validate(&self) -> Result<(), BoundaryError> {
        if self.end < self.start {
            return Err(BoundaryError::configuration(
                None,
                "time_window.end",
                format!("end {} precedes start {}", self.end, self.start),
            ));
        }
        if !(self.step_s > 0.0) {
            return Err(BoundaryError::configuration(
                None,
                "time_window.step_s",
                "output step must be positive",
            ));
        }
        Ok(())
    }

    /// Total duration in seconds.
    pub fn duration_s(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }

    /// Number of output time steps.
    ///
    /// A window that fails [`validate`](Self::validate) has a single step.
    pub fn n_steps(&self) -> usize {
        if !(self.step_s > 0.0) {
            return 1;
        }
        let span = self.duration_s().max(0.0);
        let steps = (span / self.step_s + 1e-9).floor();
        if steps.is_finite() && steps < usize::MAX as f64 {
            steps as usize + 1
        } else {
            1
        }
    }

    /// Output times in seconds since `start`.
    pub fn offsets(&self) -> Vec<f64> {
        (0..self.n_steps()).map(|i| i as f64 * self.step_s).collect()
    }

    /// Output times as absolute timestamps.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.offsets()
            .into_iter()
            .map(|s| self.start + Duration::milliseconds((s * 1000.0).round() as i64))
            .collect()
    }
}
