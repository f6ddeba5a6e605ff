//! Error taxonomy for boundary and hotstart compilation.
//!
//! Fatal conditions abort the whole run (no partial output). Recoverable
//! conditions are not errors at all: they are collected as
//! [`CompileWarning`](crate::diagnostics::CompileWarning)s and returned
//! next to the successful output.
//!
//! | Class | Fatal | Typical cause |
//! |-------|-------|---------------|
//! | `Configuration` | yes | variant lacks a constant, source, tidal config, relaxation coefficient |
//! | `DataCoverage` | yes | requested window or extent lies entirely outside a source |
//! | `VariableNotFound` | yes | mapped variable name does not exist in the dataset |
//! | `Dataset` | yes | the dataset access layer could not open a source, or a time series file is unreadable |

use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::DatasetError;
use crate::io::TimeSeriesFileError;
use crate::types::SegmentIndex;

/// Errors raised while compiling boundary conditions or a hotstart.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// A variant is missing required auxiliary input, or carries an invalid one.
    #[error("configuration error ({}): `{field}`: {message}", scope(.segment))]
    Configuration {
        /// Offending segment, `None` for global configuration.
        segment: Option<SegmentIndex>,
        /// Dotted path of the offending field (e.g. `velocity.outflow_relax`).
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The requested window or extent cannot be served by the source.
    #[error("data coverage error for source `{source_name}`: {message}")]
    DataCoverage {
        /// Source label as reported by the dataset.
        source_name: String,
        /// Description of the uncovered request.
        message: String,
    },

    /// A mapped variable does not resolve in the actual dataset.
    #[error("variable `{variable}` (mapped to `{mapped_name}`) not found in source `{source_name}`")]
    VariableNotFound {
        /// Source label as reported by the dataset.
        source_name: String,
        /// Canonical variable requested by the compiler.
        variable: String,
        /// Name looked up in the dataset after applying the mapping.
        mapped_name: String,
    },

    /// The dataset access layer failed.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// A uniform time series file could not be used.
    #[error("time series file `{}`: {source}", .path.display())]
    TimeSeries {
        /// File path.
        path: PathBuf,
        /// Reader failure.
        #[source]
        source: TimeSeriesFileError,
    },

    /// Any of the above, raised while compiling a specific segment.
    #[error("{index}: {source}")]
    Segment {
        /// Originating segment.
        index: SegmentIndex,
        /// Underlying failure.
        #[source]
        source: Box<BoundaryError>,
    },
}

/// Error class, independent of where it was raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration.
    Configuration,
    /// Request outside source coverage.
    DataCoverage,
    /// Mapped variable absent from source.
    VariableNotFound,
    /// Dataset access failure.
    Dataset,
}

fn scope(segment: &Option<SegmentIndex>) -> String {
    match segment {
        Some(index) => index.to_string(),
        None => "global".to_string(),
    }
}

impl BoundaryError {
    /// Shorthand for a configuration error.
    pub fn configuration(
        segment: Option<SegmentIndex>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            segment,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Configuration error for a required field that was not supplied.
    pub fn missing(segment: Option<SegmentIndex>, field: impl Into<String>) -> Self {
        Self::configuration(segment, field, "required value is missing")
    }

    /// Shorthand for a coverage error.
    pub fn coverage(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataCoverage {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Attach the originating segment index.
    ///
    /// Errors that already name a segment are returned unchanged.
    pub fn in_segment(self, index: SegmentIndex) -> Self {
        match self {
            Self::Segment { .. } => self,
            Self::Configuration {
                segment: Some(_), ..
            } => self,
            Self::Configuration {
                segment: None,
                field,
                message,
            } => Self::Configuration {
                segment: Some(index),
                field,
                message,
            },
            other => Self::Segment {
                index,
                source: Box::new(other),
            },
        }
    }

    /// Error class, looking through segment wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::DataCoverage { .. } => ErrorKind::DataCoverage,
            Self::VariableNotFound { .. } => ErrorKind::VariableNotFound,
            Self::Dataset(_) | Self::TimeSeries { .. } => ErrorKind::Dataset,
            Self::Segment { source, .. } => source.kind(),
        }
    }

    /// Segment the error is attributed to, if any.
    pub fn segment(&self) -> Option<SegmentIndex> {
        match self {
            Self::Configuration { segment, .. } => *segment,
            Self::Segment { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Result alias used throughout the compiler.
pub type Result<T, E = BoundaryError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message_names_segment_and_field() {
        let err = BoundaryError::missing(Some(SegmentIndex::new(3)), "velocity.outflow_relax");
        let msg = err.to_string();
        assert!(msg.contains("segment #3"), "{msg}");
        assert!(msg.contains("velocity.outflow_relax"), "{msg}");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_in_segment_wraps_data_errors() {
        let err = BoundaryError::coverage("hycom", "window ends before source starts")
            .in_segment(SegmentIndex::new(1));
        assert_eq!(err.kind(), ErrorKind::DataCoverage);
        assert_eq!(err.segment(), Some(SegmentIndex::new(1)));
        assert!(err.to_string().starts_with("segment #1: "));
    }

    #[test]
    fn test_in_segment_fills_global_configuration() {
        let err = BoundaryError::missing(None, "tides").in_segment(SegmentIndex::new(2));
        assert_eq!(err.segment(), Some(SegmentIndex::new(2)));
        assert!(matches!(err, BoundaryError::Configuration { .. }));
    }

    #[test]
    fn test_in_segment_is_idempotent() {
        let err = BoundaryError::coverage("a", "b")
            .in_segment(SegmentIndex::new(1))
            .in_segment(SegmentIndex::new(7));
        assert_eq!(err.segment(), Some(SegmentIndex::new(1)));
    }
}
