//! Reader for uniform boundary time series (`*.th`) files.
//!
//! Each record holds a time (seconds since the simulation start) followed
//! by one value per column. Columns conventionally map to the boundaries
//! that use a time-series-file variant, in segment order.
//!
//! # File Format
//!
//! ```text
//! # elevation forcing, two boundaries
//! 0.0     0.10  0.00
//! 3600.0  0.25  0.05
//! 7200.0  0.15  0.02
//! ```
//!
//! Time values must be strictly increasing and every record must have the
//! same number of columns.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

/// Error type for time series file parsing.
#[derive(Debug, Error)]
pub enum TimeSeriesFileError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Parse error with line number
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Empty file (no data records)
    #[error("Time series file contains no data")]
    EmptyFile,

    /// Non-monotonic time values
    #[error("Non-monotonic time at line {line}")]
    NonMonotonic { line: usize },

    /// Requested column beyond the record width
    #[error("column {column} requested but records have {available}")]
    MissingColumn { column: usize, available: usize },
}

/// Spatially uniform series, one or more value columns per time.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformTimeSeries {
    times: Vec<f64>,
    columns: Vec<Vec<f64>>,
}

impl UniformTimeSeries {
    /// Single-column series from parallel vectors.
    ///
    /// # Errors
    /// - `EmptyFile` if no records are given
    /// - `NonMonotonic` if times are not strictly increasing
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Result<Self, TimeSeriesFileError> {
        if times.len() != values.len() {
            return Err(TimeSeriesFileError::ParseError {
                line: times.len().min(values.len()) + 1,
                message: "times and values differ in length".into(),
            });
        }
        Self::from_columns(times, vec![values])
    }

    fn from_columns(times: Vec<f64>, columns: Vec<Vec<f64>>) -> Result<Self, TimeSeriesFileError> {
        if times.is_empty() {
            return Err(TimeSeriesFileError::EmptyFile);
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(TimeSeriesFileError::NonMonotonic { line: i + 2 });
        }
        Ok(Self { times, columns })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of value columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Record times (seconds since start).
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Values of one column.
    pub fn column(&self, column: usize) -> Result<&[f64], TimeSeriesFileError> {
        self.columns
            .get(column)
            .map(Vec::as_slice)
            .ok_or(TimeSeriesFileError::MissingColumn {
                column,
                available: self.columns.len(),
            })
    }

    /// First and last record time.
    pub fn time_range(&self) -> (f64, f64) {
        match (self.times.first(), self.times.last()) {
            (Some(&t0), Some(&t1)) => (t0, t1),
            _ => (0.0, 0.0),
        }
    }

    /// Linearly interpolate a column at time `t`, clamping at the ends.
    pub fn interpolate(&self, column: usize, t: f64) -> Result<f64, TimeSeriesFileError> {
        let values = self.column(column)?;
        let last = self.times.len() - 1;
        if t <= self.times[0] {
            return Ok(values[0]);
        }
        if t >= self.times[last] {
            return Ok(values[last]);
        }
        let hi = self.times.partition_point(|&x| x <= t).min(last);
        let lo = hi - 1;
        let dt = self.times[hi] - self.times[lo];
        let alpha = if dt > 1e-14 { (t - self.times[lo]) / dt } else { 0.0 };
        Ok(values[lo] + alpha * (values[hi] - values[lo]))
    }
}

/// Read a `.th` time series file.
///
/// # Example
///
/// ```ignore
/// use bctides::io::read_timeseries_file;
/// use std::path::Path;
///
/// let series = read_timeseries_file(Path::new("elev.th"))?;
/// let (t0, t1) = series.time_range();
/// println!("{} columns from {t0} to {t1} s", series.n_columns());
/// ```
pub fn read_timeseries_file(path: &Path) -> Result<UniformTimeSeries, TimeSeriesFileError> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?);
    }
    parse_lines(lines.iter().map(String::as_str))
}

/// Parse a time series from a string.
///
/// Same format as file, useful for testing or embedded data.
pub fn parse_timeseries(content: &str) -> Result<UniformTimeSeries, TimeSeriesFileError> {
    parse_lines(content.lines())
}

fn parse_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Result<UniformTimeSeries, TimeSeriesFileError> {
    let mut times = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for (line_num, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<f64> = line
            .split_whitespace()
            .map(|s| s.parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| TimeSeriesFileError::ParseError {
                line: line_num + 1,
                message: "Invalid number".into(),
            })?;
        if fields.len() < 2 {
            return Err(TimeSeriesFileError::ParseError {
                line: line_num + 1,
                message: "Expected: time value [value ...]".into(),
            });
        }
        if columns.is_empty() {
            columns = vec![Vec::new(); fields.len() - 1];
        } else if columns.len() != fields.len() - 1 {
            return Err(TimeSeriesFileError::ParseError {
                line: line_num + 1,
                message: format!("Expected {} values, found {}", columns.len(), fields.len() - 1),
            });
        }

        if let Some(&prev) = times.last() {
            if fields[0] <= prev {
                return Err(TimeSeriesFileError::NonMonotonic { line: line_num + 1 });
            }
        }
        times.push(fields[0]);
        for (column, &value) in columns.iter_mut().zip(&fields[1..]) {
            column.push(value);
        }
    }

    UniformTimeSeries::from_columns(times, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_multi_column() {
        let content = "# two boundaries\n0 0.1 1.0\n3600 0.3 2.0\n\n7200 0.2 3.0\n";
        let series = parse_timeseries(content).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.n_columns(), 2);
        assert_eq!(series.column(1).unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(series.time_range(), (0.0, 7200.0));
    }

    #[test]
    fn test_interpolate() {
        let series = parse_timeseries("0 0.0\n100 1.0\n").unwrap();
        assert!((series.interpolate(0, 25.0).unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(series.interpolate(0, -5.0).unwrap(), 0.0);
        assert_eq!(series.interpolate(0, 500.0).unwrap(), 1.0);
        assert!(matches!(
            series.interpolate(3, 0.0),
            Err(TimeSeriesFileError::MissingColumn { column: 3, available: 1 })
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_timeseries("# nothing\n"), Err(TimeSeriesFileError::EmptyFile)));
        assert!(matches!(
            parse_timeseries("0 1\n0 2\n"),
            Err(TimeSeriesFileError::NonMonotonic { line: 2 })
        ));
        assert!(matches!(
            parse_timeseries("0 1 2\n10 1\n"),
            Err(TimeSeriesFileError::ParseError { line: 2, .. })
        ));
        assert!(matches!(
            parse_timeseries("0 abc\n"),
            Err(TimeSeriesFileError::ParseError { line: 1, .. })
        ));
    }

    #[test]
    fn test_read_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0.0 35.0").unwrap();
        writeln!(file, "86400.0 34.0").unwrap();
        let series = read_timeseries_file(file.path()).unwrap();
        assert!((series.interpolate(0, 43200.0).unwrap() - 34.5).abs() < 1e-12);
    }
}
