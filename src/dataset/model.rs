//! In-memory gridded dataset with named axes.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use super::DatasetError;

/// Values along one named axis.
#[derive(Clone, Debug, PartialEq)]
pub enum Coordinate {
    /// Plain numeric axis (longitude, latitude, depth, projected x/y).
    Numeric(Vec<f64>),
    /// Time axis.
    Time(Vec<DateTime<Utc>>),
}

impl Coordinate {
    /// Number of points along the axis.
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Time(v) => v.len(),
        }
    }

    /// True if the axis has no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A data variable stored row-major over its dimensions.
///
/// Fill values are replaced by NaN on construction, so downstream code
/// only has to test `is_nan()`.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    dims: Vec<String>,
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Variable {
    /// Dimension names, slowest varying first.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// Length of each dimension.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Raw row-major values (NaN where masked).
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Position of a named dimension.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Value at a multi-index, NaN if masked or out of bounds.
    pub fn value(&self, index: &[usize]) -> f64 {
        if index.len() != self.shape.len() {
            return f64::NAN;
        }
        let mut flat = 0;
        for (&i, &n) in index.iter().zip(&self.shape) {
            if i >= n {
                return f64::NAN;
            }
            flat = flat * n + i;
        }
        self.data.get(flat).copied().unwrap_or(f64::NAN)
    }
}

/// Gridded dataset: named coordinate axes plus variables defined on them.
///
/// # Example
///
/// ```
/// use bctides::dataset::Dataset;
///
/// let ds = Dataset::new("demo")
///     .with_coordinate("lon", vec![0.0, 1.0])
///     .with_coordinate("lat", vec![50.0, 51.0])
///     .with_variable("ssh", &["lat", "lon"], vec![0.1, 0.2, 0.3, 0.4])
///     .unwrap();
///
/// assert_eq!(ds.variable("ssh").unwrap().value(&[1, 0]), 0.3);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    name: String,
    coordinates: BTreeMap<String, Coordinate>,
    variables: BTreeMap<String, Variable>,
}

impl Dataset {
    /// Empty dataset with a label used in diagnostics.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Label used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builder: add a numeric axis.
    pub fn with_coordinate(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.coordinates
            .insert(name.into(), Coordinate::Numeric(values));
        self
    }

    /// Builder: add a time axis.
    pub fn with_time_coordinate(
        mut self,
        name: impl Into<String>,
        values: Vec<DateTime<Utc>>,
    ) -> Self {
        self.coordinates.insert(name.into(), Coordinate::Time(values));
        self
    }

    /// Builder: add a variable over existing axes.
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        dims: &[&str],
        data: Vec<f64>,
    ) -> Result<Self, DatasetError> {
        self.insert_variable(name, dims, data, None)?;
        Ok(self)
    }

    /// Add a variable, masking `fill_value` entries.
    pub fn insert_variable(
        &mut self,
        name: impl Into<String>,
        dims: &[&str],
        mut data: Vec<f64>,
        fill_value: Option<f64>,
    ) -> Result<(), DatasetError> {
        let name = name.into();
        let mut shape = Vec::with_capacity(dims.len());
        for dim in dims {
            let axis = self
                .coordinates
                .get(*dim)
                .ok_or_else(|| DatasetError::UnknownDimension {
                    variable: name.clone(),
                    dimension: dim.to_string(),
                })?;
            shape.push(axis.len());
        }
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(DatasetError::ShapeMismatch {
                variable: name,
                expected,
                actual: data.len(),
            });
        }
        if let Some(fill) = fill_value {
            for v in data.iter_mut().filter(|v| **v == fill) {
                *v = f64::NAN;
            }
        }
        self.variables.insert(
            name,
            Variable {
                dims: dims.iter().map(|d| d.to_string()).collect(),
                shape,
                data,
            },
        );
        Ok(())
    }

    /// Look up a variable.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Variable names in sorted order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Look up any axis.
    pub fn coordinate(&self, name: &str) -> Option<&Coordinate> {
        self.coordinates.get(name)
    }

    /// A numeric axis by name.
    pub fn numeric_axis(&self, name: &str) -> Result<&[f64], DatasetError> {
        match self.coordinates.get(name) {
            Some(Coordinate::Numeric(values)) => Ok(values),
            Some(Coordinate::Time(_)) => Err(DatasetError::Invalid(format!(
                "axis `{name}` of `{}` is a time axis, expected numeric",
                self.name
            ))),
            None => Err(self.missing_coordinate(name)),
        }
    }

    /// A time axis by name.
    pub fn time_axis(&self, name: &str) -> Result<&[DateTime<Utc>], DatasetError> {
        match self.coordinates.get(name) {
            Some(Coordinate::Time(values)) => Ok(values),
            Some(Coordinate::Numeric(_)) => Err(DatasetError::Invalid(format!(
                "axis `{name}` of `{}` is numeric, expected time",
                self.name
            ))),
            None => Err(self.missing_coordinate(name)),
        }
    }

    fn missing_coordinate(&self, name: &str) -> DatasetError {
        DatasetError::MissingCoordinate {
            dataset: self.name.clone(),
            name: name.to_string(),
        }
    }
}

/// CF-style `"<unit> since <epoch>"` time encoding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CfTimeUnits {
    seconds_per_unit: f64,
    epoch: DateTime<Utc>,
}

impl CfTimeUnits {
    /// Parse a units attribute such as `hours since 2023-01-01 00:00:00`.
    pub fn parse(units: &str) -> Result<Self, DatasetError> {
        let invalid = || DatasetError::Invalid(format!("unrecognised time units `{units}`"));
        let (unit, epoch) = units.split_once(" since ").ok_or_else(invalid)?;
        let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "s" => 1.0,
            "minutes" | "minute" | "mins" | "min" => 60.0,
            "hours" | "hour" | "hrs" | "h" => 3_600.0,
            "days" | "day" | "d" => 86_400.0,
            _ => return Err(invalid()),
        };
        let epoch = parse_epoch(epoch.trim()).ok_or_else(invalid)?;
        Ok(Self {
            seconds_per_unit,
            epoch,
        })
    }

    /// Convert an encoded value to a timestamp.
    pub fn to_datetime(&self, value: f64) -> DateTime<Utc> {
        let millis = (value * self.seconds_per_unit * 1000.0).round() as i64;
        self.epoch + Duration::milliseconds(millis)
    }
}

fn parse_epoch(text: &str) -> Option<DateTime<Utc>> {
    let text = text
        .trim_end_matches('Z')
        .trim_end_matches(" UTC")
        .trim_end_matches("+00:00")
        .trim();
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}
