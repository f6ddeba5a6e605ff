//! External gridded data source descriptions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{HorizontalMethod, VerticalMethod};
use crate::dataset::DataLocation;

/// Canonical quantity requested from a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceVariable {
    /// Sea surface elevation (m).
    Elevation,
    /// Eastward velocity (m/s).
    U,
    /// Northward velocity (m/s).
    V,
    /// Temperature (°C).
    Temperature,
    /// Salinity (PSU).
    Salinity,
}

impl SourceVariable {
    /// Lowercase label, as used in configuration keys.
    pub fn label(self) -> &'static str {
        match self {
            Self::Elevation => "elevation",
            Self::U => "u",
            Self::V => "v",
            Self::Temperature => "temperature",
            Self::Salinity => "salinity",
        }
    }

    /// True for quantities defined at every vertical level.
    pub fn is_three_dimensional(self) -> bool {
        !matches!(self, Self::Elevation)
    }
}

impl fmt::Display for SourceVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Names of the source's axes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateMapping {
    /// Time axis.
    pub time: String,
    /// Longitude axis.
    pub x: String,
    /// Latitude axis.
    pub y: String,
    /// Depth axis (positive down, metres).
    pub depth: String,
}

impl Default for CoordinateMapping {
    fn default() -> Self {
        Self {
            time: "time".into(),
            x: "lon".into(),
            y: "lat".into(),
            depth: "depth".into(),
        }
    }
}

/// A gridded, time-varying dataset plus how to read it.
///
/// ```
/// use bctides::dataset::DataLocation;
/// use bctides::sampling::{ExternalDataSource, HorizontalMethod, SourceVariable};
///
/// let source = ExternalDataSource::new(DataLocation::catalog("hycom"))
///     .with_axes("time", "longitude", "latitude", "depth")
///     .with_variable(SourceVariable::Temperature, "water_temp")
///     .with_horizontal(HorizontalMethod::Nearest);
///
/// assert_eq!(source.mapped_name(SourceVariable::Temperature), Some("water_temp"));
/// assert_eq!(source.mapped_name(SourceVariable::Salinity), None);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalDataSource {
    /// Where the dataset lives.
    pub location: DataLocation,
    /// Axis names.
    #[serde(default)]
    pub coordinates: CoordinateMapping,
    /// Canonical quantity → variable name in the dataset.
    #[serde(default)]
    pub variables: BTreeMap<SourceVariable, String>,
    /// Horizontal interpolation method.
    #[serde(default)]
    pub horizontal: HorizontalMethod,
    /// Vertical interpolation method.
    #[serde(default)]
    pub vertical: VerticalMethod,
}

impl ExternalDataSource {
    /// Source with default axis names and no variables mapped.
    pub fn new(location: DataLocation) -> Self {
        Self {
            location,
            coordinates: CoordinateMapping::default(),
            variables: BTreeMap::new(),
            horizontal: HorizontalMethod::default(),
            vertical: VerticalMethod::default(),
        }
    }

    /// Builder: map a canonical quantity to a dataset variable.
    pub fn with_variable(mut self, variable: SourceVariable, name: impl Into<String>) -> Self {
        self.variables.insert(variable, name.into());
        self
    }

    /// Builder: axis names.
    pub fn with_axes(
        mut self,
        time: impl Into<String>,
        x: impl Into<String>,
        y: impl Into<String>,
        depth: impl Into<String>,
    ) -> Self {
        self.coordinates = CoordinateMapping {
            time: time.into(),
            x: x.into(),
            y: y.into(),
            depth: depth.into(),
        };
        self
    }

    /// Builder: horizontal method.
    pub fn with_horizontal(mut self, method: HorizontalMethod) -> Self {
        self.horizontal = method;
        self
    }

    /// Builder: vertical method.
    pub fn with_vertical(mut self, method: VerticalMethod) -> Self {
        self.vertical = method;
        self
    }

    /// Dataset variable name for a canonical quantity.
    pub fn mapped_name(&self, variable: SourceVariable) -> Option<&str> {
        self.variables.get(&variable).map(String::as_str)
    }

    /// True if every listed quantity has a mapping.
    pub fn maps_all(&self, variables: &[SourceVariable]) -> bool {
        variables.iter().all(|v| self.variables.contains_key(v))
    }
}
