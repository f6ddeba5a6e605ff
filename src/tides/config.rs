//! Tidal forcing configuration shared by harmonic boundary segments.

use serde::{Deserialize, Serialize};

use super::{expand_constituents, Constituent, NodalPolicy};
use crate::dataset::DataLocation;
use crate::error::{BoundaryError, Result};

/// Placeholder substituted with the lowercase constituent name.
pub const CONSTITUENT_PLACEHOLDER: &str = "{constituent}";

/// Gridded amplitude/phase fields for one quantity.
///
/// Variable names are templates: `{constituent}` becomes the lowercase
/// constituent name, so `"{constituent}_amp"` resolves to `m2_amp`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtlasReference {
    /// Where the atlas lives.
    pub location: DataLocation,
    /// Longitude axis name.
    #[serde(default = "default_x")]
    pub x: String,
    /// Latitude axis name.
    #[serde(default = "default_y")]
    pub y: String,
    /// Amplitude variable template (m or m/s).
    #[serde(default = "default_amplitude")]
    pub amplitude: String,
    /// Greenwich phase lag variable template (degrees).
    #[serde(default = "default_phase")]
    pub phase: String,
}

fn default_x() -> String {
    "lon".into()
}

fn default_y() -> String {
    "lat".into()
}

fn default_amplitude() -> String {
    "{constituent}_amp".into()
}

fn default_phase() -> String {
    "{constituent}_pha".into()
}

impl AtlasReference {
    /// Reference with default axis and variable naming.
    pub fn new(location: DataLocation) -> Self {
        Self {
            location,
            x: default_x(),
            y: default_y(),
            amplitude: default_amplitude(),
            phase: default_phase(),
        }
    }

    /// Builder: override the amplitude/phase templates.
    pub fn with_templates(mut self, amplitude: impl Into<String>, phase: impl Into<String>) -> Self {
        self.amplitude = amplitude.into();
        self.phase = phase.into();
        self
    }

    /// Builder: override the axis names.
    pub fn with_axes(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x = x.into();
        self.y = y.into();
        self
    }

    /// Amplitude variable name for a constituent.
    pub fn amplitude_name(&self, c: Constituent) -> String {
        fill_template(&self.amplitude, c)
    }

    /// Phase variable name for a constituent.
    pub fn phase_name(&self, c: Constituent) -> String {
        fill_template(&self.phase, c)
    }
}

fn fill_template(template: &str, c: Constituent) -> String {
    template.replace(CONSTITUENT_PLACEHOLDER, &c.name().to_ascii_lowercase())
}

/// Tidal constituents, atlas identity and the atlas fields to read.
///
/// ```
/// use bctides::tides::TidalConfiguration;
///
/// let yaml = r#"
/// constituents: [major]
/// database: tpxo9
/// elevation:
///   location: { kind: file, path: /data/h_tpxo9.nc }
/// "#;
/// let tides: TidalConfiguration = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(tides.resolved_constituents().unwrap().len(), 8);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TidalConfiguration {
    /// Constituent names or presets (`major`, `minor`, `all`).
    pub constituents: Vec<String>,
    /// Atlas identifier (e.g. `tpxo9`, `fes2014`, `hamtide`).
    pub database: String,
    /// Elevation amplitude/phase atlas.
    #[serde(default)]
    pub elevation: Option<AtlasReference>,
    /// Eastward velocity atlas.
    #[serde(default)]
    pub velocity_u: Option<AtlasReference>,
    /// Northward velocity atlas.
    #[serde(default)]
    pub velocity_v: Option<AtlasReference>,
    /// Nodal correction policy.
    #[serde(default)]
    pub nodal: NodalPolicy,
}

impl TidalConfiguration {
    /// Configuration with no atlas references yet.
    pub fn new<S: Into<String>>(constituents: impl IntoIterator<Item = S>, database: impl Into<String>) -> Self {
        Self {
            constituents: constituents.into_iter().map(Into::into).collect(),
            database: database.into(),
            elevation: None,
            velocity_u: None,
            velocity_v: None,
            nodal: NodalPolicy::default(),
        }
    }

    /// Builder: elevation atlas.
    pub fn with_elevation(mut self, atlas: AtlasReference) -> Self {
        self.elevation = Some(atlas);
        self
    }

    /// Builder: velocity component atlases.
    pub fn with_velocity(mut self, u: AtlasReference, v: AtlasReference) -> Self {
        self.velocity_u = Some(u);
        self.velocity_v = Some(v);
        self
    }

    /// Builder: nodal policy.
    pub fn with_nodal(mut self, nodal: NodalPolicy) -> Self {
        self.nodal = nodal;
        self
    }

    /// Expanded, de-duplicated constituent list.
    pub fn resolved_constituents(&self) -> Result<Vec<Constituent>> {
        expand_constituents(&self.constituents)
    }

    /// Check the configuration can serve the requested components.
    pub fn validate(&self, needs_elevation: bool, needs_velocity: bool) -> Result<()> {
        self.resolved_constituents()?;
        if needs_elevation && self.elevation.is_none() {
            return Err(BoundaryError::missing(None, "tides.elevation"));
        }
        if needs_velocity {
            if self.velocity_u.is_none() {
                return Err(BoundaryError::missing(None, "tides.velocity_u"));
            }
            if self.velocity_v.is_none() {
                return Err(BoundaryError::missing(None, "tides.velocity_v"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates() {
        let atlas = AtlasReference::new(DataLocation::catalog("tpxo"));
        assert_eq!(atlas.amplitude_name(Constituent::M2), "m2_amp");
        assert_eq!(atlas.phase_name(Constituent::TwoN2), "2n2_pha");
        let atlas = atlas.with_templates("ha_{constituent}", "hp_{constituent}");
        assert_eq!(atlas.amplitude_name(Constituent::K1), "ha_k1");
    }

    #[test]
    fn test_validate_requires_atlases() {
        let tides = TidalConfiguration::new(["M2"], "tpxo9");
        assert!(tides.validate(false, false).is_ok());
        assert!(tides.validate(true, false).is_err());
        let tides = tides.with_elevation(AtlasReference::new(DataLocation::catalog("h")));
        assert!(tides.validate(true, false).is_ok());
        let err = tides.validate(true, true).unwrap_err();
        assert!(err.to_string().contains("tides.velocity_u"));
    }

    #[test]
    fn test_unknown_constituent_rejected() {
        let tides = TidalConfiguration::new(["M2", "XX"], "tpxo9");
        assert!(tides.validate(false, false).is_err());
    }

    #[test]
    fn test_yaml_defaults() {
        let yaml = "constituents: [M2, S2]\ndatabase: fes2014\nnodal: disabled\n";
        let tides: TidalConfiguration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(tides.nodal, NodalPolicy::Disabled);
        assert!(tides.elevation.is_none());
    }
}
