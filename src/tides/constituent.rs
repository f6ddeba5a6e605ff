//! Tidal constituent catalogue.
//!
//! | Group | Constituents | Period |
//! |-------|--------------|--------|
//! | Semidiurnal | M2, S2, N2, K2, 2N2 | ~12 h |
//! | Diurnal | K1, O1, P1, Q1 | ~24 h |
//! | Long period | Mf, Mm | 14 / 27 days |
//! | Shallow water | M4, MS4, MN4 | ~6 h |
//!
//! Names are matched case-insensitively. The preset names `major`,
//! `minor` and `all` expand to groups of constituents.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BoundaryError;

/// A supported tidal constituent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Constituent {
    M2,
    S2,
    N2,
    K2,
    K1,
    O1,
    P1,
    Q1,
    Mf,
    Mm,
    M4,
    MS4,
    MN4,
    /// Second-order lunar elliptic semidiurnal.
    TwoN2,
}

impl Constituent {
    /// Every supported constituent.
    pub const ALL: [Constituent; 14] = [
        Self::Q1,
        Self::O1,
        Self::P1,
        Self::K1,
        Self::N2,
        Self::M2,
        Self::S2,
        Self::K2,
        Self::Mm,
        Self::Mf,
        Self::M4,
        Self::MN4,
        Self::MS4,
        Self::TwoN2,
    ];

    /// Principal diurnal and semidiurnal constituents.
    pub const MAJOR: [Constituent; 8] = [
        Self::Q1,
        Self::O1,
        Self::P1,
        Self::K1,
        Self::N2,
        Self::M2,
        Self::S2,
        Self::K2,
    ];

    /// Long-period, shallow-water and second-order constituents.
    pub const MINOR: [Constituent; 6] = [
        Self::Mm,
        Self::Mf,
        Self::M4,
        Self::MN4,
        Self::MS4,
        Self::TwoN2,
    ];

    /// Conventional name.
    pub fn name(self) -> &'static str {
        match self {
            Self::M2 => "M2",
            Self::S2 => "S2",
            Self::N2 => "N2",
            Self::K2 => "K2",
            Self::K1 => "K1",
            Self::O1 => "O1",
            Self::P1 => "P1",
            Self::Q1 => "Q1",
            Self::Mf => "Mf",
            Self::Mm => "Mm",
            Self::M4 => "M4",
            Self::MS4 => "MS4",
            Self::MN4 => "MN4",
            Self::TwoN2 => "2N2",
        }
    }

    /// Case-insensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|c| c.name().to_ascii_uppercase() == upper)
    }

    /// Angular speed in degrees per hour.
    pub fn speed_deg_per_hour(self) -> f64 {
        match self {
            Self::M2 => 28.984_104_2,
            Self::S2 => 30.0,
            Self::N2 => 28.439_729_5,
            Self::K2 => 30.082_137_3,
            Self::K1 => 15.041_068_6,
            Self::O1 => 13.943_035_6,
            Self::P1 => 14.958_931_4,
            Self::Q1 => 13.398_660_9,
            Self::Mf => 1.098_033_1,
            Self::Mm => 0.544_374_7,
            Self::M4 => 57.968_208_4,
            Self::MS4 => 58.984_104_2,
            Self::MN4 => 57.423_833_7,
            Self::TwoN2 => 27.895_354_8,
        }
    }

    /// Angular frequency ω in rad/s.
    pub fn omega(self) -> f64 {
        self.speed_deg_per_hour().to_radians() / 3600.0
    }

    /// Period in seconds.
    pub fn period(self) -> f64 {
        2.0 * PI / self.omega()
    }
}

impl fmt::Display for Constituent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Constituent {
    type Err = BoundaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            BoundaryError::configuration(None, "tides.constituents", format!("unknown tidal constituent `{s}`"))
        })
    }
}

impl TryFrom<String> for Constituent {
    type Error = BoundaryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Constituent> for String {
    fn from(c: Constituent) -> Self {
        c.name().to_string()
    }
}

/// Expand a list of names and presets into constituents.
///
/// Order of first appearance is kept, duplicates are dropped.
///
/// ```
/// use bctides::tides::{expand_constituents, Constituent};
///
/// let list = expand_constituents(&["m2".to_string(), "major".to_string()]).unwrap();
/// assert_eq!(list[0], Constituent::M2);
/// assert_eq!(list.len(), 8);
/// ```
pub fn expand_constituents(names: &[String]) -> Result<Vec<Constituent>, BoundaryError> {
    let mut out: Vec<Constituent> = Vec::new();
    for name in names {
        let group: Vec<Constituent> = match name.trim().to_ascii_lowercase().as_str() {
            "all" => Constituent::ALL.to_vec(),
            "major" => Constituent::MAJOR.to_vec(),
            "minor" => Constituent::MINOR.to_vec(),
            _ => vec![name.parse()?],
        };
        for c in group {
            if !out.contains(&c) {
                out.push(c);
            }
        }
    }
    if out.is_empty() {
        return Err(BoundaryError::configuration(
            None,
            "tides.constituents",
            "no tidal constituents selected",
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periods() {
        let m2_hours = Constituent::M2.period() / 3600.0;
        assert!((m2_hours - 12.4206012).abs() < 1e-5);
        let s2_hours = Constituent::S2.period() / 3600.0;
        assert!((s2_hours - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_compound_speeds() {
        let m2 = Constituent::M2.speed_deg_per_hour();
        let s2 = Constituent::S2.speed_deg_per_hour();
        let n2 = Constituent::N2.speed_deg_per_hour();
        assert!((Constituent::M4.speed_deg_per_hour() - 2.0 * m2).abs() < 1e-6);
        assert!((Constituent::MS4.speed_deg_per_hour() - (m2 + s2)).abs() < 1e-6);
        assert!((Constituent::MN4.speed_deg_per_hour() - (m2 + n2)).abs() < 1e-6);
    }

    #[test]
    fn test_names_case_insensitive() {
        assert_eq!(Constituent::from_name("mf"), Some(Constituent::Mf));
        assert_eq!(Constituent::from_name("2n2"), Some(Constituent::TwoN2));
        assert_eq!(Constituent::from_name("SA"), None);
    }

    #[test]
    fn test_expand_presets() {
        let all = expand_constituents(&["all".to_string()]).unwrap();
        assert_eq!(all.len(), 14);
        let minor = expand_constituents(&["minor".to_string(), "M4".to_string()]).unwrap();
        assert_eq!(minor.len(), 6);
        assert!(expand_constituents(&["Z9".to_string()]).is_err());
        assert!(expand_constituents(&[]).is_err());
    }

    #[test]
    fn test_serde_names() {
        let c: Constituent = serde_yaml::from_str("2N2").unwrap();
        assert_eq!(c, Constituent::TwoN2);
        assert_eq!(serde_yaml::to_string(&Constituent::Mf).unwrap().trim(), "Mf");
    }
}
