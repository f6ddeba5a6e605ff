//! Reader for tidal constituent tables.
//!
//! A table lists spatially uniform harmonic constants (amplitude and
//! Greenwich phase lag) for one site. It can stand in for a gridded atlas
//! on small domains via [`ConstituentTable::to_atlas_dataset`].
//!
//! # File Format
//!
//! ```text
//! # Tidal constituents for Bergen
//! # location: 5.32 60.39
//! # reference_level: 0.0
//! # columns: name amplitude(m) phase(deg)
//! M2 0.45 125.3
//! S2 0.15 158.7
//! K1 0.08 45.2
//! O1 0.06 67.8
//! N2 0.09 112.4
//! ```
//!
//! Lines starting with `#` are comments. Metadata can be specified
//! in comments with `key: value` format.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::dataset::{Dataset, DatasetError};
use crate::tides::{AtlasReference, Constituent};

/// Error type for constituent file parsing.
#[derive(Debug, Error)]
pub enum ConstituentFileError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Parse error with line number
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Unknown constituent name
    #[error("Unknown constituent: {0}")]
    UnknownConstituent(String),

    /// Same constituent listed twice
    #[error("Duplicate constituent {0}")]
    Duplicate(Constituent),
}

/// A single tidal constituent entry from a file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstituentEntry {
    /// Constituent
    pub constituent: Constituent,
    /// Amplitude (m, or m/s for velocity tables)
    pub amplitude: f64,
    /// Greenwich phase lag in degrees
    pub phase_degrees: f64,
}

/// Full constituent table including metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstituentTable {
    /// Optional site location (lon, lat)
    pub location: Option<(f64, f64)>,
    /// Reference level for elevations (mean sea level)
    pub reference_level: f64,
    /// Entries in file order
    pub entries: Vec<ConstituentEntry>,
}

impl ConstituentTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of constituents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry.
    pub fn get(&self, constituent: Constituent) -> Option<&ConstituentEntry> {
        self.entries.iter().find(|e| e.constituent == constituent)
    }

    /// Constituents in file order.
    pub fn constituents(&self) -> Vec<Constituent> {
        self.entries.iter().map(|e| e.constituent).collect()
    }

    /// Spatially uniform atlas holding these constants.
    ///
    /// The atlas spans the whole globe on a 2 × 2 grid so every boundary
    /// node is covered. Variable and axis names follow `atlas`, so the same
    /// reference can be handed to the resolver.
    pub fn to_atlas_dataset(&self, name: &str, atlas: &AtlasReference) -> Result<Dataset, DatasetError> {
        let mut dataset = Dataset::new(name)
            .with_coordinate(atlas.x.clone(), vec![-180.0, 180.0])
            .with_coordinate(atlas.y.clone(), vec![-90.0, 90.0]);
        let dims = [atlas.y.as_str(), atlas.x.as_str()];
        for entry in &self.entries {
            dataset.insert_variable(
                atlas.amplitude_name(entry.constituent),
                &dims,
                vec![entry.amplitude; 4],
                None,
            )?;
            dataset.insert_variable(
                atlas.phase_name(entry.constituent),
                &dims,
                vec![entry.phase_degrees.rem_euclid(360.0); 4],
                None,
            )?;
        }
        Ok(dataset)
    }
}

/// Read a tidal constituent file.
///
/// # Example
///
/// ```ignore
/// use bctides::io::read_constituent_file;
/// use std::path::Path;
///
/// let table = read_constituent_file(Path::new("tides.txt"))?;
/// println!("Loaded {} constituents", table.len());
/// ```
pub fn read_constituent_file(path: &Path) -> Result<ConstituentTable, ConstituentFileError> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?);
    }
    parse_lines(lines.iter().map(String::as_str))
}

/// Parse constituent data from a string.
pub fn parse_constituents(content: &str) -> Result<ConstituentTable, ConstituentFileError> {
    parse_lines(content.lines())
}

fn parse_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Result<ConstituentTable, ConstituentFileError> {
    let mut table = ConstituentTable::new();

    for (line_num, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            parse_metadata(comment.trim(), line_num + 1, &mut table)?;
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            return Err(ConstituentFileError::ParseError {
                line: line_num + 1,
                message: "Expected: name amplitude phase".into(),
            });
        }

        let constituent = Constituent::from_name(parts[0])
            .ok_or_else(|| ConstituentFileError::UnknownConstituent(parts[0].to_string()))?;
        let number = |s: &str, what: &str| {
            s.parse::<f64>().map_err(|_| ConstituentFileError::ParseError {
                line: line_num + 1,
                message: format!("Invalid {what}"),
            })
        };
        let amplitude = number(parts[1], "amplitude")?;
        let phase_degrees = number(parts[2], "phase")?;
        if amplitude < 0.0 {
            return Err(ConstituentFileError::ParseError {
                line: line_num + 1,
                message: "Amplitude must be non-negative".into(),
            });
        }
        if table.get(constituent).is_some() {
            return Err(ConstituentFileError::Duplicate(constituent));
        }

        table.entries.push(ConstituentEntry {
            constituent,
            amplitude,
            phase_degrees,
        });
    }

    Ok(table)
}

fn parse_metadata(comment: &str, line: usize, table: &mut ConstituentTable) -> Result<(), ConstituentFileError> {
    let Some((key, value)) = comment.split_once(':') else {
        return Ok(());
    };
    let invalid = |message: &str| ConstituentFileError::ParseError {
        line,
        message: message.into(),
    };
    match key.trim().to_ascii_lowercase().as_str() {
        "location" => {
            let coords: Vec<f64> = value
                .split_whitespace()
                .map(str::parse)
                .collect::<Result<_, _>>()
                .map_err(|_| invalid("Invalid location"))?;
            if coords.len() != 2 {
                return Err(invalid("Location needs lon and lat"));
            }
            table.location = Some((coords[0], coords[1]));
        }
        "reference_level" => {
            table.reference_level = value
                .trim()
                .parse()
                .map_err(|_| invalid("Invalid reference level"))?;
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataLocation;
    use std::io::Write;

    const BERGEN: &str = "\
# Tidal constituents for Bergen
# location: 5.32 60.39
# reference_level: 0.1
# columns: name amplitude(m) phase(deg)
M2 0.45 125.3
s2 0.15 158.7
K1 0.08 -45.0
";

    #[test]
    fn test_parse_with_metadata() {
        let table = parse_constituents(BERGEN).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.location, Some((5.32, 60.39)));
        assert!((table.reference_level - 0.1).abs() < 1e-12);
        assert_eq!(
            table.constituents(),
            vec![Constituent::M2, Constituent::S2, Constituent::K1]
        );
        assert!((table.get(Constituent::S2).unwrap().amplitude - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_constituents("XX9 1.0 0.0\n"),
            Err(ConstituentFileError::UnknownConstituent(name)) if name == "XX9"
        ));
        assert!(matches!(
            parse_constituents("M2 1.0\n"),
            Err(ConstituentFileError::ParseError { line: 1, .. })
        ));
        assert!(matches!(
            parse_constituents("M2 1.0 0\nM2 2.0 0\n"),
            Err(ConstituentFileError::Duplicate(Constituent::M2))
        ));
        assert!(matches!(
            parse_constituents("M2 -1.0 0\n"),
            Err(ConstituentFileError::ParseError { .. })
        ));
    }

    #[test]
    fn test_atlas_dataset() {
        let table = parse_constituents(BERGEN).unwrap();
        let atlas = AtlasReference::new(DataLocation::catalog("bergen"));
        let dataset = table.to_atlas_dataset("bergen", &atlas).unwrap();
        let amp = dataset.variable("m2_amp").unwrap();
        assert_eq!(amp.shape(), &[2, 2]);
        assert!(amp.data().iter().all(|&a| (a - 0.45).abs() < 1e-12));
        let pha = dataset.variable("k1_pha").unwrap();
        assert!((pha.data()[0] - 315.0).abs() < 1e-12);
    }

    #[test]
    fn test_read_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{BERGEN}").unwrap();
        let table = read_constituent_file(file.path()).unwrap();
        assert_eq!(table.len(), 3);
    }
}
