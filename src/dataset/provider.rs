//! Resolving a [`DataLocation`] to a loaded [`Dataset`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Dataset, DatasetError};

/// Where a gridded dataset lives.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DataLocation {
    /// A file on disk (NetCDF).
    File {
        /// Path to the file.
        path: PathBuf,
    },
    /// A named entry of a pre-loaded catalog.
    Catalog {
        /// Entry name.
        entry: String,
    },
}

impl DataLocation {
    /// File location.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Catalog location.
    pub fn catalog(entry: impl Into<String>) -> Self {
        Self::Catalog {
            entry: entry.into(),
        }
    }
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path } => write!(f, "file:{}", path.display()),
            Self::Catalog { entry } => write!(f, "catalog:{entry}"),
        }
    }
}

/// Dataset access layer.
///
/// Implementations may cache: several boundary specs commonly reference
/// the same physical file.
pub trait DatasetProvider: Send + Sync {
    /// Open (or fetch from cache) the dataset at `location`.
    fn open(&self, location: &DataLocation) -> Result<Arc<Dataset>, DatasetError>;
}

/// Provider backed by datasets already in memory.
///
/// Catalog entries are looked up by name; file locations resolve if a
/// dataset was registered under that exact path.
///
/// # Example
///
/// ```
/// use bctides::dataset::{CatalogProvider, DataLocation, Dataset, DatasetProvider};
///
/// let catalog = CatalogProvider::new()
///     .with_entry("hycom", Dataset::new("hycom").with_coordinate("lon", vec![0.0]));
///
/// let ds = catalog.open(&DataLocation::catalog("hycom")).unwrap();
/// assert_eq!(ds.name(), "hycom");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CatalogProvider {
    entries: BTreeMap<DataLocation, Arc<Dataset>>,
}

impl CatalogProvider {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset under a catalog entry name.
    pub fn insert(&mut self, entry: impl Into<String>, dataset: Dataset) {
        self.entries
            .insert(DataLocation::catalog(entry), Arc::new(dataset));
    }

    /// Register a pre-loaded dataset under a file path.
    pub fn insert_file(&mut self, path: impl Into<PathBuf>, dataset: Dataset) {
        self.entries
            .insert(DataLocation::file(path), Arc::new(dataset));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_entry(mut self, entry: impl Into<String>, dataset: Dataset) -> Self {
        self.insert(entry, dataset);
        self
    }

    /// Number of registered datasets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DatasetProvider for CatalogProvider {
    fn open(&self, location: &DataLocation) -> Result<Arc<Dataset>, DatasetError> {
        self.entries
            .get(location)
            .cloned()
            .ok_or_else(|| DatasetError::NotFound {
                location: location.to_string(),
            })
    }
}
