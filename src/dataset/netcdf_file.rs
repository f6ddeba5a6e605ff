//! NetCDF file provider.
//!
//! Every one-dimensional variable named after its own dimension becomes
//! an axis; an axis whose `units` attribute reads `<unit> since <epoch>`
//! becomes a time axis. All other variables are read as f64 with
//! `scale_factor` / `add_offset` unpacking and `_FillValue` masking.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{CatalogProvider, CfTimeUnits, DataLocation, Dataset, DatasetError, DatasetProvider};

/// Reads datasets from NetCDF files, caching each path once opened.
#[derive(Debug, Default)]
pub struct NetcdfProvider {
    cache: Mutex<BTreeMap<PathBuf, Arc<Dataset>>>,
    catalog: CatalogProvider,
}

impl NetcdfProvider {
    /// Provider with an empty cache and no catalog entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: serve catalog locations from `catalog`.
    pub fn with_catalog(mut self, catalog: CatalogProvider) -> Self {
        self.catalog = catalog;
        self
    }

    /// Load a file without touching the cache.
    pub fn load(path: &Path) -> Result<Dataset, DatasetError> {
        let file = netcdf::open(path)?;
        let mut dataset = Dataset::new(path.display().to_string());

        let mut axes = Vec::new();
        for var in file.variables() {
            let dims = var.dimensions();
            if dims.len() == 1 && dims[0].name() == var.name() {
                let values: Vec<f64> = var.get_values(..)?;
                let units = attr_string(&var, "units");
                match units.as_deref().map(CfTimeUnits::parse) {
                    Some(Ok(time_units)) => {
                        let times = values.iter().map(|&v| time_units.to_datetime(v)).collect();
                        dataset = dataset.with_time_coordinate(var.name(), times);
                    }
                    _ => dataset = dataset.with_coordinate(var.name(), values),
                }
                axes.push(var.name());
            }
        }
        // Dimensions without a coordinate variable get an index axis.
        for dim in file.dimensions() {
            if dataset.coordinate(&dim.name()).is_none() {
                let index = (0..dim.len()).map(|i| i as f64).collect();
                dataset = dataset.with_coordinate(dim.name(), index);
            }
        }

        for var in file.variables() {
            let name = var.name();
            if axes.contains(&name) {
                continue;
            }
            let dim_names: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
            let dims: Vec<&str> = dim_names.iter().map(String::as_str).collect();
            let scale = attr_f64(&var, "scale_factor").unwrap_or(1.0);
            let offset = attr_f64(&var, "add_offset").unwrap_or(0.0);
            let fill = attr_f64(&var, "_FillValue").or_else(|| attr_f64(&var, "missing_value"));

            let Ok(raw) = var.get_values::<f64, _>(..) else {
                tracing::debug!(variable = %name, "skipping non-numeric variable");
                continue;
            };
            let data = raw
                .into_iter()
                .map(|v| {
                    if fill.is_some_and(|f| v == f) || !v.is_finite() || v.abs() > 1e30 {
                        f64::NAN
                    } else {
                        v * scale + offset
                    }
                })
                .collect();
            dataset.insert_variable(name, &dims, data, None)?;
        }

        tracing::debug!(path = %path.display(), "loaded NetCDF dataset");
        Ok(dataset)
    }
}

impl NetcdfProvider {
    fn cached(&self, path: &Path) -> Result<Option<Arc<Dataset>>, DatasetError> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| DatasetError::Invalid("dataset cache poisoned".into()))?;
        Ok(cache.get(path).cloned())
    }

    /// Number of files currently cached.
    pub fn cached_files(&self) -> usize {
        self.cache.lock().map_or(0, |cache| cache.len())
    }
}

impl DatasetProvider for NetcdfProvider {
    fn open(&self, location: &DataLocation) -> Result<Arc<Dataset>, DatasetError> {
        let path = match location {
            DataLocation::File { path } => path,
            DataLocation::Catalog { .. } => return self.catalog.open(location),
        };
        if let Some(dataset) = self.cached(path)? {
            return Ok(dataset);
        }
        if !path.exists() {
            return Err(DatasetError::NotFound {
                location: location.to_string(),
            });
        }

        // Load without holding the lock; a concurrent load of the same path
        // loses to whichever insert lands first.
        let loaded = Arc::new(Self::load(path)?);
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| DatasetError::Invalid("dataset cache poisoned".into()))?;
        Ok(Arc::clone(cache.entry(path.clone()).or_insert(loaded)))
    }
}

fn attr_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Double(d) => Some(d),
            netcdf::AttributeValue::Float(f) => Some(f as f64),
            netcdf::AttributeValue::Short(s) => Some(s as f64),
            netcdf::AttributeValue::Int(i) => Some(i as f64),
            _ => None,
        })
}

fn attr_string(var: &netcdf::Variable, name: &str) -> Option<String> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Str(s) => Some(s),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_not_found() {
        let provider = NetcdfProvider::new();
        let err = provider
            .open(&DataLocation::file("/nonexistent/forcing.nc"))
            .unwrap_err();
        assert!(matches!(err, DatasetError::NotFound { .. }));
    }

    fn write_axis_file(path: &Path) {
        let mut file = netcdf::create(path).unwrap();
        file.add_dimension("lon", 3).unwrap();
        {
            let mut lon = file.add_variable::<f64>("lon", &["lon"]).unwrap();
            lon.put_values(&[0.0, 1.0, 2.0], ..).unwrap();
        }
        let mut ssh = file.add_variable::<f64>("ssh", &["lon"]).unwrap();
        ssh.put_values(&[0.1, 0.2, 0.3], ..).unwrap();
    }

    #[test]
    fn test_concurrent_opens_share_one_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ssh.nc");
        write_axis_file(&path);

        let provider = NetcdfProvider::new();
        let location = DataLocation::file(&path);
        let opened: Vec<Arc<Dataset>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| provider.open(&location).unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(opened.iter().all(|d| Arc::ptr_eq(d, &opened[0])));
        assert_eq!(provider.cached_files(), 1);
        assert_eq!(opened[0].numeric_axis("lon").unwrap(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_catalog_passthrough() {
        let provider = NetcdfProvider::new()
            .with_catalog(CatalogProvider::new().with_entry("x", Dataset::new("x")));
        assert!(provider.open(&DataLocation::catalog("x")).is_ok());
    }
}
