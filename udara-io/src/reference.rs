use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use log::{info, warn};
use serde::Deserialize;
use udara_core::{DatasetSource, ModelConfig, ModelError, ReferenceDataset};

use crate::error::IoError;

/// On-disk JSON bundle: `{"x": [[f64; 6], ...], "y": [label, ...]}`.
#[derive(Deserialize)]
struct ReferenceBundle {
    x: Vec<Vec<f64>>,
    y: Vec<f64>,
}

/// Reference tables stored as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonDatasetSource {
    path: PathBuf,
}

impl JsonDatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read(&self) -> Result<ReferenceDataset, IoError> {
        let file = File::open(&self.path).map_err(|e| IoError::open(&self.path, e))?;
        let bundle: ReferenceBundle = serde_json::from_reader(BufReader::new(file))?;
        Ok(ReferenceDataset::from_tables(bundle.x.as_slice(), &bundle.y)?)
    }
}

impl DatasetSource for JsonDatasetSource {
    fn load(&self) -> Result<ReferenceDataset, ModelError> {
        self.read().map_err(into_load_error)
    }

    fn describe(&self) -> String {
        format!("reference bundle {}", self.path.display())
    }
}

/// Reference tables stored as two headerless delimited files: one feature
/// row per line, and one label per line (the `numpy.savetxt` layout).
///
/// The delimiter defaults to `,`. Files written by `savetxt` with its
/// default separator need `with_delimiter(b' ')`.
#[derive(Debug, Clone)]
pub struct CsvDatasetSource {
    x_path: PathBuf,
    y_path: PathBuf,
    delimiter: u8,
}

impl CsvDatasetSource {
    pub fn new(x_path: impl Into<PathBuf>, y_path: impl Into<PathBuf>) -> Self {
        Self {
            x_path: x_path.into(),
            y_path: y_path.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn read_table(&self, path: &Path) -> Result<Vec<Vec<f64>>, IoError> {
        let file = File::open(path).map_err(|e| IoError::open(path, e))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let mut rows = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let values = record
                .iter()
                .enumerate()
                .filter(|(_, field)| !field.is_empty())
                .map(|(col, field)| {
                    field.parse::<f64>().map_err(|_| IoError::ParseValue {
                        row,
                        column: col.to_string(),
                        value: field.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if values.is_empty() {
                continue;
            }
            rows.push(values);
        }
        Ok(rows)
    }

    pub fn read(&self) -> Result<ReferenceDataset, IoError> {
        let x = self.read_table(&self.x_path)?;
        let y = self
            .read_table(&self.y_path)?
            .into_iter()
            .enumerate()
            .map(|(row, values)| match values.as_slice() {
                [label] => Ok(*label),
                _ => Err(IoError::Model(ModelError::data_load(format!(
                    "label row {} of {} has {} columns, expected 1",
                    row,
                    self.y_path.display(),
                    values.len()
                )))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReferenceDataset::from_tables(x.as_slice(), &y)?)
    }
}

impl DatasetSource for CsvDatasetSource {
    fn load(&self) -> Result<ReferenceDataset, ModelError> {
        self.read().map_err(into_load_error)
    }

    fn describe(&self) -> String {
        format!("reference tables {} / {}", self.x_path.display(), self.y_path.display())
    }
}

/// Picks the loader for whatever the command line pointed at. A JSON
/// bundle wins over a table pair when both are given.
pub fn open_source(
    bundle: Option<&Path>,
    tables: Option<(&Path, &Path)>,
    delimiter: u8,
) -> Result<Box<dyn DatasetSource + Send + Sync>, IoError> {
    match (bundle, tables) {
        (Some(path), _) => Ok(Box::new(JsonDatasetSource::new(path))),
        (None, Some((x, y))) => Ok(Box::new(CsvDatasetSource::new(x, y).with_delimiter(delimiter))),
        (None, None) => Err(IoError::NoReference),
    }
}

fn into_load_error(err: IoError) -> ModelError {
    match err {
        IoError::Model(inner) => inner,
        other => ModelError::DataLoad(other.to_string()),
    }
}

/// Reads a `ModelConfig` from JSON. Missing fields keep their defaults;
/// no path means the defaults as a whole.
pub fn load_model_config(path: Option<&Path>) -> Result<ModelConfig, IoError> {
    let Some(path) = path else {
        return Ok(ModelConfig::default());
    };
    let file = File::open(path).map_err(|e| IoError::open(path, e))?;
    let config: ModelConfig = serde_json::from_reader(BufReader::new(file))?;
    if config != ModelConfig::default() {
        warn!("Model config {} overrides the built-in bounds or neighbor count", path.display());
    }
    config.validate()?;
    info!("Model config loaded from {} (k: {})", path.display(), config.neighbors);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use udara_core::Category;

    #[test]
    fn test_json_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.json");
        std::fs::write(&path, r#"{"x": [[0,0,0,0,0,0],[1,1,1,1,1,1]], "y": [0, 2]}"#).unwrap();

        let ds = JsonDatasetSource::new(&path).load().unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.labels(), &[Category::Good, Category::Unhealthy]);
    }

    #[test]
    fn test_json_bundle_mismatch_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.json");
        std::fs::write(&path, r#"{"x": [[0,0,0,0,0,0]], "y": [0, 1]}"#).unwrap();

        let err = JsonDatasetSource::new(&path).load().unwrap_err();
        assert!(matches!(err, ModelError::DataLoad(_)));
    }

    #[test]
    fn test_savetxt_tables() {
        let dir = tempfile::tempdir().unwrap();
        let x_path = dir.path().join("x.csv");
        let y_path = dir.path().join("y.csv");
        let mut x = File::create(&x_path).unwrap();
        writeln!(x, "1.000000000000000056e-01 2.000000000000000111e-01 0 0 0 0").unwrap();
        writeln!(x, "9.000000000000000222e-01 0 0 0 0 1").unwrap();
        let mut y = File::create(&y_path).unwrap();
        writeln!(y, "1.000000000000000000e+00").unwrap();
        writeln!(y, "3.000000000000000000e+00").unwrap();

        let ds = CsvDatasetSource::new(&x_path, &y_path).with_delimiter(b' ').load().unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.labels(), &[Category::Moderate, Category::VeryUnhealthy]);
        assert_eq!(ds.points()[1][5], 1.0);
    }

    #[test]
    fn test_wide_label_table_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let x_path = dir.path().join("x.csv");
        let y_path = dir.path().join("y.csv");
        std::fs::write(&x_path, "0,0,0,0,0,0\n1,1,1,1,1,1\n").unwrap();
        // a feature table passed where the labels belong
        std::fs::write(&y_path, "0,3,2,1,1,1\n3,0,0,0,0,0\n").unwrap();

        let err = CsvDatasetSource::new(&x_path, &y_path).load().unwrap_err();
        match err {
            ModelError::DataLoad(msg) => assert!(msg.contains("label row 0"), "{}", msg),
            other => panic!("expected DataLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let src = CsvDatasetSource::new("/nonexistent/x.csv", "/nonexistent/y.csv");
        let err = src.load().unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }

    #[test]
    fn test_bad_number_reported_with_position() {
        let dir = tempfile::tempdir().unwrap();
        let x_path = dir.path().join("x.csv");
        let y_path = dir.path().join("y.csv");
        std::fs::write(&x_path, "0,0,0,0,0,0\n0,0,abc,0,0,0\n").unwrap();
        std::fs::write(&y_path, "0\n1\n").unwrap();

        let err = CsvDatasetSource::new(&x_path, &y_path).read().unwrap_err();
        assert!(matches!(err, IoError::ParseValue { row: 1, .. }));
    }

    #[test]
    fn test_open_source_selection() {
        assert!(matches!(open_source(None, None, b','), Err(IoError::NoReference)));
        let src = open_source(None, Some((Path::new("x.csv"), Path::new("y.csv"))), b',').unwrap();
        assert!(src.describe().contains("x.csv"));
        let src = open_source(Some(Path::new("ref.json")), None, b',').unwrap();
        assert!(src.describe().contains("ref.json"));
    }

    #[test]
    fn test_model_config_defaults_and_overrides() {
        assert_eq!(load_model_config(None).unwrap(), ModelConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, r#"{"neighbors": 3}"#).unwrap();
        let cfg = load_model_config(Some(&path)).unwrap();
        assert_eq!(cfg.neighbors, 3);
        assert_eq!(cfg.bounds, ModelConfig::default().bounds);

        std::fs::write(&path, r#"{"neighbors": 0}"#).unwrap();
        assert!(load_model_config(Some(&path)).is_err());
    }
}
