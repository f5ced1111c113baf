use thiserror::Error;
use udara_core::ModelError;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Row {row}, column '{column}': cannot parse '{value}' as a number")]
    ParseValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("Got {labels} labels for {rows} rows")]
    LabelMismatch { rows: usize, labels: usize },
    #[error("Timestamp {0} is out of range")]
    Timestamp(i64),
    #[error("Year {0} is out of range")]
    Year(i32),
    #[error("No reference dataset given: pass a JSON bundle or both feature and label tables")]
    NoReference,
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl IoError {
    pub(crate) fn open(path: &std::path::Path, source: std::io::Error) -> Self {
        IoError::Open {
            path: path.display().to_string(),
            source,
        }
    }
}
