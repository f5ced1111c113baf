use crate::category::Category;
use crate::error::ModelError;
use crate::features::{to_feature_vector, FeatureVector};

/// The labeled, pre-scaled reference points the classifier votes over.
///
/// Construction is the only place the invariants are checked: the table is
/// non-empty, `points` and `labels` have the same length, every row carries
/// six features and every label is a known category. Nothing mutates it
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDataset {
    points: Vec<FeatureVector>,
    labels: Vec<Category>,
}

impl ReferenceDataset {
    pub fn new(points: Vec<FeatureVector>, labels: Vec<Category>) -> Result<Self, ModelError> {
        if points.is_empty() {
            return Err(ModelError::data_load("reference dataset is empty"));
        }
        if points.len() != labels.len() {
            return Err(ModelError::data_load(format!(
                "reference tables disagree: {} feature rows but {} labels",
                points.len(),
                labels.len()
            )));
        }
        Ok(Self { points, labels })
    }

    /// Builds the dataset from raw numeric tables, as stored on disk.
    ///
    /// Labels arrive as floats in some exports (`1.0`); they must still be
    /// whole numbers in `0..=3`.
    pub fn from_tables<R: AsRef<[f64]>>(x: &[R], y: &[f64]) -> Result<Self, ModelError> {
        let points = x
            .iter()
            .enumerate()
            .map(|(row, values)| {
                to_feature_vector(values.as_ref()).map_err(|e| {
                    ModelError::data_load(format!("feature row {}: {}", row, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let labels = y
            .iter()
            .enumerate()
            .map(|(row, &raw)| {
                if !raw.is_finite() || raw.fract() != 0.0 {
                    return Err(ModelError::data_load(format!(
                        "label row {}: {} is not a class id",
                        row, raw
                    )));
                }
                Category::from_label(raw as i64)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(points, labels)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[FeatureVector] {
        &self.points
    }

    pub fn labels(&self) -> &[Category] {
        &self.labels
    }
}

/// Where the reference tables come from.
pub trait DatasetSource {
    fn load(&self) -> Result<ReferenceDataset, ModelError>;

    /// Short human-readable origin, used in log lines.
    fn describe(&self) -> String {
        "reference dataset".to_string()
    }
}

/// A dataset that is already in memory (tests, embedded tables).
#[derive(Debug, Clone)]
pub struct InMemorySource {
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
}

impl DatasetSource for InMemorySource {
    fn load(&self) -> Result<ReferenceDataset, ModelError> {
        ReferenceDataset::from_tables(self.x.as_slice(), &self.y)
    }

    fn describe(&self) -> String {
        format!("in-memory table ({} rows)", self.x.len())
    }
}
