use crate::category::Category;
use crate::config::ModelConfig;
use crate::dataset::{DatasetSource, ReferenceDataset};
use crate::error::ModelError;
use crate::features::FeatureVector;
use crate::model::knn::ManhattanKnn;
use crate::model::scaler::MinMaxScaler;
use crate::model::Classifier;
use log::debug;
use std::panic;

/// Batches smaller than this are not worth a thread hop.
const PARALLEL_THRESHOLD: usize = 256;

/// Raw readings in, categories out.
///
/// Built once per process and shared read-only (`Arc<Predictor>`); nothing
/// in here is mutated after construction.
#[derive(Debug, Clone)]
pub struct Predictor {
    scaler: MinMaxScaler,
    classifier: ManhattanKnn,
}

impl Predictor {
    pub fn new(config: ModelConfig, dataset: ReferenceDataset) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self {
            scaler: MinMaxScaler::new(config.bounds)?,
            classifier: ManhattanKnn::new(dataset, config.neighbors)?,
        })
    }

    pub fn from_source(config: ModelConfig, source: &dyn DatasetSource) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self {
            scaler: MinMaxScaler::new(config.bounds)?,
            classifier: ManhattanKnn::from_source(source, config.neighbors)?,
        })
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &ManhattanKnn {
        &self.classifier
    }

    pub fn predict_reading(&self, reading: &FeatureVector) -> Category {
        self.classifier.predict_one(&self.scaler.transform(reading))
    }

    /// Scales and classifies raw readings; `out[i]` belongs to `readings[i]`.
    pub fn predict(&self, readings: &[FeatureVector]) -> Vec<Category> {
        readings.iter().map(|r| self.predict_reading(r)).collect()
    }

    /// Same as `predict`, for rows whose width has not been checked yet.
    pub fn predict_rows<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<Vec<Category>, ModelError> {
        let scaled = self.scaler.transform_rows(rows)?;
        self.classifier.predict(&scaled)
    }

    /// Splits the batch into contiguous chunks classified on scoped threads.
    /// Output order is identical to `predict`.
    pub fn predict_parallel(&self, readings: &[FeatureVector], workers: usize) -> Vec<Category> {
        let workers = workers.max(1);
        if workers == 1 || readings.len() < PARALLEL_THRESHOLD {
            return self.predict(readings);
        }

        let chunk_size = (readings.len() + workers - 1) / workers;
        debug!("Parallel predict: {} rows over {} workers", readings.len(), workers);

        let joined = crossbeam_utils::thread::scope(|s| {
            let handles: Vec<_> = readings
                .chunks(chunk_size)
                .map(|chunk| s.spawn(move |_| self.predict(chunk)))
                .collect();

            let mut out = Vec::with_capacity(readings.len());
            for handle in handles {
                match handle.join() {
                    Ok(mut part) => out.append(&mut part),
                    Err(payload) => panic::resume_unwind(payload),
                }
            }
            out
        });

        joined.unwrap_or_else(|payload| panic::resume_unwind(payload))
    }

    /// `predict_parallel` sized to the machine.
    pub fn predict_all(&self, readings: &[FeatureVector]) -> Vec<Category> {
        self.predict_parallel(readings, num_cpus::get())
    }
}
