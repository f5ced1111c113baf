//! Udara Core: the air-quality classification engine.
//!
//! Raw pollutant readings are min-max scaled with fixed bounds and then
//! classified by a brute-force Manhattan k-nearest-neighbor vote against an
//! immutable reference dataset.

pub mod category;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod model;
pub mod predictor;

// Re-exports for the io, server and dashboard crates
pub use category::Category;
pub use config::{ModelConfig, ScalerBounds};
pub use dataset::{DatasetSource, InMemorySource, ReferenceDataset};
pub use error::ModelError;
pub use features::{FeatureVector, Pollutant, N_FEATURES};
pub use model::knn::ManhattanKnn;
pub use model::scaler::MinMaxScaler;
pub use model::Classifier;
pub use predictor::Predictor;
