//! Udara I/O: everything that crosses the filesystem boundary.
//!
//! Reference-table loaders for the classifier, the uploaded readings table
//! and its labeled export, and the hourly-to-daily aggregation of saved
//! pollution history responses.

pub mod error;
pub mod history;
pub mod readings;
pub mod reference;

pub use error::IoError;
pub use history::{DailyReading, HourlySample};
pub use readings::ReadingsTable;
pub use reference::{load_model_config, open_source, CsvDatasetSource, JsonDatasetSource};
