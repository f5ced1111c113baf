use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid input: expected {expected} features, got {actual}")]
    InvalidInput { expected: usize, actual: usize },
    #[error("Failed to load reference data: {0}")]
    DataLoad(String),
}

impl ModelError {
    pub fn data_load(msg: impl Into<String>) -> Self {
        ModelError::DataLoad(msg.into())
    }
}
