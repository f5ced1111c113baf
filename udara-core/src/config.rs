use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::features::{FeatureVector, Pollutant};

/// Per-feature lower bounds derived from the collected dataset.
pub const DEFAULT_MIN: FeatureVector = [3.0, 16.0, 11.0, 1.0, 4.0, 0.0];
/// Per-feature upper bounds derived from the collected dataset.
pub const DEFAULT_MAX: FeatureVector = [163.0, 287.0, 89.0, 55.0, 81.0, 53.0];
/// Neighbors consulted by the majority vote.
pub const DEFAULT_NEIGHBORS: usize = 2;

/// Min-max bounds used by the scaler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerBounds {
    pub min: FeatureVector,
    pub max: FeatureVector,
}

impl Default for ScalerBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
        }
    }
}

impl ScalerBounds {
    /// Every feature needs `max > min`, otherwise scaling divides by zero.
    pub fn validate(&self) -> Result<(), ModelError> {
        for p in Pollutant::ALL {
            let (lo, hi) = (self.min[p.index()], self.max[p.index()]);
            // NaN bounds compare as None and are rejected with the rest
            if hi.partial_cmp(&lo) != Some(Ordering::Greater) {
                return Err(ModelError::data_load(format!(
                    "degenerate bounds for {}: min={} max={}",
                    p.display_name(),
                    lo,
                    hi
                )));
            }
        }
        Ok(())
    }
}

/// Model parameters. Defaults reproduce the production classifier; the
/// struct exists so tests and deployments can override them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub bounds: ScalerBounds,
    pub neighbors: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            bounds: ScalerBounds::default(),
            neighbors: DEFAULT_NEIGHBORS,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.neighbors == 0 {
            return Err(ModelError::data_load("neighbor count must be at least 1"));
        }
        self.bounds.validate()
    }
}
