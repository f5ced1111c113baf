pub mod distance;
pub mod knn;
pub mod scaler;

use crate::category::Category;
use crate::error::ModelError;
use crate::features::FeatureVector;

/// Anything that can label already-scaled observations.
pub trait Classifier {
    /// Returns one category per query, in query order.
    fn predict(&self, queries: &[FeatureVector]) -> Result<Vec<Category>, ModelError>;
}
