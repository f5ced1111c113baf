use crate::config::ScalerBounds;
use crate::error::ModelError;
use crate::features::{to_feature_vector, FeatureVector, N_FEATURES};

/// Fixed-bounds Min-Max Scaler
///
/// Maps each feature linearly so that `min -> 0.0` and `max -> 1.0`.
/// Readings outside the bounds are extrapolated, never clamped.
#[derive(Debug, Clone, Copy)]
pub struct MinMaxScaler {
    min: FeatureVector,
    span: FeatureVector,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::from_valid_bounds(ScalerBounds::default())
    }
}

impl MinMaxScaler {
    /// Builds a scaler after checking `max > min` on every feature.
    pub fn new(bounds: ScalerBounds) -> Result<Self, ModelError> {
        bounds.validate()?;
        Ok(Self::from_valid_bounds(bounds))
    }

    fn from_valid_bounds(bounds: ScalerBounds) -> Self {
        let mut span = [0.0; N_FEATURES];
        for i in 0..N_FEATURES {
            span[i] = bounds.max[i] - bounds.min[i];
        }
        Self { min: bounds.min, span }
    }

    pub fn bounds(&self) -> ScalerBounds {
        let mut max = [0.0; N_FEATURES];
        for i in 0..N_FEATURES {
            max[i] = self.span[i] + self.min[i];
        }
        ScalerBounds { min: self.min, max }
    }

    pub fn transform(&self, x: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; N_FEATURES];
        for i in 0..N_FEATURES {
            out[i] = (x[i] - self.min[i]) / self.span[i];
        }
        out
    }

    pub fn inverse_transform(&self, x_scaled: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; N_FEATURES];
        for i in 0..N_FEATURES {
            out[i] = x_scaled[i] * self.span[i] + self.min[i];
        }
        out
    }

    pub fn transform_batch(&self, rows: &[FeatureVector]) -> Vec<FeatureVector> {
        rows.iter().map(|r| self.transform(r)).collect()
    }

    pub fn inverse_transform_batch(&self, rows: &[FeatureVector]) -> Vec<FeatureVector> {
        rows.iter().map(|r| self.inverse_transform(r)).collect()
    }

    /// Scales rows of unchecked width.
    ///
    /// # Errors
    /// Fails with `InvalidInput` on the first row that does not carry six values;
    /// nothing is scaled in that case.
    pub fn transform_rows<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<Vec<FeatureVector>, ModelError> {
        let checked = rows
            .iter()
            .map(|r| to_feature_vector(r.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.transform_batch(&checked))
    }
}
