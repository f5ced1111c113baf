use crate::error::ModelError;

/// Number of pollutant readings per observation.
pub const N_FEATURES: usize = 6;

/// One observation: `[PM10, PM2.5, SO2, CO, O3, NO2]`.
///
/// Units are whatever the upstream source reports (µg/m³ for the pollution
/// API); nothing here converts them.
pub type FeatureVector = [f64; N_FEATURES];

/// The six pollutant positions, in feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pollutant {
    Pm10,
    Pm25,
    So2,
    Co,
    O3,
    No2,
}

impl Pollutant {
    pub const ALL: [Pollutant; N_FEATURES] = [
        Pollutant::Pm10,
        Pollutant::Pm25,
        Pollutant::So2,
        Pollutant::Co,
        Pollutant::O3,
        Pollutant::No2,
    ];

    /// Position inside a `FeatureVector`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column header used by uploaded and exported tables.
    pub fn column(self) -> &'static str {
        match self {
            Pollutant::Pm10 => "pm10",
            Pollutant::Pm25 => "pm2.5",
            Pollutant::So2 => "so2",
            Pollutant::Co => "co",
            Pollutant::O3 => "o3",
            Pollutant::No2 => "no2",
        }
    }

    /// Component key in the pollution API payload.
    pub fn api_key(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm2_5",
            other => other.column(),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Pollutant::Pm10 => "PM10",
            Pollutant::Pm25 => "PM2.5",
            Pollutant::So2 => "SO2",
            Pollutant::Co => "CO",
            Pollutant::O3 => "O3",
            Pollutant::No2 => "NO2",
        }
    }
}

/// Converts a loosely-shaped row into a `FeatureVector`.
///
/// # Errors
/// Returns `ModelError::InvalidInput` unless the row has exactly six values.
pub fn to_feature_vector(row: &[f64]) -> Result<FeatureVector, ModelError> {
    row.try_into().map_err(|_| ModelError::InvalidInput {
        expected: N_FEATURES,
        actual: row.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pollutant_order_matches_indices() {
        for (i, p) in Pollutant::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
        assert_eq!(Pollutant::Pm25.column(), "pm2.5");
        assert_eq!(Pollutant::Pm25.api_key(), "pm2_5");
        assert_eq!(Pollutant::No2.api_key(), "no2");
    }

    #[test]
    fn test_row_length_is_checked() {
        assert_eq!(to_feature_vector(&[1.0; 6]).unwrap(), [1.0; 6]);
        assert_eq!(
            to_feature_vector(&[1.0; 5]),
            Err(ModelError::InvalidInput { expected: 6, actual: 5 })
        );
        assert!(to_feature_vector(&[1.0; 7]).is_err());
    }
}
