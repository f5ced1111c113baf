use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Air-quality category, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Good = 0,
    Moderate = 1,
    Unhealthy = 2,
    VeryUnhealthy = 3,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Good,
        Category::Moderate,
        Category::Unhealthy,
        Category::VeryUnhealthy,
    ];

    /// Maps an integer class label into the closed enumeration.
    pub fn from_label(label: i64) -> Result<Self, ModelError> {
        match label {
            0 => Ok(Category::Good),
            1 => Ok(Category::Moderate),
            2 => Ok(Category::Unhealthy),
            3 => Ok(Category::VeryUnhealthy),
            other => Err(ModelError::data_load(format!("unknown class label {}", other))),
        }
    }

    pub fn label(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Good => "GOOD",
            Category::Moderate => "MODERATE",
            Category::Unhealthy => "UNHEALTHY",
            Category::VeryUnhealthy => "VERY_UNHEALTHY",
        }
    }

    /// Indonesian name written into exported tables.
    pub fn localized(self) -> &'static str {
        match self {
            Category::Good => "BAIK",
            Category::Moderate => "SEDANG",
            Category::Unhealthy => "TIDAK SEHAT",
            Category::VeryUnhealthy => "SANGAT TIDAK SEHAT",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for Category {
    type Error = ModelError;

    fn try_from(label: u8) -> Result<Self, Self::Error> {
        Category::from_label(label as i64)
    }
}
