//! Preprocessing configuration

use super::{HandleUnknown, ImputeStrategy, ScalerType};
use serde::{Deserialize, Serialize};

/// Configuration for the column-wise preprocessing plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Strategy for filling missing numeric values
    pub numeric_impute_strategy: ImputeStrategy,

    /// Strategy for filling missing categorical values
    pub categorical_impute_strategy: ImputeStrategy,

    /// Scaler applied to imputed numeric features
    pub scaler_type: ScalerType,

    /// What one-hot encoding does with a category not seen during fit
    pub handle_unknown: HandleUnknown,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            numeric_impute_strategy: ImputeStrategy::Median,
            categorical_impute_strategy: ImputeStrategy::MostFrequent,
            scaler_type: ScalerType::Standard,
            handle_unknown: HandleUnknown::Ignore,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set numeric impute strategy
    pub fn with_numeric_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.numeric_impute_strategy = strategy;
        self
    }

    /// Builder method to set categorical impute strategy
    pub fn with_categorical_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.categorical_impute_strategy = strategy;
        self
    }

    /// Builder method to set scaler type
    pub fn with_scaler(mut self, scaler_type: ScalerType) -> Self {
        self.scaler_type = scaler_type;
        self
    }

    /// Builder method to set the unknown-category policy
    pub fn with_handle_unknown(mut self, handle_unknown: HandleUnknown) -> Self {
        self.handle_unknown = handle_unknown;
        self
    }
}
