//! Training configuration

use crate::error::{AnalyticaError, Result};
use crate::preprocessing::PreprocessingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A numeric target with more distinct values than this is treated as regression.
///
/// This is a cardinality heuristic, not a statistical test: low-cardinality
/// numeric targets (0/1 flags, small integer classes) are classified.
pub const DEFAULT_REGRESSION_CARDINALITY_THRESHOLD: usize = 20;

/// Value reported for a precision whose denominator is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZeroDivision {
    #[default]
    Zero,
    One,
}

impl ZeroDivision {
    pub fn value(self) -> f64 {
        match self {
            ZeroDivision::Zero => 0.0,
            ZeroDivision::One => 1.0,
        }
    }
}

/// Configuration for a battery run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Seed for the split and every seeded estimator
    pub random_state: u64,

    /// Distinct-value count above which a numeric target is regression
    pub regression_threshold: usize,

    /// Zero-division policy for weighted precision
    pub zero_division: ZeroDivision,

    /// Iteration bound for logistic regression
    pub logistic_max_iter: usize,

    /// Number of trees in the random forests
    pub n_estimators: usize,

    /// Train the battery on rayon workers, one per model entry
    pub parallel: bool,

    /// Wall-clock budget per model; exceeding it marks that model failed
    pub model_timeout_secs: Option<u64>,

    /// Preprocessing plan settings
    pub preprocessing: PreprocessingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
            regression_threshold: DEFAULT_REGRESSION_CARDINALITY_THRESHOLD,
            zero_division: ZeroDivision::Zero,
            logistic_max_iter: 1000,
            n_estimators: 100,
            parallel: false,
            model_timeout_secs: None,
            preprocessing: PreprocessingConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; absent fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(AnalyticaError::InvalidParameter {
                name: "test_size".to_string(),
                value: self.test_size.to_string(),
                reason: "must be in (0, 1)".to_string(),
            });
        }
        if self.n_estimators == 0 {
            return Err(AnalyticaError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.logistic_max_iter == 0 {
            return Err(AnalyticaError::InvalidParameter {
                name: "logistic_max_iter".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.model_timeout_secs == Some(0) {
            return Err(AnalyticaError::InvalidParameter {
                name: "model_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "must be positive when set".to_string(),
            });
        }
        Ok(())
    }

    /// Builder method to set the held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Builder method to set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Builder method to set the regression cardinality threshold
    pub fn with_regression_threshold(mut self, threshold: usize) -> Self {
        self.regression_threshold = threshold;
        self
    }

    /// Builder method to set the zero-division policy
    pub fn with_zero_division(mut self, policy: ZeroDivision) -> Self {
        self.zero_division = policy;
        self
    }

    /// Builder method to set number of estimators
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Builder method to enable parallel model training
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builder method to set the per-model time budget
    pub fn with_model_timeout_secs(mut self, secs: u64) -> Self {
        self.model_timeout_secs = Some(secs);
        self
    }

    /// Builder method to set preprocessing options
    pub fn with_preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.preprocessing = preprocessing;
        self
    }
}
