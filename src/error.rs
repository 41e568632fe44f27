//! Error types for the Analytica analysis core

use thiserror::Error;

/// Result type alias for Analytica operations
pub type Result<T> = std::result::Result<T, AnalyticaError>;

/// Main error type for the analysis core
///
/// Request-fatal variants (`EmptyDatasetAfterFiltering`, `UnknownColumnKind`,
/// `FeatureNotFound`, ...) abort a whole run. `ModelTrainingFailure` and
/// `Timeout` are scoped to one model entry and are folded into a `Failed`
/// result by the training engine.
#[derive(Error, Debug)]
pub enum AnalyticaError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Convergence failed after {iterations} iterations")]
    ConvergenceError { iterations: usize },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No data remaining after dropping rows with missing values in target column '{target}'")]
    EmptyDatasetAfterFiltering { target: String },

    #[error("Column '{column}' has dtype {dtype}, which is neither numeric nor categorical")]
    UnknownColumnKind { column: String, dtype: String },

    #[error("Model '{model}' failed: {reason}")]
    ModelTrainingFailure { model: String, reason: String },

    #[error("Model '{model}' exceeded its {budget_secs}s training budget")]
    Timeout { model: String, budget_secs: u64 },
}

impl AnalyticaError {
    /// Whether this error is scoped to a single model entry
    pub fn is_model_scoped(&self) -> bool {
        matches!(
            self,
            AnalyticaError::ModelTrainingFailure { .. } | AnalyticaError::Timeout { .. }
        )
    }
}

impl From<polars::error::PolarsError> for AnalyticaError {
    fn from(err: polars::error::PolarsError) -> Self {
        AnalyticaError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for AnalyticaError {
    fn from(err: serde_json::Error) -> Self {
        AnalyticaError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for AnalyticaError {
    fn from(err: ndarray::ShapeError) -> Self {
        AnalyticaError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalyticaError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AnalyticaError = io_err.into();
        assert!(matches!(err, AnalyticaError::IoError(_)));
    }

    #[test]
    fn test_empty_after_filtering_names_target() {
        let err = AnalyticaError::EmptyDatasetAfterFiltering { target: "label".to_string() };
        assert!(err.to_string().contains("'label'"));
        assert!(!err.is_model_scoped());
    }

    #[test]
    fn test_model_scoped_errors() {
        let failure = AnalyticaError::ModelTrainingFailure {
            model: "Decision Tree".to_string(),
            reason: "boom".to_string(),
        };
        let timeout = AnalyticaError::Timeout { model: "Random Forest".to_string(), budget_secs: 5 };
        assert!(failure.is_model_scoped());
        assert!(timeout.is_model_scoped());
        assert_eq!(timeout.to_string(), "Model 'Random Forest' exceeded its 5s training budget");
    }
}
