//! Analytica core - automatic tabular modelling
//!
//! Given a dataset and a target column, this crate decides whether the target
//! implies classification or regression, synthesizes a preprocessing plan for
//! the remaining columns, and trains and scores a fixed battery of models on
//! one shared train/test split.
//!
//! # Modules
//!
//! - [`preprocessing`] - Feature classification, imputation, scaling, one-hot encoding
//! - [`training`] - Problem-type inference, model battery, orchestration, metrics
//! - [`analysis`] - Descriptive statistics report
//! - [`utils`] - Dataset loading
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod training;

// Reporting and I/O
pub mod analysis;
pub mod utils;

// Services
pub mod cli;

pub use error::{AnalyticaError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{AnalyticaError, Result};

    // Preprocessing
    pub use crate::preprocessing::{
        classify_features, FeaturePartition, FittedPlan, PreprocessingConfig, PreprocessingPlan,
    };

    // Training
    pub use crate::training::{
        infer_problem_type, model_battery, ModelEntry, ModelResult, ModelStatus, PredictionReport,
        ProblemType, TrainEngine, TrainingConfig,
    };

    // Data
    pub use crate::analysis::DatasetSummary;
    pub use crate::utils::DataLoader;
}
