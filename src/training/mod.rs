//! Model training module
//!
//! Problem-type inference, the fixed model battery and the orchestrator that
//! trains and scores every battery entry against one shared split:
//! - Linear models (OLS regression, L2-regularized logistic regression)
//! - Decision trees (CART) and Random Forests
//! - Weighted classification metrics and regression metrics

mod battery;
mod config;
mod engine;
mod models;
mod pipeline;
mod problem;
mod report;
mod split;
pub mod decision_tree;
pub mod linear_models;
pub mod random_forest;

pub use battery::{model_battery, ModelEntry, ModelKind};
pub use config::{TrainingConfig, ZeroDivision, DEFAULT_REGRESSION_CARDINALITY_THRESHOLD};
pub use engine::TrainEngine;
pub use models::{ClassificationMetrics, Estimator, Metrics, Predictor, RegressionMetrics};
pub use pipeline::{FittedPipeline, Pipeline};
pub use problem::{infer_problem_type, ProblemType, TargetEncoder};
pub use report::{ModelResult, ModelStatus, PredictionReport};
pub use split::{train_test_split, SplitIndices};

pub use decision_tree::{Criterion, DecisionTree, MaxFeatures, TreeNode};
pub use linear_models::{LinearRegression, LogisticRegression};
pub use random_forest::RandomForest;
