//! Aggregated prediction report

use super::models::Metrics;
use super::problem::ProblemType;
use crate::preprocessing::FeaturePartition;
use serde::{Deserialize, Serialize};

const CLASSIFICATION_COLUMNS: &[&str] = &["accuracy", "precision", "recall", "f1_score"];
const REGRESSION_COLUMNS: &[&str] = &["r2_score", "mse", "rmse"];

/// Outcome of one model entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelStatus {
    Success,
    Failed,
}

/// Per-model evaluation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub model_name: String,
    pub status: ModelStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metrics: Metrics,
}

impl ModelResult {
    pub fn success(model_name: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            model_name: model_name.into(),
            status: ModelStatus::Success,
            error: None,
            metrics,
        }
    }

    pub fn failed(model_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            status: ModelStatus::Failed,
            error: Some(error.into()),
            metrics: Metrics::Empty {},
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ModelStatus::Success
    }
}

/// Report of one battery run, in battery order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub problem_type: ProblemType,
    pub target_column: String,
    pub features_used: FeaturePartition,
    pub model_results: Vec<ModelResult>,
}

impl PredictionReport {
    /// Number of models that trained and scored successfully
    pub fn n_succeeded(&self) -> usize {
        self.model_results.iter().filter(|r| r.is_success()).count()
    }

    /// Successful model with the highest accuracy (classification) or R² (regression).
    /// Ties keep the earlier model.
    pub fn best_model(&self) -> Option<&ModelResult> {
        let mut best: Option<(&ModelResult, f64)> = None;
        for result in &self.model_results {
            if let Some(score) = result.metrics.primary_score() {
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((result, score));
                }
            }
        }
        best.map(|(r, _)| r)
    }

    /// Human-readable summary table
    pub fn summary(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("Problem type: {}\n", self.problem_type));
        report.push_str(&format!("Target:       {}\n", self.target_column));
        report.push_str(&format!(
            "Features:     {} numeric, {} categorical\n\n",
            self.features_used.numeric.len(),
            self.features_used.categorical.len()
        ));

        let header = match self.problem_type {
            ProblemType::Classification => CLASSIFICATION_COLUMNS,
            ProblemType::Regression => REGRESSION_COLUMNS,
        };
        report.push_str(&format!("{:<22} {:<8}", "Model", "Status"));
        for h in header {
            report.push_str(&format!(" {:>10}", h));
        }
        report.push('\n');

        for result in &self.model_results {
            report.push_str(&format!("{:<22} {:<8}", result.model_name, format!("{:?}", result.status)));
            match &result.metrics {
                Metrics::Classification(m) => {
                    for v in [m.accuracy, m.precision, m.recall, m.f1_score] {
                        report.push_str(&format!(" {:>10.4}", v));
                    }
                }
                Metrics::Regression(m) => {
                    for v in [m.r2_score, m.mse, m.rmse] {
                        report.push_str(&format!(" {:>10.4}", v));
                    }
                }
                Metrics::Empty {} => {
                    if let Some(error) = &result.error {
                        report.push_str(&format!(" {}", error));
                    }
                }
            }
            report.push('\n');
        }

        if let Some(best) = self.best_model() {
            report.push_str(&format!("\nBest model: {}\n", best.model_name));
        }

        report
    }
}
