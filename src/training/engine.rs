//! Training engine implementation
//!
//! One run is a linear sequence of stages: filter rows with a missing target,
//! infer the problem type, classify features and synthesize the preprocessing
//! plan, split once, then fit, predict and score every battery entry against
//! that shared split.

use super::battery::{model_battery, ModelEntry};
use super::config::{TrainingConfig, ZeroDivision};
use super::models::{ClassificationMetrics, Metrics, RegressionMetrics};
use super::pipeline::Pipeline;
use super::problem::{infer_problem_type, ProblemType, TargetEncoder};
use super::report::{ModelResult, PredictionReport};
use super::split::train_test_split;
use crate::error::{AnalyticaError, Result};
use crate::preprocessing::{classify_features, is_numeric_dtype, PreprocessingPlan};
use ndarray::{Array1, Axis};
use polars::prelude::*;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

/// Everything a battery entry needs, shared read-only across entries
struct EvalContext {
    plan: PreprocessingPlan,
    train: DataFrame,
    test: DataFrame,
    y_train: Array1<f64>,
    y_test: Array1<f64>,
    problem_type: ProblemType,
    zero_division: ZeroDivision,
}

/// Main training engine
#[derive(Debug, Clone, Default)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    /// Create a new training engine
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run the standard battery for the inferred problem type
    pub fn run(&self, df: &DataFrame, target: &str) -> Result<PredictionReport> {
        self.run_with_battery(df, target, model_battery)
    }

    /// Run with a caller-supplied battery.
    ///
    /// Request-fatal errors (missing target column, no rows left after
    /// filtering, unclassifiable feature dtype, degenerate split) are returned
    /// as `Err`. Anything that goes wrong inside one entry's fit, predict or
    /// score, panics included, becomes a `Failed` result for that entry.
    pub fn run_with_battery<F>(&self, df: &DataFrame, target: &str, battery: F) -> Result<PredictionReport>
    where
        F: FnOnce(ProblemType, &TrainingConfig) -> Vec<ModelEntry>,
    {
        let start = Instant::now();
        self.config.validate()?;

        // Filter
        let filtered = drop_missing_target(df, target)?;
        tracing::info!(
            target_column = target,
            rows = filtered.height(),
            dropped = df.height() - filtered.height(),
            "Filtered rows with missing target"
        );

        // Infer
        let target_series = filtered
            .column(target)
            .map_err(|_| AnalyticaError::FeatureNotFound(target.to_string()))?
            .as_materialized_series()
            .clone();
        let problem_type = infer_problem_type(&target_series, self.config.regression_threshold)?;
        let encoder = TargetEncoder::fit(&target_series, problem_type)?;
        let y = encoder.encode(&target_series)?;
        tracing::info!(%problem_type, n_classes = encoder.n_classes(), "Inferred problem type");

        // Classify / synthesize
        let features = filtered.drop(target)?;
        let partition = classify_features(&features, target)?;
        let plan = PreprocessingPlan::new(partition.clone(), self.config.preprocessing.clone());
        tracing::info!(
            numeric = partition.numeric.len(),
            categorical = partition.categorical.len(),
            "Synthesized preprocessing plan"
        );

        // Split
        let split = train_test_split(features.height(), self.config.test_size, self.config.random_state)?;
        let context = Arc::new(EvalContext {
            plan,
            train: take_rows(&features, &split.train)?,
            test: take_rows(&features, &split.test)?,
            y_train: y.select(Axis(0), &split.train),
            y_test: y.select(Axis(0), &split.test),
            problem_type,
            zero_division: self.config.zero_division,
        });
        tracing::info!(
            train_rows = split.train.len(),
            test_rows = split.test.len(),
            seed = self.config.random_state,
            "Split data"
        );

        // Fit / predict / score per entry
        let entries = battery(problem_type, &self.config);
        let model_results: Vec<ModelResult> = if self.config.parallel {
            entries
                .par_iter()
                .map(|entry| self.evaluate_entry(entry, &context))
                .collect()
        } else {
            entries
                .iter()
                .map(|entry| self.evaluate_entry(entry, &context))
                .collect()
        };

        let report = PredictionReport {
            problem_type,
            target_column: target.to_string(),
            features_used: partition,
            model_results,
        };

        tracing::info!(
            models = report.model_results.len(),
            succeeded = report.n_succeeded(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Battery complete"
        );

        Ok(report)
    }

    fn evaluate_entry(&self, entry: &ModelEntry, context: &Arc<EvalContext>) -> ModelResult {
        let start = Instant::now();

        let outcome = match self.config.model_timeout_secs {
            Some(budget_secs) => run_with_budget(entry, context, budget_secs),
            None => run_isolated(entry, context),
        };

        match outcome {
            Ok(metrics) => {
                tracing::info!(
                    model = entry.name.as_str(),
                    score = metrics.primary_score().unwrap_or(f64::NAN),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Model trained"
                );
                ModelResult::success(entry.name.clone(), metrics)
            }
            Err(err) => {
                tracing::warn!(model = entry.name.as_str(), error = %err, "Model failed");
                let message = match err {
                    AnalyticaError::ModelTrainingFailure { reason, .. } => reason,
                    other => other.to_string(),
                };
                ModelResult::failed(entry.name.clone(), message)
            }
        }
    }
}

/// Remove rows whose target is null or a non-finite float
fn drop_missing_target(df: &DataFrame, target: &str) -> Result<DataFrame> {
    let column = df
        .column(target)
        .map_err(|_| AnalyticaError::FeatureNotFound(target.to_string()))?;
    let series = column.as_materialized_series();

    let mask: BooleanChunked = if is_numeric_dtype(series.dtype()) {
        let values = series.cast(&DataType::Float64)?;
        values
            .f64()?
            .into_iter()
            .map(|v| v.map_or(false, f64::is_finite))
            .collect()
    } else {
        series.is_not_null()
    };

    let filtered = df.filter(&mask)?;
    if filtered.height() == 0 {
        return Err(AnalyticaError::EmptyDatasetAfterFiltering {
            target: target.to_string(),
        });
    }
    Ok(filtered)
}

fn take_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec("idx".into(), rows.iter().map(|&i| i as IdxSize).collect());
    Ok(df.take(&idx)?)
}

/// Fit the (plan, estimator) pipeline on the training partition and score it on the test partition
fn fit_and_score(entry: &ModelEntry, context: &EvalContext) -> Result<Metrics> {
    let pipeline = Pipeline::new(context.plan.clone(), Arc::clone(&entry.estimator));
    let fitted = pipeline.fit(&context.train, &context.y_train)?;
    let predictions = fitted.predict(&context.test)?;

    if predictions.iter().any(|p| !p.is_finite()) {
        return Err(AnalyticaError::ComputationError(
            "Model produced non-finite predictions".to_string(),
        ));
    }

    let metrics = match context.problem_type {
        ProblemType::Classification => Metrics::Classification(ClassificationMetrics::compute(
            &context.y_test,
            &predictions,
            context.zero_division,
        )?),
        ProblemType::Regression => {
            Metrics::Regression(RegressionMetrics::compute(&context.y_test, &predictions)?)
        }
    };
    Ok(metrics)
}

/// Run one entry, converting both errors and panics into `ModelTrainingFailure`
fn run_isolated(entry: &ModelEntry, context: &EvalContext) -> Result<Metrics> {
    match panic::catch_unwind(AssertUnwindSafe(|| fit_and_score(entry, context))) {
        Ok(Ok(metrics)) => Ok(metrics),
        Ok(Err(err)) => Err(AnalyticaError::ModelTrainingFailure {
            model: entry.name.clone(),
            reason: err.to_string(),
        }),
        Err(payload) => Err(AnalyticaError::ModelTrainingFailure {
            model: entry.name.clone(),
            reason: format!("panicked: {}", panic_message(payload.as_ref())),
        }),
    }
}

/// Run one entry on its own thread and give up waiting after `budget_secs`.
///
/// A worker that overruns is detached, not cancelled; its result is discarded.
fn run_with_budget(entry: &ModelEntry, context: &Arc<EvalContext>, budget_secs: u64) -> Result<Metrics> {
    let (tx, rx) = mpsc::channel();
    let worker_entry = entry.clone();
    let worker_context = Arc::clone(context);

    thread::Builder::new()
        .name(format!("fit-{}", entry.name))
        .spawn(move || {
            // The receiver is gone once the budget has elapsed
            let _ = tx.send(run_isolated(&worker_entry, &worker_context));
        })?;

    match rx.recv_timeout(Duration::from_secs(budget_secs)) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(AnalyticaError::Timeout {
            model: entry.name.clone(),
            budget_secs,
        }),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(AnalyticaError::ModelTrainingFailure {
            model: entry.name.clone(),
            reason: "worker thread exited without a result".to_string(),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
