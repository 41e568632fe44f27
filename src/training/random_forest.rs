//! Random Forest implementation

use super::decision_tree::{DecisionTree, MaxFeatures};
use super::models::{check_fit_shape, Predictor};
use crate::error::{AnalyticaError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random Forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Base seed; tree `i` is seeded with `random_state + i`
    pub random_state: u64,
    /// Is classification task
    is_classification: bool,
    /// Classes (for classification), ascending
    classes: Vec<f64>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new_classifier(100)
    }
}

impl RandomForest {
    /// Create a new classifier forest
    pub fn new_classifier(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: 0,
            is_classification: true,
            classes: Vec::new(),
        }
    }

    /// Create a new regressor forest
    pub fn new_regressor(n_estimators: usize) -> Self {
        Self {
            max_features: MaxFeatures::All,
            is_classification: false,
            ..Self::new_classifier(n_estimators)
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set max features strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Enable/disable bootstrap sampling
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_shape(x, y)?;
        if self.n_estimators == 0 {
            return Err(AnalyticaError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let n_samples = x.nrows();

        self.classes = if self.is_classification {
            let mut classes: Vec<f64> = y.iter().copied().collect();
            classes.sort_by(|a, b| a.total_cmp(b));
            classes.dedup();
            classes
        } else {
            Vec::new()
        };

        // Build trees in parallel; collect keeps tree order
        let trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| -> Result<DecisionTree> {
                let seed = self.random_state.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot = y.select(Axis(0), &sample_indices);

                let mut tree = if self.is_classification {
                    DecisionTree::new_classifier()
                } else {
                    DecisionTree::new_regressor()
                };
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }
                tree = tree
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(self.max_features)
                    .with_random_state(rng.next_u64());

                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;

        tracing::debug!(
            n_trees = self.trees.len(),
            n_samples,
            classification = self.is_classification,
            "Fitted random forest"
        );

        Ok(self)
    }

    /// Majority vote for classifiers (ties go to the lowest class), mean for regressors
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(AnalyticaError::ModelNotFitted);
        }

        let all_predictions = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let n_samples = x.nrows();

        let predictions: Vec<f64> = if self.is_classification {
            (0..n_samples)
                .map(|i| {
                    let mut votes = vec![0usize; self.classes.len()];
                    for preds in &all_predictions {
                        if let Ok(k) = self.classes.binary_search_by(|c| c.total_cmp(&preds[i])) {
                            votes[k] += 1;
                        }
                    }
                    let mut best = 0;
                    for (k, &v) in votes.iter().enumerate() {
                        if v > votes[best] {
                            best = k;
                        }
                    }
                    self.classes.get(best).copied().unwrap_or(0.0)
                })
                .collect()
        } else {
            (0..n_samples)
                .map(|i| {
                    let sum: f64 = all_predictions.iter().map(|p| p[i]).sum();
                    sum / all_predictions.len() as f64
                })
                .collect()
        };

        Ok(Array1::from_vec(predictions))
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Predictor for RandomForest {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        RandomForest::predict(self, x)
    }
}
