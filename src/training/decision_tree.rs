//! Decision tree implementation

use super::models::{check_fit_shape, Predictor};
use crate::error::{AnalyticaError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node.
///
/// Nodes live in a flat arena; `left` and `right` are arena indices, so
/// building, predicting and dropping never recurse with the tree depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
        impurity: f64,
    },
}

/// A node still to be built: its rows, depth and reserved arena slot
struct Frame {
    indices: Vec<usize>,
    depth: usize,
    slot: usize,
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Criterion {
    /// Gini impurity (classification)
    Gini,
    /// Mean squared error (regression)
    MSE,
}

/// Number of features examined at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features, rounded down, at least one
    Sqrt,
    /// Fixed number, capped at n_features
    Fixed(usize),
    /// All features
    All,
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        if n_features == 0 {
            return 0;
        }
        match self {
            MaxFeatures::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
            MaxFeatures::Fixed(n) => n.clamp(1, n_features),
            MaxFeatures::All => n_features,
        }
    }
}

/// Decision tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Node arena, root at index 0; empty until fitted
    nodes: Vec<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split
    pub max_features: MaxFeatures,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Seed for per-split feature sampling
    pub random_state: u64,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Classes (for classification), ascending
    classes: Vec<f64>,
}

/// Borrowed training data shared by the tree builder
struct FitData<'a> {
    x: &'a Array2<f64>,
    /// Class index for classification, raw value for regression
    y: &'a [f64],
    n_classes: usize,
    max_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new_classifier()
    }
}

impl DecisionTree {
    /// Create a new classifier tree
    pub fn new_classifier() -> Self {
        Self {
            nodes: Vec::new(),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            criterion: Criterion::Gini,
            random_state: 0,
            n_features: 0,
            feature_importances: None,
            classes: Vec::new(),
        }
    }

    /// Create a new regressor tree
    pub fn new_regressor() -> Self {
        Self {
            criterion: Criterion::MSE,
            ..Self::new_classifier()
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set the per-split feature budget
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn is_classification(&self) -> bool {
        self.criterion == Criterion::Gini
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_shape(x, y)?;
        if self.min_samples_leaf == 0 || self.min_samples_split < 2 {
            return Err(AnalyticaError::InvalidParameter {
                name: "min_samples_leaf/min_samples_split".to_string(),
                value: format!("{}/{}", self.min_samples_leaf, self.min_samples_split),
                reason: "need min_samples_leaf >= 1 and min_samples_split >= 2".to_string(),
            });
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        self.n_features = n_features;

        let targets: Vec<f64> = if self.is_classification() {
            let mut classes: Vec<f64> = y.iter().copied().collect();
            classes.sort_by(|a, b| a.total_cmp(b));
            classes.dedup();
            let encoded = y
                .iter()
                .map(|v| classes.binary_search_by(|c| c.total_cmp(v)).unwrap_or(0) as f64)
                .collect();
            self.classes = classes;
            encoded
        } else {
            y.to_vec()
        };

        let data = FitData {
            x,
            y: &targets,
            n_classes: self.classes.len(),
            max_features: self.max_features.resolve(n_features),
        };

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut importances = vec![0.0; n_features];
        self.nodes = self.build_tree(&data, &mut rng, &mut importances);

        // Normalize feature importances
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    /// Grow the tree depth-first from an explicit work stack.
    ///
    /// Left children are popped before right ones, so nodes are built in the
    /// same preorder (and draw from `rng` in the same order) as a recursive
    /// builder would, without using call-stack space per level.
    fn build_tree(&self, data: &FitData<'_>, rng: &mut ChaCha8Rng, importances: &mut [f64]) -> Vec<TreeNode> {
        let placeholder = TreeNode::Leaf { value: 0.0, n_samples: 0 };
        let mut nodes = vec![placeholder.clone()];
        let mut stack = vec![Frame {
            indices: (0..data.x.nrows()).collect(),
            depth: 0,
            slot: 0,
        }];

        while let Some(Frame { indices, depth, slot }) = stack.pop() {
            let n_samples = indices.len();
            let impurity = self.node_impurity(data, &indices);

            let should_stop = n_samples < self.min_samples_split
                || n_samples < 2 * self.min_samples_leaf
                || self.max_depth.map_or(false, |d| depth >= d)
                || impurity <= f64::EPSILON;

            let split = if should_stop {
                None
            } else {
                self.find_best_split(data, &indices, impurity, rng)
            };
            let Some((feature_idx, threshold, gain)) = split else {
                nodes[slot] = self.leaf(data, &indices);
                continue;
            };

            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| data.x[[i, feature_idx]] <= threshold);

            importances[feature_idx] += n_samples as f64 * gain.max(0.0);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(placeholder.clone());
            nodes.push(placeholder.clone());
            nodes[slot] = TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                n_samples,
                impurity,
            };

            stack.push(Frame {
                indices: right_indices,
                depth: depth + 1,
                slot: right,
            });
            stack.push(Frame {
                indices: left_indices,
                depth: depth + 1,
                slot: left,
            });
        }

        nodes
    }

    /// Best split over a seeded random feature order.
    ///
    /// The first `max_features` features are scanned; if none of them admits a
    /// valid split the scan continues through the rest. Ties keep the feature
    /// scanned first.
    fn find_best_split(
        &self,
        data: &FitData<'_>,
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, f64)> {
        let n_features = data.x.ncols();
        let mut features: Vec<usize> = (0..n_features).collect();
        if data.max_features < n_features {
            features.shuffle(rng);
        }

        let (first, rest) = features.split_at(data.max_features.min(n_features));
        for batch in [first, rest] {
            // Each feature independently finds its best split
            let candidates: Vec<Option<(usize, f64, f64)>> = batch
                .par_iter()
                .map(|&feature_idx| self.best_split_for_feature(data, indices, feature_idx, parent_impurity))
                .collect();

            let mut best: Option<(usize, f64, f64)> = None;
            for candidate in candidates.into_iter().flatten() {
                if best.map_or(true, |b| candidate.2 > b.2) {
                    best = Some(candidate);
                }
            }
            if best.is_some() {
                return best;
            }
        }
        None
    }

    /// Sweep the sorted feature values, updating child statistics incrementally
    fn best_split_for_feature(
        &self,
        data: &FitData<'_>,
        indices: &[usize],
        feature_idx: usize,
        parent_impurity: f64,
    ) -> Option<(usize, f64, f64)> {
        let mut order: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (data.x[[i, feature_idx]], data.y[i]))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = order.len();
        let mut best: Option<(f64, f64)> = None;

        let mut left_counts = vec![0usize; data.n_classes];
        let mut right_counts = vec![0usize; data.n_classes];
        let (mut left_sum, mut left_sq) = (0.0, 0.0);
        let (mut right_sum, mut right_sq) = (0.0, 0.0);

        if self.is_classification() {
            for &(_, label) in &order {
                right_counts[label as usize] += 1;
            }
        } else {
            for &(_, value) in &order {
                right_sum += value;
                right_sq += value * value;
            }
        }

        for pos in 0..n.saturating_sub(1) {
            let (value, target) = order[pos];
            if self.is_classification() {
                left_counts[target as usize] += 1;
                right_counts[target as usize] -= 1;
            } else {
                left_sum += target;
                left_sq += target * target;
                right_sum -= target;
                right_sq -= target * target;
            }

            let next = order[pos + 1].0;
            if value == next {
                continue;
            }

            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let (left_impurity, right_impurity) = if self.is_classification() {
                (gini(&left_counts, n_left), gini(&right_counts, n_right))
            } else {
                (
                    variance(left_sum, left_sq, n_left),
                    variance(right_sum, right_sq, n_right),
                )
            };

            let weighted = (n_left as f64 * left_impurity + n_right as f64 * right_impurity) / n as f64;
            let gain = parent_impurity - weighted;

            if best.map_or(true, |(_, g)| gain > g) {
                let mid = value + (next - value) / 2.0;
                let threshold = if mid < next { mid } else { value };
                best = Some((threshold, gain));
            }
        }

        best.map(|(threshold, gain)| (feature_idx, threshold, gain))
    }

    fn node_impurity(&self, data: &FitData<'_>, indices: &[usize]) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        if self.is_classification() {
            let mut counts = vec![0usize; data.n_classes];
            for &i in indices {
                counts[data.y[i] as usize] += 1;
            }
            gini(&counts, indices.len())
        } else {
            let (sum, sq) = indices
                .iter()
                .fold((0.0, 0.0), |(s, q), &i| (s + data.y[i], q + data.y[i] * data.y[i]));
            variance(sum, sq, indices.len())
        }
    }

    fn leaf(&self, data: &FitData<'_>, indices: &[usize]) -> TreeNode {
        let n_samples = indices.len();
        let value = if self.is_classification() {
            let mut counts = vec![0usize; data.n_classes];
            for &i in indices {
                counts[data.y[i] as usize] += 1;
            }
            // Most common class; ties go to the lowest class
            let mut best = 0;
            for (k, &c) in counts.iter().enumerate() {
                if c > counts[best] {
                    best = k;
                }
            }
            self.classes.get(best).copied().unwrap_or(0.0)
        } else if n_samples == 0 {
            0.0
        } else {
            indices.iter().map(|&i| data.y[i]).sum::<f64>() / n_samples as f64
        };

        TreeNode::Leaf { value, n_samples }
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.nodes.is_empty() {
            return Err(AnalyticaError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(AnalyticaError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let predictions = x
            .axis_iter(Axis(0))
            .map(|sample| self.predict_sample(&sample))
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn predict_sample(&self, sample: &ArrayView1<f64>) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if sample[*feature_idx] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let TreeNode::Split { left, right, .. } = &self.nodes[node] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }
}

impl Predictor for DecisionTree {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        DecisionTree::predict(self, x)
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

/// Var = E[X²] - E[X]², clamped against rounding below zero
fn variance(sum: f64, sq_sum: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    (sq_sum / n - (sum / n).powi(2)).max(0.0)
}
