//! Linear model implementations

use super::models::{check_fit_shape, Predictor};
use crate::error::{AnalyticaError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Relative pivot tolerance below which a normal-equation system is treated as singular
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Solve the symmetric positive-definite system `a x = b` by Cholesky decomposition.
/// Returns `None` when a pivot falls below the relative tolerance.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let scale = a.diag().iter().fold(0.0f64, |m, v| m.max(v.abs())).max(1.0);
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= PIVOT_TOLERANCE * scale {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L y = b
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Matrix inversion by Gauss-Jordan elimination with partial pivoting
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    let scale = m.iter().fold(0.0f64, |acc, v| acc.max(v.abs())).max(1.0);

    // Augmented matrix [M | I]
    let mut aug = Array2::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        if aug[[col, col]].abs() < PIVOT_TOLERANCE * scale {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    for j in 0..2 * n {
                        aug[[row, j]] -= factor * aug[[col, j]];
                    }
                }
            }
        }
    }

    let mut inv = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inv[[i, j]] = aug[[i, n + j]];
        }
    }

    Some(inv)
}

/// Solve `(X^T X) w = X^T y`.
///
/// Cholesky first, Gauss-Jordan second. Rank-deficient designs (for example
/// one-hot blocks that sum to the intercept) get a vanishing ridge jitter,
/// which approaches the minimum-norm least-squares solution.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    if let Some(result) = cholesky_solve(&xtx, &xty) {
        return Some(result);
    }

    if let Some(inv) = matrix_inverse(&xtx) {
        return Some(inv.dot(&xty));
    }

    let n = xtx.nrows();
    let mean_diag = (xtx.diag().sum() / n.max(1) as f64).max(f64::MIN_POSITIVE);
    let mut jitter = 1e-8 * mean_diag;
    for _ in 0..6 {
        let mut regularized = xtx.clone();
        for i in 0..n {
            regularized[[i, i]] += jitter;
        }
        if let Some(result) = cholesky_solve(&regularized, &xty) {
            tracing::debug!(jitter, "Solved rank-deficient least squares with ridge jitter");
            return Some(result);
        }
        jitter *= 100.0;
    }

    None
}

/// Ordinary least squares with intercept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether to fit intercept
    pub fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_shape(x, y)?;

        let (coefficients, intercept) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| AnalyticaError::ComputationError("Cannot center an empty design".to_string()))?;
            let y_mean = y.mean().unwrap_or(0.0);

            let x_centered = x - &x_mean.clone().insert_axis(Axis(0));
            let y_centered = y - y_mean;

            let coefficients = solve_least_squares(&x_centered, &y_centered).ok_or_else(|| {
                AnalyticaError::ComputationError("Matrix is singular, cannot solve least squares".to_string())
            })?;
            let intercept = y_mean - coefficients.dot(&x_mean);
            (coefficients, intercept)
        } else {
            let coefficients = solve_least_squares(x, y).ok_or_else(|| {
                AnalyticaError::ComputationError("Matrix is singular, cannot solve least squares".to_string())
            })?;
            (coefficients, 0.0)
        };

        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AnalyticaError::ComputationError(
                "Least squares produced non-finite coefficients".to_string(),
            ));
        }

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);

        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(AnalyticaError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(AnalyticaError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }
}

impl Predictor for LinearRegression {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LinearRegression::predict(self, x)
    }
}

/// L2-regularized logistic regression.
///
/// Two classes use a single sigmoid output; more classes use the multinomial
/// (softmax) loss. The objective is `C * sum(log_loss) + ||W||² / 2`, minimized
/// by batch gradient descent with a step size bounded by the loss curvature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Coefficients, `n_features x n_outputs`
    pub coefficients: Option<Array2<f64>>,
    /// Intercepts, one per output
    pub intercept: Option<Array1<f64>>,
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on the largest gradient component
    pub tol: f64,
    /// Label values seen at fit time, ascending
    classes: Vec<f64>,
    /// Iterations used by the last fit
    n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
            classes: Vec::new(),
            n_iter: 0,
        }
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Fit the model using gradient descent
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_shape(x, y)?;
        if self.c <= 0.0 {
            return Err(AnalyticaError::InvalidParameter {
                name: "c".to_string(),
                value: self.c.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let mut classes: Vec<f64> = y.iter().copied().collect();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();

        if classes.len() < 2 {
            return Err(AnalyticaError::TrainingError(format!(
                "Logistic regression needs at least 2 classes in the training data, found {}",
                classes.len()
            )));
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let n_outputs = if classes.len() == 2 { 1 } else { classes.len() };

        // Targets: a 0/1 column for the binary case, one-hot rows otherwise
        let mut targets = Array2::<f64>::zeros((n_samples, n_outputs));
        for (i, &label) in y.iter().enumerate() {
            let k = classes
                .binary_search_by(|c| c.total_cmp(&label))
                .map_err(|_| AnalyticaError::TrainingError(format!("Unknown label {}", label)))?;
            if n_outputs == 1 {
                targets[[i, 0]] = k as f64;
            } else {
                targets[[i, k]] = 1.0;
            }
        }

        let n = n_samples as f64;
        let penalty = 1.0 / (self.c * n);

        // Lipschitz bound of the mean loss gradient: 0.5 * max ||[x_i, 1]||² + penalty
        let max_sq_norm = x
            .axis_iter(Axis(0))
            .map(|row| row.dot(&row) + 1.0)
            .fold(0.0f64, f64::max);
        let lr = 1.0 / (0.5 * max_sq_norm + penalty);

        let mut weights = Array2::<f64>::zeros((n_features, n_outputs));
        let mut bias = Array1::<f64>::zeros(n_outputs);

        let mut converged = false;
        let mut iterations = 0;
        for iter in 0..self.max_iter {
            iterations = iter + 1;

            let probs = Self::activate(&(x.dot(&weights) + &bias));
            let errors = probs - &targets;

            let grad_w = x.t().dot(&errors) / n + &weights * penalty;
            let grad_b = errors.sum_axis(Axis(0)) / n;

            let max_grad = grad_w
                .iter()
                .chain(grad_b.iter())
                .fold(0.0f64, |m, g| m.max(g.abs()));
            if !max_grad.is_finite() {
                return Err(AnalyticaError::ComputationError(
                    "Logistic regression gradient diverged".to_string(),
                ));
            }
            if max_grad < self.tol {
                converged = true;
                break;
            }

            weights.scaled_add(-lr, &grad_w);
            bias.scaled_add(-lr, &grad_b);
        }

        if !converged {
            tracing::warn!(
                max_iter = self.max_iter,
                "Logistic regression did not converge; keeping the last iterate"
            );
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        self.classes = classes;
        self.n_iter = iterations;

        Ok(self)
    }

    /// Sigmoid for a single output column, row-wise softmax otherwise
    fn activate(z: &Array2<f64>) -> Array2<f64> {
        if z.ncols() == 1 {
            return z.mapv(|v| 1.0 / (1.0 + (-v).exp()));
        }
        let mut out = z.clone();
        for mut row in out.axis_iter_mut(Axis(0)) {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
        out
    }

    /// Class probabilities, `n_samples x n_classes`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (weights, bias) = match (&self.coefficients, &self.intercept) {
            (Some(w), Some(b)) => (w, b),
            _ => return Err(AnalyticaError::ModelNotFitted),
        };
        if x.ncols() != weights.nrows() {
            return Err(AnalyticaError::ShapeError {
                expected: format!("{} features", weights.nrows()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let probs = Self::activate(&(x.dot(weights) + bias));
        if probs.ncols() > 1 {
            return Ok(probs);
        }

        let mut both = Array2::zeros((x.nrows(), 2));
        for (i, &p) in probs.column(0).iter().enumerate() {
            both[[i, 0]] = 1.0 - p;
            both[[i, 1]] = p;
        }
        Ok(both)
    }

    /// Predict class labels; ties go to the lowest label
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        let predictions = proba
            .axis_iter(Axis(0))
            .map(|row| {
                let mut best = 0;
                for (k, &p) in row.iter().enumerate() {
                    if p > row[best] {
                        best = k;
                    }
                }
                self.classes[best]
            })
            .collect();
        Ok(Array1::from_vec(predictions))
    }
}

impl Predictor for LogisticRegression {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LogisticRegression::predict(self, x)
    }
}
