//! Feature scaling implementations

use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// No scaling
    None,
}

/// Unfitted scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
}

/// Parameters of a fitted scaler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedScaler {
    center: f64,
    scale: f64,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self { scaler_type }
    }

    /// Learn centering and scaling from imputed training values.
    ///
    /// Standard scaling uses the population standard deviation; a constant
    /// column keeps a scale of 1 so it maps to zeros instead of NaN.
    pub fn fit(&self, values: &[f64]) -> FittedScaler {
        match self.scaler_type {
            ScalerType::None => FittedScaler { center: 0.0, scale: 1.0 },
            ScalerType::Standard => {
                if values.is_empty() {
                    return FittedScaler { center: 0.0, scale: 1.0 };
                }
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = variance.sqrt();
                let scale = if std > f64::EPSILON * mean.abs().max(1.0) { std } else { 1.0 };
                FittedScaler { center: mean, scale }
            }
        }
    }
}

impl FittedScaler {
    pub fn center(&self) -> f64 {
        self.center
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn transform_value(&self, value: f64) -> f64 {
        (value - self.center) / self.scale
    }

    /// Reverse the transformation of a single value
    #[inline]
    pub fn inverse_transform_value(&self, value: f64) -> f64 {
        value * self.scale + self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler_zero_mean_unit_variance() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let fitted = Scaler::new(ScalerType::Standard).fit(&values);

        let scaled: Vec<f64> = values.iter().map(|&v| fitted.transform_value(v)).collect();
        let mean = scaled.iter().sum::<f64>() / scaled.len() as f64;
        let var = scaled.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / scaled.len() as f64;

        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let fitted = Scaler::new(ScalerType::Standard).fit(&[7.0, 7.0, 7.0]);
        assert_eq!(fitted.scale(), 1.0);
        assert_eq!(fitted.transform_value(7.0), 0.0);
    }

    #[test]
    fn test_inverse_round_trip() {
        let fitted = Scaler::new(ScalerType::Standard).fit(&[2.0, 4.0, 9.0]);
        let v = 5.5;
        assert!((fitted.inverse_transform_value(fitted.transform_value(v)) - v).abs() < 1e-12);
    }

    #[test]
    fn test_none_scaler_is_identity() {
        let fitted = Scaler::new(ScalerType::None).fit(&[10.0, 20.0]);
        assert_eq!(fitted.transform_value(3.0), 3.0);
    }
}
