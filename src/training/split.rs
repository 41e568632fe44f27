//! Seeded train/test split

use crate::error::{AnalyticaError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of a train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_samples` with `ChaCha8Rng::seed_from_u64(random_state)` and
/// hold out the first `ceil(test_size * n_samples)` rows for testing.
pub fn train_test_split(n_samples: usize, test_size: f64, random_state: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(AnalyticaError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }

    let n_test = (test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);

    if n_test == 0 || n_train == 0 {
        return Err(AnalyticaError::ValidationError(format!(
            "test_size={} with {} samples leaves {} train and {} test rows; both partitions must be non-empty",
            test_size, n_samples, n_train, n_test
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(random_state);
    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(SplitIndices { train, test: indices })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let split = train_test_split(95, 0.2, 42).unwrap();
        assert_eq!(split.train.len(), 76);
        assert_eq!(split.test.len(), 19);

        let split = train_test_split(10, 0.25, 0).unwrap();
        assert_eq!(split.test.len(), 3);
    }

    #[test]
    fn test_split_is_a_partition() {
        let split = train_test_split(50, 0.2, 7).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seeded() {
        assert_eq!(train_test_split(30, 0.2, 42).unwrap(), train_test_split(30, 0.2, 42).unwrap());
        assert_ne!(train_test_split(30, 0.2, 42).unwrap(), train_test_split(30, 0.2, 43).unwrap());
    }

    #[test]
    fn test_degenerate_splits_fail() {
        assert!(train_test_split(1, 0.2, 42).is_err());
        assert!(train_test_split(0, 0.2, 42).is_err());
        assert!(train_test_split(10, 1.5, 42).is_err());
    }
}
