//! Integration tests for feature classification and the preprocessing plan

use analytica_core::error::AnalyticaError;
use analytica_core::preprocessing::{
    classify_features, FeaturePartition, HandleUnknown, PreprocessingConfig, PreprocessingPlan,
};
use polars::prelude::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn category(code: u8) -> String {
    format!("k{}", code)
}

/// Frame whose columns are numeric where `kinds[i]` is true and text otherwise
fn mixed_frame(kinds: &[bool], n_rows: usize) -> DataFrame {
    let mut columns: Vec<Column> = kinds
        .iter()
        .enumerate()
        .map(|(i, &numeric)| {
            let name = format!("c{}", i);
            if numeric {
                let values: Vec<f64> = (0..n_rows).map(|r| (r * (i + 1)) as f64).collect();
                Column::from(Series::new(name.into(), values))
            } else {
                let values: Vec<String> = (0..n_rows).map(|r| category((r % 3) as u8)).collect();
                Column::from(Series::new(name.into(), values))
            }
        })
        .collect();
    columns.push(Column::from(Series::new("target".into(), vec![1.0; n_rows])));
    DataFrame::new(columns).unwrap()
}

// ============================================================================
// Feature classification
// ============================================================================

proptest! {
    #[test]
    fn prop_partition_covers_every_feature_once(
        kinds in prop::collection::vec(any::<bool>(), 0..8),
        n_rows in 1usize..6,
    ) {
        let df = mixed_frame(&kinds, n_rows);
        let partition = classify_features(&df, "target").unwrap();

        let expected_numeric: Vec<String> = kinds
            .iter()
            .enumerate()
            .filter(|(_, &n)| n)
            .map(|(i, _)| format!("c{}", i))
            .collect();
        let expected_categorical: Vec<String> = kinds
            .iter()
            .enumerate()
            .filter(|(_, &n)| !n)
            .map(|(i, _)| format!("c{}", i))
            .collect();

        prop_assert_eq!(&partition.numeric, &expected_numeric);
        prop_assert_eq!(&partition.categorical, &expected_categorical);
        prop_assert_eq!(partition.len(), kinds.len());
        prop_assert!(!partition.numeric.contains(&"target".to_string()));
        prop_assert!(!partition.categorical.contains(&"target".to_string()));
    }

    #[test]
    fn prop_width_is_learned_from_training_rows_only(
        train_codes in prop::collection::vec(0u8..5, 1..12),
        test_codes in prop::collection::vec(prop::option::of(0u8..8), 1..12),
    ) {
        let train_values: Vec<String> = train_codes.iter().map(|&c| category(c)).collect();
        let train_numeric: Vec<f64> = (0..train_codes.len()).map(|i| i as f64).collect();
        let train = df!("num" => train_numeric, "cat" => train_values).unwrap();

        let test_values: Vec<Option<String>> = test_codes.iter().map(|c| c.map(category)).collect();
        let test_numeric: Vec<Option<f64>> = vec![None; test_codes.len()];
        let test = df!("num" => test_numeric, "cat" => test_values).unwrap();

        let partition = FeaturePartition {
            numeric: vec!["num".to_string()],
            categorical: vec!["cat".to_string()],
        };
        let fitted = PreprocessingPlan::new(partition, PreprocessingConfig::default())
            .fit(&train)
            .unwrap();

        let distinct_train: BTreeSet<u8> = train_codes.iter().copied().collect();
        let expected_width = 1 + distinct_train.len();

        let x_test = fitted.transform(&test).unwrap();
        prop_assert_eq!(x_test.ncols(), expected_width);
        prop_assert_eq!(x_test.nrows(), test_codes.len());
        prop_assert!(x_test.iter().all(|v| v.is_finite()));

        // Each row carries at most one indicator
        for row in x_test.rows() {
            let hot: f64 = row.iter().skip(1).sum();
            prop_assert!(hot == 0.0 || hot == 1.0);
        }
    }
}

#[test]
fn test_target_excluded_from_partition() {
    let df = df!(
        "age" => &[30.0, 40.0],
        "city" => &["x", "y"],
        "label" => &["a", "b"]
    )
    .unwrap();

    let partition = classify_features(&df, "label").unwrap();
    assert_eq!(partition.numeric, vec!["age"]);
    assert_eq!(partition.categorical, vec!["city"]);
}

#[test]
fn test_unsupported_dtype_is_rejected() {
    let dates = Series::new("when".into(), &[1i32, 2])
        .cast(&DataType::Date)
        .unwrap();
    let df = DataFrame::new(vec![
        Column::from(dates),
        Column::from(Series::new("y".into(), &[0.0, 1.0])),
    ])
    .unwrap();

    let err = classify_features(&df, "y").unwrap_err();
    assert!(matches!(err, AnalyticaError::UnknownColumnKind { ref column, .. } if column == "when"));
}

// ============================================================================
// Fit on train, transform test
// ============================================================================

#[test]
fn test_statistics_come_from_training_rows() {
    let train = df!(
        "num" => &[Some(1.0), Some(2.0), Some(3.0), None],
        "cat" => &[Some("a"), Some("b"), Some("b"), None]
    )
    .unwrap();
    let test = df!(
        "num" => &[Some(5.0), None],
        "cat" => &[Some("zzz"), None]
    )
    .unwrap();

    let partition = classify_features(&train, "missing_target").unwrap();
    let fitted = PreprocessingPlan::new(partition, PreprocessingConfig::default())
        .fit(&train)
        .unwrap();
    assert_eq!(fitted.feature_names_out(), vec!["num", "cat_a", "cat_b"]);
    assert_eq!(fitted.n_samples_seen(), 4);

    let x = fitted.transform(&test).unwrap();

    // Train column after median fill is [1, 2, 3, 2]: mean 2, population std sqrt(0.5)
    let std = 0.5f64.sqrt();
    assert!((x[[0, 0]] - 3.0 / std).abs() < 1e-9);
    // Missing test value takes the training median, which scales to 0
    assert!(x[[1, 0]].abs() < 1e-9);

    // Unseen category encodes as all zeros; missing takes the training mode "b"
    assert_eq!(x.row(0).to_vec()[1..], [0.0, 0.0]);
    assert_eq!(x.row(1).to_vec()[1..], [0.0, 1.0]);
}

#[test]
fn test_strict_unknown_policy_errors() {
    let train = df!("cat" => &["a", "b"]).unwrap();
    let test = df!("cat" => &["c"]).unwrap();
    let partition = FeaturePartition {
        numeric: vec![],
        categorical: vec!["cat".to_string()],
    };
    let config = PreprocessingConfig::default().with_handle_unknown(HandleUnknown::Error);
    let fitted = PreprocessingPlan::new(partition, config).fit(&train).unwrap();

    assert!(matches!(
        fitted.transform(&test),
        Err(AnalyticaError::PreprocessingError(_))
    ));
}

#[test]
fn test_empty_groups_produce_empty_matrix() {
    let df = df!("y" => &[1.0, 2.0, 3.0]).unwrap();
    let partition = classify_features(&df, "y").unwrap();
    assert!(partition.is_empty());

    let (fitted, x) = PreprocessingPlan::new(partition, PreprocessingConfig::default())
        .fit_transform(&df)
        .unwrap();
    assert_eq!(fitted.n_features_out(), 0);
    assert_eq!(x.dim(), (3, 0));
}
