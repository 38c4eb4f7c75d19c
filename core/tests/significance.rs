//! Paired t-test over Before/After aggregates.

use maturity_core::{
    config::AssessmentConfig,
    dataset::DatasetBuilder,
    error::MaturityError,
    significance::{SignificanceTester, DEFAULT_ALPHA},
};

#[test]
fn unequal_lengths_are_mismatched() {
    let before = [1.0, 2.0, 3.0, 4.0, 5.0];
    let after = [2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
    let err = SignificanceTester::default().test(&before, &after).unwrap_err();
    assert!(
        matches!(err, MaturityError::MismatchedLength { before: 5, after: 6 }),
        "got {err:?}"
    );
}

#[test]
fn identical_sequences_are_degenerate() {
    let scores = [40.0, 55.5, 61.0, 72.25, 38.0];
    let err = SignificanceTester::default().test(&scores, &scores).unwrap_err();
    assert!(matches!(err, MaturityError::DegenerateInput { .. }), "got {err:?}");
}

#[test]
fn fractional_constant_shift_is_degenerate() {
    // Adding 0.1 leaves differences that vary only by rounding residue.
    let before: Vec<f64> = (0..50).map(|i| 10.1 + 1.37 * i as f64).collect();
    let after: Vec<f64> = before.iter().map(|b| b + 0.1).collect();
    let err = SignificanceTester::default().test(&before, &after).unwrap_err();
    assert!(matches!(err, MaturityError::DegenerateInput { .. }), "got {err:?}");
}

#[test]
fn uniform_category_shift_of_aggregates_is_degenerate() {
    // Six-category means shifted by the same amount in every category.
    let rows: Vec<[f64; 6]> = (0..30)
        .map(|i| {
            let base = 20.0 + i as f64;
            [base, base + 7.0, base + 3.0, base + 11.0, base + 1.0, base + 5.0]
        })
        .collect();
    let mean6 = |r: &[f64; 6]| r.iter().sum::<f64>() / 6.0;
    let before: Vec<f64> = rows.iter().map(mean6).collect();
    let after: Vec<f64> = rows
        .iter()
        .map(|r| {
            let shifted = r.map(|v| v + 12.3);
            mean6(&shifted)
        })
        .collect();
    let err = SignificanceTester::default().test(&before, &after).unwrap_err();
    assert!(matches!(err, MaturityError::DegenerateInput { .. }), "got {err:?}");
}

#[test]
fn empty_sequences_are_degenerate() {
    let err = SignificanceTester::default().test(&[], &[]).unwrap_err();
    assert!(matches!(err, MaturityError::DegenerateInput { .. }));
}

#[test]
fn swapping_inputs_negates_statistic_and_keeps_p_value() {
    let before = [41.0, 38.5, 52.0, 47.0, 60.0, 33.0, 49.5];
    let after = [44.0, 37.0, 58.5, 51.0, 61.0, 39.0, 50.0];
    let tester = SignificanceTester::default();
    let forward = tester.test(&before, &after).unwrap();
    let backward = tester.test(&after, &before).unwrap();

    assert_eq!(forward.statistic, -backward.statistic);
    assert_eq!(forward.p_value, backward.p_value);
    assert_eq!(forward.significant, backward.significant);
    assert!(forward.statistic > 0.0, "after is higher, t should be positive");
}

#[test]
fn generated_improvement_is_significant() {
    let ds = DatasetBuilder::from_config(&AssessmentConfig::default())
        .unwrap()
        .build(1000, 42)
        .unwrap();
    let result = SignificanceTester::default().test_dataset(&ds).unwrap();

    assert_eq!(result.n, 1000);
    assert_eq!(result.degrees_of_freedom, 999.0);
    assert_eq!(result.alpha_used, DEFAULT_ALPHA);
    assert!(result.significant);
    assert!(result.p_value < 1e-10, "p = {}", result.p_value);
    assert!(result.mean_difference > 30.0, "mean diff {}", result.mean_difference);
    assert!(result.effect_size > 1.0);
    assert!((result.statistic - result.mean_difference / result.std_error).abs() < 1e-9);
}

#[test]
fn noise_only_difference_is_not_significant_under_strict_alpha() {
    // Shifts alternate in sign and cancel; the mean difference is zero.
    let before: Vec<f64> = (0..40).map(|i| 50.0 + i as f64 * 0.5).collect();
    let after: Vec<f64> = before
        .iter()
        .enumerate()
        .map(|(i, b)| if i % 2 == 0 { b + 1.0 } else { b - 1.0 })
        .collect();
    let result = SignificanceTester::new(0.01).unwrap().test(&before, &after).unwrap();
    assert!(result.mean_difference.abs() < 1e-12);
    assert!(result.p_value > 0.99, "p = {}", result.p_value);
    assert!(!result.significant);
    assert_eq!(result.alpha_used, 0.01);
}
