//! End-to-end runs: pipeline, summary tables and the SQLite export.

use maturity_core::{
    config::AssessmentConfig,
    error::MaturityError,
    impact::ImpactTarget,
    pipeline::AssessmentPipeline,
    store::AssessmentStore,
    types::State,
};

fn test_store() -> AssessmentStore {
    let store = AssessmentStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

#[test]
fn default_test_run_produces_consistent_report() {
    let _ = env_logger::builder().is_test(true).try_init();

    let output = AssessmentPipeline::new(AssessmentConfig::default_test())
        .unwrap()
        .run()
        .unwrap();
    let report = &output.report;

    assert_eq!(report.company_count, 200);
    assert_eq!(report.seed, 7);
    assert_eq!(report.categories.len(), 6);
    assert_eq!(output.dataset.len(), 200);
    assert!(report.significance.significant);
    assert!(report.summary.mean_after > report.summary.mean_before);
    assert!(
        (report.summary.mean_growth - (report.summary.mean_after - report.summary.mean_before)).abs()
            < 1e-9
    );
    assert_eq!(report.regression.target, Some(ImpactTarget::AfterAggregate));
    assert!((0.0..=1.0).contains(&report.regression.r_squared));
}

#[test]
fn invalid_config_fails_before_running() {
    let config = AssessmentConfig { company_count: 0, ..AssessmentConfig::default_test() };
    let err = AssessmentPipeline::new(config).err().expect("should fail");
    assert!(matches!(err, MaturityError::InvalidInput { .. }), "got {err:?}");

    let config = AssessmentConfig { alpha: 1.2, ..AssessmentConfig::default_test() };
    assert!(AssessmentPipeline::new(config).is_err());
}

#[test]
fn too_few_companies_surface_insufficient_data() {
    let config = AssessmentConfig { company_count: 3, ..AssessmentConfig::default_test() };
    let err = AssessmentPipeline::new(config).unwrap().run().err().expect("should fail");
    assert!(matches!(err, MaturityError::InsufficientData { .. }), "got {err:?}");
}

#[test]
fn summary_tables_follow_the_dataset() {
    let output = AssessmentPipeline::new(AssessmentConfig::default_test())
        .unwrap()
        .with_leaderboard_size(5)
        .run()
        .unwrap();
    let summary = &output.report.summary;
    let after = output.dataset.aggregate(State::After);

    assert_eq!(summary.top.len(), 5);
    assert_eq!(summary.bottom.len(), 5);
    let best = after.iter().cloned().fold(f64::MIN, f64::max);
    let worst = after.iter().cloned().fold(f64::MAX, f64::min);
    assert_eq!(summary.top[0].after_aggregate, best);
    assert_eq!(summary.bottom[0].after_aggregate, worst);
    assert!(summary.top.windows(2).all(|w| w[0].after_aggregate >= w[1].after_aggregate));

    let companies: usize = summary.sector_growth.iter().map(|s| s.companies).sum();
    assert_eq!(companies, 200);
    assert!(summary.sector_growth.windows(2).all(|w| w[0].sector < w[1].sector));

    let corr = &summary.after_correlation;
    assert_eq!(corr.get("AI", "AI"), Some(1.0));
    assert_eq!(corr.get("AI", "Strategy"), corr.get("Strategy", "AI"));
    assert!(corr.values.iter().flatten().all(|r| (-1.0..=1.0).contains(r)));
}

#[test]
fn delta_target_is_threaded_through() {
    let output = AssessmentPipeline::new(AssessmentConfig::default_test())
        .unwrap()
        .with_target(ImpactTarget::AggregateDelta)
        .run()
        .unwrap();
    assert_eq!(output.report.regression.target, Some(ImpactTarget::AggregateDelta));
}

#[test]
fn store_round_trips_flat_rows_and_report() {
    let output = AssessmentPipeline::new(AssessmentConfig::default_test())
        .unwrap()
        .run()
        .unwrap();
    let store = test_store();
    store.insert_run("run-test", 7, 200, "0.1.0-test").unwrap();
    store.insert_dataset("run-test", &output.dataset).unwrap();
    store.save_report("run-test", &output.report).unwrap();

    assert_eq!(store.company_count("run-test").unwrap(), 200);
    assert_eq!(store.category_score_count("run-test").unwrap(), 200 * 6);

    let (before, after) = store.aggregate_columns("run-test").unwrap();
    assert_eq!(before, output.dataset.aggregate(State::Before));
    assert_eq!(after, output.dataset.aggregate(State::After));

    let json = store.report_json("run-test").unwrap().expect("report stored");
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["company_count"], 200);
    assert!(value["significance"]["p_value"].is_number());
    assert!(store.report_json("missing").unwrap().is_none());
}

#[test]
fn dataset_rows_require_a_registered_run() {
    let output = AssessmentPipeline::new(AssessmentConfig::default_test())
        .unwrap()
        .run()
        .unwrap();
    let store = test_store();
    let err = store.insert_dataset("no-such-run", &output.dataset).unwrap_err();
    assert!(matches!(err, MaturityError::Database(_)), "got {err:?}");
}

#[test]
fn file_store_opens_in_wal_mode_and_keeps_rows() {
    let pipeline = AssessmentPipeline::new(AssessmentConfig::default_test()).unwrap();
    let output = pipeline.run().unwrap();
    let config = pipeline.config();

    let path = std::env::temp_dir().join(format!("maturity-store-{}.db", std::process::id()));
    let path_str = path.to_str().expect("utf-8 temp path").to_string();
    {
        let store = AssessmentStore::open(&path_str).unwrap();
        store.migrate().unwrap();
        store
            .insert_run("run-file", config.seed, config.company_count, "0.1.0-test")
            .unwrap();
        store.insert_dataset("run-file", &output.dataset).unwrap();
        assert_eq!(store.company_count("run-file").unwrap(), config.company_count as i64);
    }
    let reopened = AssessmentStore::open(&path_str).unwrap();
    assert_eq!(reopened.company_count("run-file").unwrap(), 200);
    drop(reopened);

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path_str}{suffix}"));
    }
}
