//! Building, reusing and patching the parameter cache through the public API.

use autodoc_cli::config::RunConfig;
use autodoc_cli::core::AutodocError;
use autodoc_cli::params::{CacheBuilder, ParamMap, ParamStore, ParamValue, UpdateOutcome};
use autodoc_cli::test_utils::{
    FakeIdentity, FakeWarehouse, SAMPLE_RUN_CONFIG_YAML, init_test_logging,
};
use chrono::NaiveDate;

use crate::common::TestProject;

fn run_config() -> RunConfig {
    RunConfig::from_yaml_str(SAMPLE_RUN_CONFIG_YAML, "run_config.yaml").unwrap()
}

fn warehouse() -> FakeWarehouse {
    FakeWarehouse::new()
        .with_models("fr01", &["churn_model"])
        .with_models("it02", &["fraud_model", "fraud_model_legacy"])
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

#[tokio::test]
async fn test_first_run_builds_cache_from_run_config() {
    init_test_logging(None);
    let project = TestProject::new();
    let store = ParamStore::new(project.params_path());
    let warehouse = warehouse();
    let identity = FakeIdentity::new("analyst@example.com");

    let cache = store
        .load_or_create(&run_config(), &CacheBuilder::new(&warehouse, &identity).with_date(today()))
        .await
        .unwrap();

    assert_eq!(cache.countries(), vec!["FR", "IT"]);

    let it = cache.get("IT").unwrap();
    assert_eq!(it.data["name"], ParamValue::from("fraud_model"));
    assert_eq!(it.data["model_suffix"], ParamValue::from("model_it02"));
    assert_eq!(it.data["scores_table"], ParamValue::from("analytics.scores_it02"));
    assert_eq!(it.data["owner"], ParamValue::from("Risk Analytics"));
    assert_eq!(it.data["training_date"], ParamValue::from("2023-12-15"));
    assert_eq!(it.data["if_new"], ParamValue::Bool(false));
    assert_eq!(it.data["cutoff"], ParamValue::Float(0.42));
    assert_eq!(it.data["date_last_updated"], ParamValue::Text("16/10/2026".to_string()));

    // Every string field is resolved
    for record in &cache {
        for value in record.data.values() {
            if let Some(text) = value.as_str() {
                assert!(!text.contains("RUN_SUFFIX"), "{}: {text}", record.country);
            }
        }
    }

    assert_eq!(project.read_params(), cache);
}

#[tokio::test]
async fn test_second_run_reuses_cache_and_keeps_edits() {
    let project = TestProject::new();
    let store = ParamStore::new(project.params_path());
    let identity = FakeIdentity::new("analyst@example.com");

    let first_warehouse = warehouse();
    let mut cache = store
        .load_or_create(&run_config(), &CacheBuilder::new(&first_warehouse, &identity))
        .await
        .unwrap();

    let patch = ParamMap::from([("cutoff".to_string(), ParamValue::Float(0.9))]);
    let outcome = store.update(&mut cache, "FR", &patch).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::Updated);

    // A later run with a different warehouse state sees the edited file untouched
    let second_warehouse = FakeWarehouse::new().with_models("fr01", &["other"]);
    let reloaded = store
        .load_or_create(&run_config(), &CacheBuilder::new(&second_warehouse, &identity))
        .await
        .unwrap();

    assert_eq!(reloaded, cache);
    assert_eq!(reloaded.get("FR").unwrap().data["cutoff"], ParamValue::Float(0.9));
    assert!(second_warehouse.queried().is_empty());
    assert_eq!(identity.calls(), 1);
}

#[tokio::test]
async fn test_missing_model_aborts_without_writing() {
    let project = TestProject::new();
    let store = ParamStore::new(project.params_path());
    let warehouse = FakeWarehouse::new().with_models("fr01", &["churn_model"]);
    let identity = FakeIdentity::new("analyst@example.com");

    let err = store
        .load_or_create(&run_config(), &CacheBuilder::new(&warehouse, &identity))
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<AutodocError>(),
        Some(&AutodocError::LookupEmpty {
            table_suffix: "it02".to_string()
        })
    );
    assert!(!project.params_path().exists());
}

#[tokio::test]
async fn test_update_unknown_country_reports_not_found() {
    let project = TestProject::new();
    project.write_params(crate::common::TWO_COUNTRY_PARAMS);
    let store = ParamStore::new(project.params_path());
    let before = std::fs::read_to_string(project.params_path()).unwrap();

    let patch = ParamMap::from([("cutoff".to_string(), ParamValue::Float(0.1))]);
    let outcome = store.update_on_disk("DE", &patch).await.unwrap();

    assert_eq!(outcome, UpdateOutcome::NotFound);
    assert_eq!(std::fs::read_to_string(project.params_path()).unwrap(), before);
}
