//! The `autodoc` binary end to end, without any cloud access.

use autodoc_cli::params::ParamValue;
use autodoc_cli::test_utils::write_docx_template;
use predicates::prelude::*;

use crate::common::{TWO_COUNTRY_PARAMS, TestProject};

#[test]
fn test_show_text() {
    let project = TestProject::new();
    project.write_params(TWO_COUNTRY_PARAMS);

    project
        .cmd()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("FR"))
        .stdout(predicate::str::contains("name: churn_model"))
        .stdout(predicate::str::contains("name: fraud_model"));
}

#[test]
fn test_show_json_for_one_country() {
    let project = TestProject::new();
    project.write_params(TWO_COUNTRY_PARAMS);

    let output = project
        .cmd()
        .args(["show", "--country", "IT", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1);
    assert_eq!(records[0]["country"], "IT");
    assert_eq!(records[0]["data"]["cutoff"], 0.42);
}

#[test]
fn test_show_without_cache() {
    let project = TestProject::new();

    project
        .cmd()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parameter cache not found"))
        .stderr(predicate::str::contains("autodoc prepare"));
}

#[test]
fn test_show_corrupt_cache() {
    let project = TestProject::new();
    project.write_params("[{\"country\": \"FR\"");

    project
        .cmd()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parameter cache is corrupt"));
}

#[test]
fn test_set_merges_typed_values() {
    let project = TestProject::new();
    project.write_params(TWO_COUNTRY_PARAMS);

    project
        .cmd()
        .args(["set", "FR", "cutoff=0.9", "if_new=false", "reviewer=Jane Doe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 field(s)"));

    let cache = project.read_params();
    let fr = &cache.get("FR").unwrap().data;
    assert_eq!(fr["cutoff"], ParamValue::Float(0.9));
    assert_eq!(fr["if_new"], ParamValue::Bool(false));
    assert_eq!(fr["reviewer"], ParamValue::from("Jane Doe"));
    assert_eq!(fr["name"], ParamValue::from("churn_model"));
    assert_eq!(cache.get("IT").unwrap().data["cutoff"], ParamValue::Float(0.42));
}

#[test]
fn test_set_unknown_country() {
    let project = TestProject::new();
    project.write_params(TWO_COUNTRY_PARAMS);

    project
        .cmd()
        .args(["set", "DE", "cutoff=0.1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No parameter record for country 'DE'"));

    assert_eq!(std::fs::read_to_string(project.params_path()).unwrap(), TWO_COUNTRY_PARAMS);
}

#[test]
fn test_prepare_with_existing_cache_needs_no_run_config() {
    let project = TestProject::new();
    project.write_params(TWO_COUNTRY_PARAMS);

    project
        .cmd()
        .arg("prepare")
        .assert()
        .success()
        .stdout(predicate::str::contains("FR  churn_model  v1  (fr01)"))
        .stdout(predicate::str::contains("IT  fraud_model  v3  (it02)"));

    assert_eq!(std::fs::read_to_string(project.params_path()).unwrap(), TWO_COUNTRY_PARAMS);
}

#[test]
fn test_prepare_without_cache_or_run_config() {
    let project = TestProject::new();

    project
        .cmd()
        .arg("prepare")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Run configuration not found"));
}

#[test]
fn test_prepare_rejects_invalid_run_config() {
    let project = TestProject::new();
    std::fs::write(project.run_config_path(), "fulfill_template: {}\nrun_list: []\n").unwrap();

    project
        .cmd()
        .arg("prepare")
        .assert()
        .failure()
        .stderr(predicate::str::contains("validation failed"));

    assert!(!project.params_path().exists());
}

#[test]
fn test_prepare_build_fails_without_gcloud() {
    let project = TestProject::new();
    std::fs::write(project.run_config_path(), autodoc_cli::test_utils::SAMPLE_RUN_CONFIG_YAML)
        .unwrap();

    project
        .cmd()
        .arg("prepare")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not installed or not found"));

    assert!(!project.params_path().exists());
}

#[test]
fn test_render_without_upload() {
    let project = TestProject::new();
    project.write_params(TWO_COUNTRY_PARAMS);
    write_docx_template(&project.template_path(), "{{ country }}: {{ name }}").unwrap();

    project
        .cmd()
        .args(["render", "--no-upload"])
        .assert()
        .success()
        .stdout(predicate::str::contains("file_to_fill_FR.docx"))
        .stdout(predicate::str::contains("file_to_fill_IT.docx"))
        .stderr(predicate::str::contains("Document for FR rendered"));

    assert!(project.output_dir().join("file_to_fill_FR.docx").is_file());
    assert!(project.output_dir().join("file_to_fill_IT.docx").is_file());
    assert_eq!(
        project.read_params().get("IT").unwrap().data["document_file"],
        ParamValue::from("file_to_fill_IT.docx")
    );
}

#[test]
fn test_render_with_local_upload() {
    let project = TestProject::new();
    project.write_settings("bucket = \"model-docs\"\nbucket_folder = \"path/to/gcs\"\n");
    project.write_params(TWO_COUNTRY_PARAMS);
    write_docx_template(&project.template_path(), "{{ name }}").unwrap();
    let uploads = project.path().join("uploads");

    project
        .cmd()
        .args(["render", "--local-upload"])
        .arg(&uploads)
        .assert()
        .success()
        .stdout(predicate::str::contains("model-docs/path/to/gcs/file_to_fill_FR.docx"));

    assert!(uploads.join("model-docs/path/to/gcs/file_to_fill_FR.docx").is_file());
    assert!(uploads.join("model-docs/path/to/gcs/file_to_fill_IT.docx").is_file());
}

#[test]
fn test_render_requires_bucket_for_upload() {
    let project = TestProject::new();
    project.write_params(TWO_COUNTRY_PARAMS);
    write_docx_template(&project.template_path(), "{{ name }}").unwrap();

    project
        .cmd()
        .arg("render")
        .assert()
        .failure()
        .stderr(predicate::str::contains("'bucket' is not set"));

    assert!(!project.output_dir().exists());
}

#[test]
fn test_bucket_from_environment() {
    let project = TestProject::new();
    project.write_params(TWO_COUNTRY_PARAMS);
    write_docx_template(&project.template_path(), "{{ name }}").unwrap();
    let uploads = project.path().join("uploads");

    project
        .cmd()
        .env("AUTODOC_BUCKET", "env-bucket")
        .args(["render", "--local-upload"])
        .arg(&uploads)
        .assert()
        .success();

    assert!(uploads.join("env-bucket/file_to_fill_FR.docx").is_file());
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let project = TestProject::new();

    project.cmd().args(["-v", "-q", "show"]).assert().failure();
}
