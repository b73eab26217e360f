//! Shared project layout for integration tests.

use assert_cmd::Command;
use autodoc_cli::params::{Cache, CacheRead, read_cache};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch working directory with a settings file pointing into it.
pub struct TestProject {
    temp: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let project = Self {
            temp: TempDir::new().unwrap(),
        };
        project.write_settings("");
        project
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn settings_path(&self) -> PathBuf {
        self.path().join("autodoc.toml")
    }

    pub fn params_path(&self) -> PathBuf {
        self.path().join("fulfill_params.json")
    }

    pub fn run_config_path(&self) -> PathBuf {
        self.path().join("run_config.yaml")
    }

    pub fn template_path(&self) -> PathBuf {
        self.path().join("for_test.docx")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path().join("out")
    }

    /// Writes the settings file with every path inside the project; `extra`
    /// is appended verbatim.
    pub fn write_settings(&self, extra: &str) {
        let content = format!(
            "params_file = {:?}\nrun_config = {:?}\ndoc_template = {:?}\noutput_dir = {:?}\n\
             gcloud_path = {:?}\nlock_timeout_secs = 5\n{extra}",
            self.params_path(),
            self.run_config_path(),
            self.template_path(),
            self.output_dir(),
            self.path().join("no-gcloud"),
        );
        std::fs::write(self.settings_path(), content).unwrap();
    }

    pub fn write_params(&self, json: &str) {
        std::fs::write(self.params_path(), json).unwrap();
    }

    pub fn read_params(&self) -> Cache {
        match read_cache(&self.params_path()) {
            CacheRead::Found(cache) => cache,
            other => panic!("expected a parameter cache, got {other:?}"),
        }
    }

    /// `autodoc --settings <project settings>` with a clean logging environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("autodoc").unwrap();
        cmd.current_dir(self.path())
            .env_remove("RUST_LOG")
            .env_remove("AUTODOC_SETTINGS")
            .env_remove("AUTODOC_PROJECT_ID")
            .env_remove("AUTODOC_BUCKET")
            .env_remove("AUTODOC_PARAMS_FILE")
            .env("NO_COLOR", "1")
            .arg("--settings")
            .arg(self.settings_path());
        cmd
    }
}

/// Two-country cache as `autodoc prepare` would have written it.
pub const TWO_COUNTRY_PARAMS: &str = r#"[
  {
    "country": "FR",
    "data": {
      "country": "FR",
      "cutoff": 0.5,
      "date_last_updated": "16/10/2026",
      "if_new": true,
      "model_suffix": "model_fr01",
      "name": "churn_model",
      "prepared_by": "analyst@example.com",
      "suffix_main": "fr01",
      "training_date": "2024-01-01",
      "version": "v1"
    }
  },
  {
    "country": "IT",
    "data": {
      "country": "IT",
      "cutoff": 0.42,
      "date_last_updated": "16/10/2026",
      "if_new": false,
      "model_suffix": "model_it02",
      "name": "fraud_model",
      "prepared_by": "analyst@example.com",
      "suffix_main": "it02",
      "training_date": "2023-12-15",
      "version": "v3"
    }
  }
]
"#;
