//! Test utilities for autodoc
//!
//! Fakes for the external collaborators plus fixtures for run configurations
//! and document templates. Available to unit tests and, through the
//! `test-utils` feature, to the integration suite.
//!
//! # Example
//!
//! ```rust,no_run
//! use autodoc_cli::params::CacheBuilder;
//! use autodoc_cli::test_utils::{FakeIdentity, FakeWarehouse, sample_run_config};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let warehouse = FakeWarehouse::new().with_models("fr01", &["churn_model"]);
//! let identity = FakeIdentity::new("analyst@example.com");
//! let cache = CacheBuilder::new(&warehouse, &identity)
//!     .build(&sample_run_config(&[("FR", "fr01")]))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod fakes;
pub mod fixtures;

pub use fakes::{FakeIdentity, FakeWarehouse, RecordingStorage};
pub use fixtures::{
    SAMPLE_RUN_CONFIG_YAML, read_docx_part, sample_run_config, write_docx_template,
};

use std::io;
use std::sync::{Arc, Mutex, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging stays
/// off. Safe to call from every test.
///
/// ```bash
/// RUST_LOG=autodoc_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.0.lock().map_err(|_| io::Error::other("lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a thread-local subscriber and returns its result together
/// with everything logged at `level` or above, without ANSI colors.
pub fn capture_logs<R>(level: Level, f: impl FnOnce() -> R) -> (R, String) {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .with_ansi(false)
        .with_max_level(level)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let bytes = sink.0.lock().map(|buf| buf.clone()).unwrap_or_default();
    (result, String::from_utf8_lossy(&bytes).into_owned())
}
