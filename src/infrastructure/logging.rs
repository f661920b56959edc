//! # Logging
//!
//! Two sinks:
//! - console diagnostics through the global `tracing` subscriber (stderr)
//! - the call log, a daily-rotated file recording every response text
//!
//! The call log is not ambient state. It is a `CallLog` handle owning its own
//! subscriber, handed to the dispatcher by whoever builds it.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Call log files are `llm_calls.YYYY-MM-DD.log`
pub const CALL_LOG_PREFIX: &str = "llm_calls";
pub const CALL_LOG_SUFFIX: &str = "log";

const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Install the global console subscriber.
pub fn init_console() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

/// Handle to the per-day call log.
///
/// Dropping the handle flushes pending lines.
pub struct CallLog {
    dispatch: Option<Dispatch>,
    _guard: Option<WorkerGuard>,
}

impl CallLog {
    /// Open (or create) the call log under `dir`.
    pub fn daily(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(CALL_LOG_PREFIX)
            .filename_suffix(CALL_LOG_SUFFIX)
            .build(dir)
            .context("Failed to open call log")?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = tracing_subscriber::fmt()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        Ok(Self {
            dispatch: Some(Dispatch::new(subscriber)),
            _guard: Some(guard),
        })
    }

    /// A call log that records nothing.
    pub fn disabled() -> Self {
        Self {
            dispatch: None,
            _guard: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.dispatch.is_some()
    }

    pub fn response(&self, text: &str) {
        self.emit(|| tracing::info!("RESPONSE: {}", text));
    }

    fn emit(&self, event: impl FnOnce()) {
        if let Some(dispatch) = &self.dispatch {
            tracing::dispatcher::with_default(dispatch, event);
        }
    }
}

impl std::fmt::Debug for CallLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallLog")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
