//! Logging configuration
//!
//! Console logs go to stderr so they never mix with command output on stdout.
//! An optional JSON file layer is added when a log directory is configured.

use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Overrides the log directory from the config file
pub const LOG_PATH_ENV: &str = "BLUEPRINTCTL_LOG_PATH";

const LOG_FILE_NAME: &str = "blueprintctl.log";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,             // used when RUST_LOG is unset
    pub file_dir: Option<PathBuf>, // JSON log directory
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file_dir: None,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Environment variables win over the given defaults
    pub fn with_env(mut self) -> Self {
        if let Ok(dir) = std::env::var(LOG_PATH_ENV) {
            self.file_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Install the global subscriber. Keep the returned guard alive until exit
    /// so buffered file logs are flushed.
    pub fn init(&self) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
        let env_filter =
            EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&self.level))?;

        let console_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_ansi(self.ansi)
            .with_writer(io::stderr);

        match &self.file_dir {
            Some(dir) => {
                let (writer, guard) = non_blocking(rolling::never(dir, LOG_FILE_NAME));
                let file_layer = fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .json()
                    .with_writer(writer);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(console_layer)
                    .with(file_layer)
                    .try_init()?;

                tracing::debug!(level = %self.level, dir = %dir.display(), "logging initialized");
                Ok(Some(guard))
            }
            None => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(console_layer)
                    .try_init()?;

                tracing::debug!(level = %self.level, "logging initialized");
                Ok(None)
            }
        }
    }
}
