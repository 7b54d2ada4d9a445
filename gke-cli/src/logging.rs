///! Logging configuration
///! Console logging to stderr, optionally mirrored as JSON into a log directory

use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,              // log level (trace, debug, info, warn, error)
    pub json_format: bool,          // use JSON formatting on the console
    pub log_dir: Option<PathBuf>,   // directory for gkectl.log
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            log_dir: None,
        }
    }
}

impl LoggingConfig {
    /// Map the repeated `-v` flag to a level
    pub fn from_verbosity(verbose: u8) -> Self {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        Self {
            level: level.to_string(),
            ..Default::default()
        }
    }

    /// Install the global subscriber. Keep the returned guard alive until exit
    /// so buffered file output is flushed.
    pub fn init(&self) -> Option<WorkerGuard> {
        // RUST_LOG wins over the configured level
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.level));

        let console_layer = if self.json_format {
            fmt::layer()
                .json()
                .with_target(true)
                .with_writer(io::stderr)
                .boxed()
        } else {
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_ansi(true)
                .with_writer(io::stderr)
                .boxed()
        };

        // An unusable log directory degrades to console-only logging
        let mut file_error = None;
        let appender = self.log_dir.as_deref().and_then(|dir| match file_appender(dir) {
            Ok(appender) => Some(appender),
            Err(e) => {
                file_error = Some((dir.to_path_buf(), e));
                None
            }
        });

        let guard = match appender {
            Some(appender) => {
                let (writer, guard) = non_blocking(appender);
                let file_layer = fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .json()
                    .with_writer(writer);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(console_layer)
                    .with(file_layer)
                    .init();
                Some(guard)
            }
            None => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(console_layer)
                    .init();
                None
            }
        };

        if let Some((dir, e)) = file_error {
            tracing::warn!(dir = %dir.display(), error = %e, "Cannot write log file, logging to console only");
        }
        guard
    }
}

/// Non-rotating `gkectl.log` in `dir`, creating the directory if needed
fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("gkectl.log")
        .build(dir)
}
