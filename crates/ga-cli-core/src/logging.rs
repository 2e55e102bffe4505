//! Tracing setup: a debug-level log file plus warnings on stderr.

use std::io;
use std::path::{Path, PathBuf};

use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

use crate::config::{self, APP_DIR};

/// Environment variable with `EnvFilter` directives for the log file
pub const LOG_ENV: &str = "GA_CLI_LOG";

/// Log file name inside the log directory
pub const LOG_FILE: &str = "ga-cli.log";

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory holding the log file; `None` disables file logging
    pub log_dir: Option<PathBuf>,
    pub file_level: LevelFilter,
    pub console_level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: dirs::home_dir().map(|home| home.join(APP_DIR)),
            file_level: LevelFilter::DEBUG,
            console_level: LevelFilter::WARN,
        }
    }
}

/// Keeps the background log writer alive; flushes on drop.
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingGuard {
    /// Path of the active log file, if file logging is enabled
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

#[derive(Debug, thiserror::Error)]
enum FileLogError {
    #[error(transparent)]
    Dir(#[from] config::ConfigError),

    #[error("cannot open log file: {0}")]
    Open(#[from] InitError),
}

fn open_log_file(dir: &Path) -> Result<(NonBlocking, WorkerGuard), FileLogError> {
    config::ensure_private_dir(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(dir)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber.
///
/// If the log file cannot be opened, logging continues on stderr only and a
/// warning says why. Installing twice is a no-op.
pub fn init(config: LogConfig) -> LoggingGuard {
    let mut file_error = None;
    let mut worker = None;
    let mut log_file = None;

    let file_layer = match config.log_dir.as_deref().map(|dir| (dir, open_log_file(dir))) {
        Some((dir, Ok((writer, guard)))) => {
            worker = Some(guard);
            log_file = Some(dir.join(LOG_FILE));

            let filter = EnvFilter::builder()
                .with_default_directive(config.file_level.into())
                .with_env_var(LOG_ENV)
                .from_env_lossy();
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(filter),
            )
        }
        Some((dir, Err(err))) => {
            file_error = Some((dir.to_path_buf(), err));
            None
        }
        None => None,
    };

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(config.console_level);

    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init();

    if let Some((dir, err)) = file_error {
        warn!(dir = %dir.display(), error = %err, "File logging disabled");
    }

    LoggingGuard {
        _worker: worker,
        log_file,
    }
}
