use std::path::Path;
use std::sync::OnceLock;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where log output goes in addition to the console.
#[derive(Debug, Clone, Copy)]
pub struct LogTarget<'a> {
    /// Directory for the daily-rolling log file. `None` logs to the console only.
    pub dir: Option<&'a Path>,
    /// File name prefix of the rolling log file.
    pub file_prefix: &'a str,
}

impl Default for LogTarget<'_> {
    fn default() -> Self {
        Self {
            dir: None,
            file_prefix: "harmonize",
        }
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides `base_level` when set. Warnings and errors go to stderr,
/// everything else to stdout. A second call returns an error.
pub fn setup_logging(base_level: &str, target: LogTarget<'_>) -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(base_level))
        .map_err(|e| format!("Invalid log filter '{}': {}", base_level, e))?;

    let console_writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(true)
        .with_writer(console_writer);

    let file_layer = match target.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                format!("Failed to create log directory '{}': {}", dir.display(), e)
            })?;

            let file_appender = tracing_appender::rolling::Builder::new()
                .rotation(tracing_appender::rolling::Rotation::DAILY)
                .filename_prefix(target.file_prefix)
                .filename_suffix("log")
                .max_log_files(5)
                .build(dir)
                .map_err(|e| format!("Failed to create log file appender: {}", e))?;

            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            if LOG_GUARD.set(guard).is_err() {
                return Err("Logging already initialized".to_string());
            }

            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .with_writer(file_writer),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| format!("Logger initialization failed: {}", e))
}
