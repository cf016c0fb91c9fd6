/// Telemetry Module - Structured Logging with Tracing
///
/// - RUST_LOG env var support, falling back to the configured level
/// - JSON vs pretty format
/// - Optional file output through a non-blocking appender
/// - Truncation helper for long hex fields

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, Settings};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub log_level: String,
    pub log_format: LogFormat,
    /// Optional log file path (None = stderr only)
    pub log_file: Option<String>,
}

impl From<&Settings> for TelemetryConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            log_level: settings.log_level.clone(),
            log_format: settings.log_format,
            log_file: settings.log_file.clone(),
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// The returned guard flushes file output on drop; keep it alive for the
/// life of the process.
pub fn init_tracing(config: TelemetryConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let (writer, guard) = match config.log_file {
        Some(log_file_path) => {
            let expanded = shellexpand::tilde(&log_file_path).into_owned();
            let path = std::path::Path::new(&expanded);
            let directory = path.parent()
                .ok_or("Invalid log file path: no parent directory")?;
            let filename = path.file_name()
                .ok_or("Invalid log file path: no filename")?;

            let (non_blocking, guard) = tracing_appender::non_blocking(rolling::never(directory, filename));
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(writer)
            )
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(writer)
            )
            .try_init()?,
    }

    Ok(guard)
}

/// Truncate hex string for logging
///
/// Example: "0a1b2c3d4e5f67890a1b2c3d4e5f6789" (16) → "0a1b2c3d4e5f6789..."
pub fn truncate_hex(hex: &str, len: usize) -> String {
    match hex.get(..len) {
        Some(prefix) if hex.len() > len => format!("{}...", prefix),
        _ => hex.to_string(),
    }
}
