/// File logging configuration.
///
/// Logs are stored in the data root under `logs/`.
/// Each CLI session appends to the log file with a clear separator.
use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file name inside `{data_root}/logs/`
pub const LOG_FILENAME: &str = "lovemeter.log";

/// Initializes logging for one CLI session.
///
/// Logs are written to `{data_root}/logs/lovemeter.log`.
/// Each session starts with a separator containing timestamp and command.
///
/// # Arguments
///
/// * `data_root` - Path to the data directory
/// * `command` - Name of the command being run, for log context
pub fn init_logging(data_root: &Path, command: &str) -> Result<()> {
    let log_dir = data_root.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    // Write session separator before the subscriber starts appending
    let separator = format!(
        "\n{sep}\n[{ts}] New session: {command}\n{sep}\n",
        sep = "=".repeat(80),
        ts = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
        command = command
    );

    use std::io::Write;
    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILENAME))
    {
        let _ = writeln!(file, "{}", separator);
    }

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILENAME);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    // Default to INFO level, but allow override via RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .ok(); // Ignore error if already initialized

    tracing::info!("Logging initialized for command: {}", command);

    Ok(())
}
