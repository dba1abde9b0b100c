//! Logging Infrastructure
//!
//! Structured logging setup plus retention for the daily-rolling log
//! files. File output uses the `uprl-server` prefix, so retention only
//! ever touches files this service wrote.

use std::path::Path;
use std::time::{Duration, SystemTime};

/// Prefix of the rolling log files written by this service
const LOG_FILE_PREFIX: &str = "uprl-server";

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional JSON format and file output
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level
        .unwrap_or("info")
        .parse()
        .unwrap_or(tracing::Level::INFO);
    let json = json.unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let file_appender = log_dir
        .map(Path::new)
        .filter(|path| path.exists())
        .and_then(|path| path.to_str())
        .map(|dir| tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));

    match (json, file_appender) {
        (true, Some(appender)) => builder.json().with_writer(appender).init(),
        (true, None) => builder.json().init(),
        (false, Some(appender)) => builder.with_writer(appender).init(),
        (false, None) => builder.init(),
    }
}

/// Delete this service's log files older than `days` days
///
/// Only files carrying the rolling prefix are considered; anything else
/// in the directory is left alone. Returns the number of files removed.
pub fn cleanup_old_logs(log_dir: &str, days: u64) -> std::io::Result<usize> {
    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(days.saturating_mul(24 * 60 * 60)));
    let Some(cutoff) = cutoff else {
        return Ok(0);
    };
    remove_logs_older_than(log_dir, cutoff)
}

fn remove_logs_older_than(log_dir: &str, cutoff: SystemTime) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(LOG_FILE_PREFIX) {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if modified < cutoff {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
