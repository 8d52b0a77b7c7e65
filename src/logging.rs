use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "todo.log";
const ARCHIVE_FILE: &str = "todo_archive.log";

/// Path of the live log file inside `log_dir`.
pub fn log_file(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE)
}

/// Level used when `RUST_LOG` is not set. Todo changes are logged at this
/// level so the log keeps a record of them.
const DEFAULT_FILTER: &str = "info";

/// Send every log line (timestamp, level, message) to `<log_dir>/todo.log`,
/// appending to what a previous run left behind.
pub fn init(log_dir: &Path) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    subscriber(log_dir, filter)?
        .try_init()
        .context("Failed to install the log subscriber.")
}

fn subscriber(
    log_dir: &Path,
    filter: EnvFilter,
) -> Result<impl Subscriber + Send + Sync + 'static> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}.", log_dir.display()))?;

    let path = log_file(log_dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}.", path.display()))?;

    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .finish())
}

/// Move the log file aside to `todo_archive.log`, replacing any older
/// archive. Nothing to do if no log file exists; failures are only logged.
pub fn archive(log_dir: &Path) {
    let current = log_file(log_dir);
    if !current.exists() {
        return;
    }
    match fs::rename(&current, log_dir.join(ARCHIVE_FILE)) {
        Ok(()) => tracing::info!("Log file archived successfully."),
        Err(e) => tracing::error!("Error occurred while archiving log file: {}", e),
    }
}
