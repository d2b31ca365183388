//! XDG-compliant log directory management
//!
//! Logs are stored in `$XDG_STATE_HOME/projtree/logs/` (typically
//! `~/.local/state/projtree/logs/`). Each run writes its own PID-named file so
//! concurrent pickers never share one; old files are removed on startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

/// Minimum age for log files to be cleaned up (24 hours)
const CLEANUP_AGE: Duration = Duration::from_secs(24 * 60 * 60);

static LOG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Base log directory, created on first use.
///
/// Falls back to the system temp directory when the state directory cannot
/// be determined or created.
pub fn log_dir() -> &'static PathBuf {
    LOG_DIR.get_or_init(|| {
        let dir = state_log_dir().unwrap_or_else(|| std::env::temp_dir().join("projtree-logs"));

        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Failed to create log directory {:?}: {}", dir, e);
            return std::env::temp_dir().join("projtree-logs");
        }

        dir
    })
}

fn state_log_dir() -> Option<PathBuf> {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(state_home);
        if path.is_absolute() {
            return Some(path.join("projtree").join("logs"));
        }
    }

    dirs::home_dir().map(|home| home.join(".local").join("state").join("projtree").join("logs"))
}

/// Returns `{log_dir}/projtree-{PID}.log`
pub fn main_log_path() -> PathBuf {
    log_dir().join(format!("projtree-{}.log", std::process::id()))
}

/// Remove log files left behind by earlier runs
pub fn cleanup_stale_logs() {
    cleanup_stale_logs_in_dir(log_dir(), std::process::id(), CLEANUP_AGE);
}

fn cleanup_stale_logs_in_dir(dir: &Path, current_pid: u32, max_age: Duration) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        let Some(pid) = extract_pid_from_filename(&name) else {
            continue;
        };
        if pid == current_pid {
            continue;
        }

        if entry.file_type().map(|t| t.is_file()).unwrap_or(false)
            && is_file_older_than(&entry.path(), max_age)
        {
            if let Err(e) = fs::remove_file(entry.path()) {
                tracing::debug!("Failed to clean up stale log {:?}: {}", entry.path(), e);
            } else {
                tracing::debug!("Cleaned up stale log file: {:?}", entry.path());
            }
        }
    }
}

fn is_file_older_than(path: &Path, age: Duration) -> bool {
    let Ok(modified) = fs::metadata(path).and_then(|m| m.modified()) else {
        return false;
    };

    SystemTime::now()
        .duration_since(modified)
        .map(|elapsed| elapsed > age)
        .unwrap_or(false)
}

/// Extract PID from a filename like "projtree-12345.log"
fn extract_pid_from_filename(name: &str) -> Option<u32> {
    let without_ext = name.strip_suffix(".log")?;
    let last_hyphen = without_ext.rfind('-')?;
    without_ext[last_hyphen + 1..].parse().ok()
}
