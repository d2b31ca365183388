//! Tracing subscriber setup
//!
//! The picker owns the terminal, so all log output goes to a file.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber writing to `log_file_path`.
///
/// Filtering follows `RUST_LOG` with a DEBUG default. Returns false when the
/// log file cannot be created or a subscriber is already installed.
pub fn init_global(log_file_path: &Path) -> bool {
    let Ok(log_file) = File::create(log_file_path) else {
        return false;
    };

    build_subscriber(log_file).try_init().is_ok()
}

/// Build a subscriber with file logging.
///
/// Shared between the binary and tests.
pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::from_default_env()
        .add_directive(tracing::Level::DEBUG.into())
        // ureq logs every connection at debug
        .add_directive("ureq=info".parse().unwrap())
        .add_directive("rustls=info".parse().unwrap());

    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_subscriber_writes_to_file() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap());

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("Failed to load projects: status 500");
            tracing::debug!("Loaded 2 root projects");
        });

        let contents = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(contents.contains("ERROR"), "Log should contain ERROR level");
        assert!(contents.contains("Failed to load projects"));
        assert!(contents.contains("Loaded 2 root projects"));
    }

    #[test]
    fn test_noisy_http_targets_are_capped() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap());

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "ureq", "connection pooled");
            tracing::info!(target: "ureq", "request sent");
        });

        let contents = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(!contents.contains("connection pooled"));
        assert!(contents.contains("request sent"));
    }
}
