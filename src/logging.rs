//! Logging setup.
//!
//! Non-interactive modes log to stderr. The TUI owns the terminal, so there
//! logs only go to the file given with `--log-file` (and are dropped
//! otherwise). `RUST_LOG` overrides the default filter in every mode.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("log file path {0} has no file name")]
    NoFileName(PathBuf),
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

fn build_env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber.
///
/// With a log file, the returned guard flushes the background writer when
/// dropped; keep it alive until the process is about to exit.
pub fn init(log_file: Option<&Path>, interactive: bool) -> Result<Option<WorkerGuard>, LoggingError> {
    if let Some(path) = log_file {
        let file_name = path
            .file_name()
            .ok_or_else(|| LoggingError::NoFileName(path.to_path_buf()))?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|source| LoggingError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        let subscriber = Registry::default()
            .with(build_env_filter("claim_risk_cli=debug"))
            .with(fmt::layer().with_ansi(false).with_writer(writer));
        tracing::subscriber::set_global_default(subscriber)?;
        tracing::info!("logging to {}", path.display());
        return Ok(Some(guard));
    }

    if interactive {
        return Ok(None);
    }

    let subscriber = Registry::default()
        .with(build_env_filter("claim_risk_cli=warn"))
        .with(fmt::layer().with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(None)
}
