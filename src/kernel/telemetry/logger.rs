use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

use super::event::TelemetryEvent;
use crate::config::TelemetryConfig;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("telemetry console write failed: {0}")]
    Console(#[source] io::Error),

    #[error("telemetry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("malformed telemetry record at {path}:{line}: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Append-only structured event sink.
///
/// Sinks are written in a fixed order (console, then file). The durable sink is
/// flushed and synced before `log_event` returns, so a returned `Ok` means the
/// record is complete on disk. Failures are returned, never swallowed.
///
/// The append handle sits behind a mutex: one logger may be shared through an
/// `Arc` by every stage and by a multi-threaded host.
#[derive(Debug)]
pub struct TelemetryLogger {
    echo_console: bool,
    jsonl_path: Option<PathBuf>,
    file: Mutex<Option<File>>,
}

impl TelemetryLogger {
    pub fn new(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let file = match &config.jsonl_path {
            Some(path) => Some(open_append(path)?),
            None => None,
        };

        Ok(Self {
            echo_console: config.echo_console,
            jsonl_path: config.jsonl_path.clone(),
            file: Mutex::new(file),
        })
    }

    /// A logger with no sinks.
    pub fn silent() -> Self {
        Self {
            echo_console: false,
            jsonl_path: None,
            file: Mutex::new(None),
        }
    }

    pub fn jsonl_path(&self) -> Option<&Path> {
        self.jsonl_path.as_deref()
    }

    pub fn log_event(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        // Held across both sinks so concurrent callers never interleave records.
        let mut guard = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if self.echo_console {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            out.write_all(line.as_bytes())
                .and_then(|_| out.flush())
                .map_err(TelemetryError::Console)?;
        }

        if let Some(file) = guard.as_mut() {
            let path = self.jsonl_path.clone().unwrap_or_default();
            file.write_all(line.as_bytes())
                .and_then(|_| file.flush())
                .and_then(|_| file.sync_data())
                .map_err(|source| TelemetryError::Io { path, source })?;
        }

        debug!(event_type = event.event_type(), "telemetry event logged");
        Ok(())
    }

    /// Releases the durable sink. Safe to call more than once.
    pub fn close(&self) -> Result<(), TelemetryError> {
        let mut guard = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(file) = guard.take() {
            let path = self.jsonl_path.clone().unwrap_or_default();
            file.sync_all().map_err(|source| TelemetryError::Io { path, source })?;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        let guard = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.is_none()
    }
}

impl Drop for TelemetryLogger {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!("telemetry close failed during teardown: {}", err);
        }
    }
}

fn open_append(path: &Path) -> Result<File, TelemetryError> {
    let io_err = |source| TelemetryError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path).map_err(io_err)
}

/// Replays a JSONL telemetry log. Blank lines are skipped.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<TelemetryEvent>, TelemetryError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TelemetryError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut events = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| TelemetryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| TelemetryError::Malformed {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        events.push(event);
    }

    Ok(events)
}
