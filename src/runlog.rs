//! Append-only informational log of a relay run, meant for people rather
//! than machines. Written alongside the tracing output; never read back by
//! the pipeline.

use std::io::Write;
use std::path::PathBuf;

use tracing::warn;

use crate::config::RunLogConfig;

/// A handle to the run log, passed by reference into the pipeline. With no
/// sink configured every write is a no-op.
#[derive(Debug, Clone)]
pub struct RunLog {
    sink: Option<PathBuf>,
    timestamps: bool,
}

impl RunLog {
    /// Log into the given file, creating it immediately so an empty run
    /// still leaves the file behind. Lines are appended; an existing file is
    /// never truncated.
    pub fn to_file(path: impl Into<PathBuf>, timestamps: bool) -> std::io::Result<Self> {
        let path = path.into();
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            sink: Some(path),
            timestamps,
        })
    }

    /// A log that discards everything.
    pub fn disabled() -> Self {
        Self {
            sink: None,
            timestamps: false,
        }
    }

    pub fn from_config(config: &RunLogConfig) -> std::io::Result<Self> {
        match &config.path {
            Some(path) => Self::to_file(path.clone(), config.timestamps),
            None => Ok(Self::disabled()),
        }
    }

    /// Append one informational line. A failed write falls back to the
    /// tracing output instead of failing the run.
    pub fn info(&self, message: &str) {
        let path = match &self.sink {
            Some(path) => path,
            None => return,
        };

        let line = if self.timestamps {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            format!("[{timestamp}] INFO: {message}\n")
        } else {
            format!("INFO: {message}\n")
        };

        let written = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = written {
            warn!(error = ?e, path = %path.display(), "run log write failed: {message}");
        }
    }
}
