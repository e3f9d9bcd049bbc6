//! Error types for the copy and delete engines.
//!
//! Configuration errors (`InvalidFormat`, `InvalidJob`) are returned synchronously
//! before any job exists. Per-item errors (`SourceMissing`, `CopyIo`, `DeleteIo`)
//! are produced inside a run, logged, and folded into the terminal `Outcome`;
//! they never escape an engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Name template has no placeholder run, or more than one.
    #[error("invalid name template {template:?}: {reason}")]
    InvalidFormat {
        template: String,
        reason: &'static str,
    },

    /// A copy job could not be constructed from the given inputs.
    #[error("invalid copy job: {reason}")]
    InvalidJob { reason: String },

    /// A requested source file does not exist.
    #[error("source file not found: {}", path.display())]
    SourceMissing { path: PathBuf },

    /// Read or write failure on a single copy.
    #[error("failed to copy {} to {}", source_path.display(), dest_path.display())]
    CopyIo {
        source_path: PathBuf,
        dest_path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failure removing one entry during a delete run.
    #[error("failed to remove {}", path.display())]
    DeleteIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A delete run was aborted by request.
    #[error("delete run canceled")]
    Canceled,

    /// The raw input list could not be read at all.
    #[error("failed to read input list {}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The background worker thread could not be started.
    #[error("failed to spawn engine worker")]
    WorkerSpawn {
        #[source]
        source: io::Error,
    },

    /// The background worker panicked before producing a report.
    #[error("engine worker panicked")]
    WorkerPanicked,
}

impl EngineError {
    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::CopyIo { source, .. }
            | Self::DeleteIo { source, .. }
            | Self::InputRead { source, .. }
            | Self::WorkerSpawn { source } => source.raw_os_error(),
            _ => None,
        }
    }

    /// Message including the underlying cause, for log lines.
    pub fn describe(&self) -> String {
        match std::error::Error::source(self) {
            Some(cause) => format!("{self}: {cause}"),
            None => self.to_string(),
        }
    }

    /// True for errors rejected before a job is built.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidFormat { .. } | Self::InvalidJob { .. })
    }
}
