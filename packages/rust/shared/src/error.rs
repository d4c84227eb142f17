//! Error types for contentcrew.
//!
//! Library crates use [`ContentCrewError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all contentcrew operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentCrewError {
    /// Caller-supplied input was rejected before any service call (e.g. empty topic).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// A template referenced a placeholder that was not bound.
    #[error("missing template variable: {{{name}}}")]
    MissingVariable { name: String },

    /// The generation service failed (transport, quota, timeout, bad response).
    #[error("generation error: {0}")]
    Generation(String),

    /// The insight retrieval service failed.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// No content record with the given id.
    #[error("content record {id} not found")]
    NotFound { id: i64 },

    /// Configuration loading or validation error, including malformed pipelines.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A pipeline stage failed; wraps the underlying cause.
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<ContentCrewError>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContentCrewError>;

impl ContentCrewError {
    /// Create an invalid-input error from any displayable message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Create a missing-variable error for a placeholder name.
    pub fn missing_variable(name: impl Into<String>) -> Self {
        Self::MissingVariable { name: name.into() }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attribute an error to the pipeline stage that produced it.
    pub fn in_stage(self, stage: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with any stage wrappers removed.
    pub fn root(&self) -> &ContentCrewError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Name of the failing stage, if this error came out of a pipeline run.
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            Self::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}
