//! Error types for symfetch-pipeline.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use symfetch_core::StateError;
use symfetch_http::HttpError;

/// Errors that abort a fetch run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Config or state-file failure.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// A network failure on a request that is not allowed to fail.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// No dated feed URL produced a module list.
    #[error("no missing-symbols feed available; tried {}", tried.join(", "))]
    FeedUnavailable { tried: Vec<String> },

    /// The explicitly requested feed URL did not return data.
    #[error("feed {url} returned HTTP {status} with {len} bytes")]
    FeedStatus { url: String, status: u16, len: usize },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive construction failure.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Failure of an external decompression or dump tool.
///
/// Always recoverable: the fetcher turns it into a not-found outcome.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool command line is empty")]
    EmptyCommand,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {stderr}", code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}")))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} produced no output at {path}")]
    MissingOutput { program: String, path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`PipelineError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PipelineError {
    PipelineError::Io {
        path: path.into(),
        source,
    }
}
