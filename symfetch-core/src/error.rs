//! Error types for symfetch-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from loading or persisting local state.
#[derive(Debug, Error)]
pub enum StateError {
    /// Underlying I/O failure, annotated with the file involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on config load; includes file path and line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A config file was requested explicitly but does not exist.
    #[error("config not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// No upload token could be resolved from config or environment.
    #[error("no upload auth token configured; set auth_token, auth_token_file or SOCORRO_SYMBOL_UPLOAD_TOKEN_FILE")]
    MissingToken,

    /// The token file exists but could not be used.
    #[error("auth token file {path} is empty")]
    EmptyToken { path: PathBuf },
}

/// Convenience constructor for [`StateError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StateError {
    StateError::Io {
        path: path.into(),
        source,
    }
}
