//! Error types for symfetch-tasks.

use std::path::PathBuf;

use thiserror::Error;

use symfetch_http::HttpError;

/// All errors that can arise while filling and submitting task templates.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template or credentials file is not valid JSON.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A template's top level is not a JSON object.
    #[error("task template {path} must be a JSON object")]
    NotAnObject { path: PathBuf },

    #[error("no task templates (*.json) found in {dir}")]
    NoTemplates { dir: PathBuf },

    /// Placeholder interpolation failed for one string field.
    #[error("failed to fill template {path}: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: tera::Error,
    },

    /// Credentials file is present but unusable.
    #[error("bad credentials in {path}: {reason}")]
    Credentials { path: PathBuf, reason: String },

    #[error("failed to encode task definition: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Http(#[from] HttpError),

    /// The queue rejected our credentials.
    #[error("TaskclusterAuthFailure: {body}")]
    AuthFailure { body: String },

    /// Any other non-2xx answer from the queue.
    #[error("queue refused task {task_id} (HTTP {status}): {body}")]
    Queue {
        task_id: String,
        status: u16,
        body: String,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TaskError {
    TaskError::Io {
        path: path.into(),
        source,
    }
}
