//! Error types for symfetch-http.

use thiserror::Error;

/// A request that never produced an HTTP status.
///
/// Non-2xx statuses are *not* errors at this layer; they come back as an
/// [`HttpResponse`](crate::HttpResponse) for the caller to judge.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The response arrived but its body could not be read.
    #[error("reading response body from {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
}
