//! # symfetch-http
//!
//! Blocking HTTP seam shared by the fetch pipeline and the task trigger.
//!
//! Production code talks to [`UreqClient`]; tests implement [`HttpClient`]
//! with canned responses so no test touches the network.

pub mod client;
pub mod error;
pub mod multipart;

pub use client::{HttpClient, HttpRequest, HttpResponse, Method, UreqClient};
pub use error::HttpError;
pub use multipart::MultipartForm;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
