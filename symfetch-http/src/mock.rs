//! In-memory [`HttpClient`] for other crates' tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::client::{HttpClient, HttpRequest, HttpResponse};
use crate::error::HttpError;

type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, HttpError>>;

/// Answers requests from a handler closure and records every request seen.
pub struct MockClient {
    handler: Handler,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MockClient {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, HttpError> + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Replay `responses` in order; once exhausted every request gets a 404.
    pub fn sequence(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        let queue = RefCell::new(VecDeque::from(responses));
        Self::new(move |_| {
            queue
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::new(404, Vec::new())))
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl HttpClient for MockClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let result = (self.handler)(&request);
        self.requests.borrow_mut().push(request);
        result
    }
}

/// A transport failure for `url`, as a mock handler would return it.
pub fn transport_error(url: &str) -> HttpError {
    HttpError::Transport {
        url: url.to_string(),
        message: "connection refused".to_string(),
    }
}
