//! Request/response types, the [`HttpClient`] trait and its `ureq` backend.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use crate::error::HttpError;

/// Redirect hops followed when a request allows redirects.
const MAX_REDIRECTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully described outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
    pub follow_redirects: bool,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout,
            follow_redirects: true,
        }
    }

    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self::new(Method::Get, url, timeout)
    }

    pub fn head(url: impl Into<String>, timeout: Duration) -> Self {
        Self::new(Method::Head, url, timeout)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn no_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }

    /// Value of the first header named `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a completed exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Blocking HTTP transport.
///
/// Implementations return `Ok` for every response that carries a status,
/// including 4xx and 5xx; `Err` means the exchange itself failed.
pub trait HttpClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

impl<T: HttpClient + ?Sized> HttpClient for &T {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).send(request)
    }
}

// ---------------------------------------------------------------------------
// ureq backend
// ---------------------------------------------------------------------------

/// [`HttpClient`] over two `ureq` agents: one following redirects, one not.
pub struct UreqClient {
    agent: ureq::Agent,
    no_redirect: ureq::Agent,
}

impl UreqClient {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().redirects(MAX_REDIRECTS).build(),
            no_redirect: ureq::AgentBuilder::new().redirects(0).build(),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let agent = if request.follow_redirects {
            &self.agent
        } else {
            &self.no_redirect
        };

        let mut req = agent
            .request(request.method.as_str(), &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            req = req.set(name, value);
        }

        tracing::trace!(method = %request.method, url = %request.url, "sending request");
        let result = match &request.body {
            Some(body) => req.send_bytes(body),
            None => req.call(),
        };

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(HttpError::Transport {
                    url: request.url,
                    message: transport.to_string(),
                })
            }
        };

        let status = response.status();
        let mut body = Vec::new();
        if request.method != Method::Head {
            response
                .into_reader()
                .read_to_end(&mut body)
                .map_err(|source| HttpError::Body {
                    url: request.url.clone(),
                    source,
                })?;
        }
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(200, true)]
    #[case(204, true)]
    #[case(299, true)]
    #[case(302, false)]
    #[case(403, false)]
    #[case(500, false)]
    fn success_is_strictly_2xx(#[case] status: u16, #[case] expected: bool) {
        assert_eq!(HttpResponse::new(status, Vec::new()).is_success(), expected);
    }

    #[test]
    fn request_builder_collects_headers() {
        let req = HttpRequest::get("https://example.test/", Duration::from_secs(5))
            .header("User-Agent", "agent/1.0")
            .no_redirects();
        assert_eq!(req.header_value("user-agent"), Some("agent/1.0"));
        assert!(!req.follow_redirects);
        assert_eq!(req.method, Method::Get);
    }

    #[test]
    fn text_is_lossy() {
        let resp = HttpResponse::new(500, vec![b'o', b'k', 0xff]);
        assert!(resp.text().starts_with("ok"));
    }
}
