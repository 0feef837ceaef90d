//! Minimal task-queue client: `createTask` only.

use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};

use symfetch_http::{HttpClient, HttpRequest, Method};

use crate::error::TaskError;
use crate::hawk::{self, Credentials};

/// Queue reached through the proxy available inside a running task.
pub const IN_TASK_QUEUE_URL: &str = "http://taskcluster/queue/v1/";

pub struct Queue<'a, H> {
    http: &'a H,
    base_url: String,
    /// `None` when going through the in-task proxy, which signs for us.
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl<'a, H: HttpClient> Queue<'a, H> {
    pub fn new(
        http: &'a H,
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            http,
            base_url,
            credentials,
            timeout,
        }
    }

    pub fn task_url(&self, task_id: &str) -> String {
        format!("{}task/{task_id}", self.base_url)
    }

    /// `PUT task/<task_id>` with `definition` as the body.
    ///
    /// 401 becomes [`TaskError::AuthFailure`]; any other non-2xx answer is
    /// [`TaskError::Queue`]. Nothing is retried.
    pub fn create_task(&self, task_id: &str, definition: &Map<String, Value>) -> Result<(), TaskError> {
        let url = self.task_url(task_id);
        let body = serde_json::to_vec(definition)?;
        let mut request = HttpRequest::new(Method::Put, url.as_str(), self.timeout)
            .header("Content-Type", "application/json")
            .body(body);
        if let Some(creds) = &self.credentials {
            let auth = hawk::authorization(
                creds,
                Method::Put,
                &url,
                Utc::now().timestamp(),
                &hawk::nonce(),
            )?;
            request = request.header("Authorization", auth);
        }

        tracing::debug!(task_id, url = %url, "creating task");
        let response = self.http.send(request)?;
        match response.status {
            200..=299 => {
                tracing::info!(task_id, "task created");
                Ok(())
            }
            401 => Err(TaskError::AuthFailure {
                body: response.text(),
            }),
            status => Err(TaskError::Queue {
                task_id: task_id.to_string(),
                status,
                body: response.text(),
            }),
        }
    }
}
