//! Retrying symbol-archive uploader.
//!
//! Each attempt POSTs the archive as multipart field `symbols.zip` with an
//! `Auth-Token` header and redirects disabled. Only a 500 or a transport
//! failure is retried; any other status ends the loop. Success is 2xx.
//! The archive file is never removed here.

use std::path::Path;
use std::thread;
use std::time::Duration;

use symfetch_core::Config;
use symfetch_http::{HttpClient, HttpRequest, HttpResponse, Method, MultipartForm};

use crate::error::{io_err, PipelineError};

/// Multipart field name the ingestion API reads the archive from.
pub const UPLOAD_FIELD: &str = "symbols.zip";

/// Status treated as transient.
const RETRYABLE_STATUS: u16 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    pub url: String,
    pub attempts: u32,
    pub timeout: Duration,
    /// Pause between attempts.
    pub retry_delay: Duration,
}

impl UploadSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            url: config.upload_url.clone(),
            attempts: config.upload_attempts.max(1),
            timeout: config.upload_timeout(),
            retry_delay: Duration::from_secs(config.upload_retry_delay_secs),
        }
    }
}

/// How an upload ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The server answered 2xx.
    Uploaded { status: u16 },
    /// The server answered with a non-retryable, non-2xx status.
    Rejected { status: u16 },
    /// Every attempt hit a 500 or a transport error.
    RetriesExhausted { attempts: u32 },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded { .. })
    }
}

/// Upload `archive` with `auth_token`.
///
/// `Err` only when the archive cannot be read; every server-side outcome is
/// an [`UploadOutcome`].
pub fn upload<H: HttpClient>(
    http: &H,
    archive: &Path,
    auth_token: &str,
    settings: &UploadSettings,
) -> Result<UploadOutcome, PipelineError> {
    tracing::info!(
        "uploading symbol file \"{}\" to \"{}\"",
        archive.display(),
        settings.url
    );
    let bytes = std::fs::read(archive).map_err(|e| io_err(archive, e))?;
    let filename = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| UPLOAD_FIELD.to_string());
    let form = MultipartForm::new().file(UPLOAD_FIELD, &filename, &bytes);
    let request = HttpRequest::new(Method::Post, settings.url.as_str(), settings.timeout)
        .header("Content-Type", form.content_type())
        .header("Auth-Token", auth_token)
        .no_redirects()
        .body(form.finish());

    let attempts = settings.attempts.max(1);
    let mut terminal: Option<HttpResponse> = None;
    for attempt in 1..=attempts {
        tracing::info!("attempt {attempt} of {attempts}...");
        match http.send(request.clone()) {
            Ok(response) if response.status == RETRYABLE_STATUS => report_error(&response),
            Ok(response) => {
                terminal = Some(response);
                break;
            }
            Err(err) => tracing::error!("error: {err}"),
        }
        if attempt < attempts {
            tracing::info!("retrying...");
            thread::sleep(settings.retry_delay);
        }
    }

    let Some(response) = terminal else {
        tracing::info!("maximum retries hit, giving up!");
        return Ok(UploadOutcome::RetriesExhausted { attempts });
    };

    if response.is_success() {
        tracing::info!("uploaded successfully!");
        return Ok(UploadOutcome::Uploaded {
            status: response.status,
        });
    }

    report_error(&response);
    Ok(UploadOutcome::Rejected {
        status: response.status,
    })
}

fn report_error(response: &HttpResponse) {
    if response.status < 400 {
        tracing::error!("error: bad auth token? ({})", response.status);
    } else {
        tracing::error!("error: got HTTP response {}", response.status);
    }
    let sep = "=".repeat(20);
    tracing::info!("response body:\n{sep}\n{}\n{sep}", response.text());
}
