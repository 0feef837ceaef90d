//! Missing-symbols feed: candidate URLs, download, CSV parsing.
//!
//! The feed is CSV with a header line; only the first two columns
//! (`pdb filename`, `debug id`) are read.

use std::time::Duration;

use chrono::{Days, NaiveDate};

use symfetch_core::types::{DebugId, ModuleFile, ModuleList, ModuleRecord, MODULE_SUFFIX};
use symfetch_http::{HttpClient, HttpRequest, HttpResponse};

use crate::error::PipelineError;

/// Placeholder in the feed URL template.
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Where the module list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// A URL given on the command line; only this one is tried.
    Explicit(String),
    /// Today's feed, then each of the `fallback_days` days before it.
    Dated {
        template: String,
        fallback_days: u32,
    },
}

/// Feed URLs for `today` and the `fallback_days` preceding days, newest first.
pub fn candidate_urls(template: &str, today: NaiveDate, fallback_days: u32) -> Vec<String> {
    (0..=u64::from(fallback_days))
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|day| template.replace(DATE_PLACEHOLDER, &day.format("%Y%m%d").to_string()))
        .collect()
}

/// One CSV feed line. Kept only when it has at least two comma-separated
/// fields, both non-empty, and the first ends in `.pdb`.
pub fn parse_record(line: &str) -> Option<ModuleRecord> {
    let mut fields = line.trim_end().split(',');
    let (pdb, id) = (fields.next()?, fields.next()?);
    if pdb.is_empty() || id.is_empty() || !pdb.ends_with(MODULE_SUFFIX) {
        return None;
    }
    Some(ModuleRecord {
        file: ModuleFile::from(pdb),
        debug_id: DebugId::from(id),
    })
}

/// Parse the feed body into `filename → {ids}`. The first line is a header.
pub fn parse_module_list(body: &str) -> ModuleList {
    let mut modules = ModuleList::new();
    for record in body.lines().skip(1).filter_map(parse_record) {
        modules.entry(record.file).or_default().insert(record.debug_id);
    }
    modules
}

fn has_data(response: &HttpResponse) -> bool {
    response.status == 200 && !response.text().trim().is_empty()
}

/// Download and parse the module list.
///
/// Returns the URL that answered along with the parsed records.
pub fn load_modules<H: HttpClient>(
    http: &H,
    source: &FeedSource,
    today: NaiveDate,
    timeout: Duration,
) -> Result<(String, ModuleList), PipelineError> {
    match source {
        FeedSource::Explicit(url) => {
            tracing::debug!("loading module list URL ({url})...");
            let response = http.send(HttpRequest::get(url.as_str(), timeout))?;
            if !has_data(&response) {
                return Err(PipelineError::FeedStatus {
                    url: url.clone(),
                    status: response.status,
                    len: response.body.len(),
                });
            }
            Ok((url.clone(), parse_module_list(&response.text())))
        }
        FeedSource::Dated {
            template,
            fallback_days,
        } => {
            let urls = candidate_urls(template, today, *fallback_days);
            for url in &urls {
                tracing::debug!("loading module list URL ({url})...");
                match http.send(HttpRequest::get(url.as_str(), timeout)) {
                    Ok(response) if has_data(&response) => {
                        return Ok((url.clone(), parse_module_list(&response.text())));
                    }
                    Ok(response) => {
                        tracing::debug!(url = %url, status = response.status, "no feed for this date");
                    }
                    Err(err) => {
                        tracing::warn!(url = %url, error = %err, "feed request failed");
                    }
                }
            }
            Err(PipelineError::FeedUnavailable { tried: urls })
        }
    }
}
