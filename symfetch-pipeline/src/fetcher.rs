//! Symbol fetcher — the per-pair reconciliation loop.
//!
//! ## Decision order for each `(filename, id)`
//!
//! 1. Denylisted filename → skip.
//! 2. Skiplist entry with the same filename → skip, no network.
//! 3. HEAD on the destination store returns 200 → already present.
//! 4. GET the cabinet from upstream; needs 200 and an `MSCF` body.
//! 5. Decompress, then dump to symbol text.
//! 6. Write `<output>/<filename>/<id>/<stem>.sym` and append to the index.
//!
//! Network and tool failures in steps 3–5 never abort the run: step 3 fails
//! open, steps 4–5 become [`FetchOutcome::NotFound`]. The skiplist is never
//! extended here.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use symfetch_core::types::{pair_count, DebugId, FetchOutcome, ModuleFile, ModuleList};
use symfetch_core::RunContext;
use symfetch_http::{HttpClient, HttpRequest};
use url::Url;

use crate::error::{io_err, PipelineError};
use crate::tools::{Decompressor, SymbolDumper};

/// First four bytes of every Microsoft cabinet file.
pub const CAB_SIGNATURE: &[u8; 4] = b"MSCF";

/// User agent the upstream symbol server expects from symbol clients.
pub const SYMBOL_SERVER_USER_AGENT: &str = "Microsoft-Symbol-Server/6.3.0.0";

/// Base URLs of the two symbol stores involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolServers {
    /// Where raw compressed debug files are downloaded from.
    pub upstream: String,
    /// Where converted `.sym` files already live (HEAD-checked).
    pub destination: String,
}

impl SymbolServers {
    fn upstream_url(&self, file: &ModuleFile, id: &DebugId) -> Result<Url, url::ParseError> {
        let compressed = file.compressed_name();
        join_segments(&self.upstream, [file.0.as_str(), id.0.as_str(), compressed.as_str()])
    }

    fn destination_url(&self, relpath: &str) -> Result<Url, url::ParseError> {
        join_segments(&self.destination, relpath.split('/'))
    }
}

/// Append percent-encoded path segments to `base`.
fn join_segments<'s>(
    base: &str,
    segments: impl IntoIterator<Item = &'s str>,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Why a fetch attempt produced nothing.
#[derive(Debug)]
enum Miss {
    Http(String),
    Status(u16),
    NotCabinet,
    Tool(String),
}

impl std::fmt::Display for Miss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Miss::Http(msg) => write!(f, "request failed: {msg}"),
            Miss::Status(status) => write!(f, "HTTP {status}"),
            Miss::NotCabinet => write!(f, "response is not a cabinet file"),
            Miss::Tool(msg) => write!(f, "{msg}"),
        }
    }
}

/// Runs the reconciliation loop against injected transport and tools.
pub struct Fetcher<'a, H, D, S> {
    pub http: &'a H,
    pub decompressor: &'a D,
    pub dumper: &'a S,
    pub servers: SymbolServers,
    /// Root the converted `.sym` files are written under.
    pub output_dir: PathBuf,
    pub timeout: Duration,
}

impl<'a, H, D, S> Fetcher<'a, H, D, S>
where
    H: HttpClient,
    D: Decompressor,
    S: SymbolDumper,
{
    /// Process every pair in `modules`, recording outcomes in `ctx`.
    pub fn fetch_all(&self, modules: &ModuleList, ctx: &mut RunContext) -> Result<(), PipelineError> {
        tracing::debug!("fetching symbols");
        let total = pair_count(modules);
        let mut current = 0usize;

        for (file, ids) in modules {
            for id in ids {
                current += 1;
                if ctx.verbose {
                    print_progress(current, total, file);
                }
                let outcome = self.process(file, id, ctx)?;
                ctx.record(outcome);
            }
        }

        if ctx.verbose && total > 0 {
            eprintln!();
        }
        Ok(())
    }

    /// Decide and, if needed, fetch a single pair.
    ///
    /// On success the relative path is pushed to `ctx.file_index`; the
    /// returned outcome is not yet tallied.
    pub fn process(
        &self,
        file: &ModuleFile,
        id: &DebugId,
        ctx: &mut RunContext,
    ) -> Result<FetchOutcome, PipelineError> {
        if ctx.denylist.contains(file) {
            return Ok(FetchOutcome::Denylisted);
        }
        if ctx.skiplist.matches(file, id) {
            tracing::debug!("{file}/{id} already in skiplist");
            return Ok(FetchOutcome::Skiplisted);
        }

        let relpath = file.symbol_relpath(id);
        if self.server_has_file(&relpath) {
            tracing::debug!("{file}/{id} already on server");
            return Ok(FetchOutcome::AlreadyPresent);
        }

        match self.fetch_symbols(file, id) {
            Ok(text) => {
                self.write_symbols(&relpath, &text)?;
                tracing::debug!("successfully downloaded {file}/{id}");
                ctx.file_index.push(relpath);
                Ok(FetchOutcome::Fetched)
            }
            Err(miss) => {
                tracing::debug!("couldn't fetch {file}/{id} ({miss}), but not skiplisting");
                Ok(FetchOutcome::NotFound)
            }
        }
    }

    /// HEAD the destination store. Any error counts as "not present".
    fn server_has_file(&self, relpath: &str) -> bool {
        let url = match self.servers.destination_url(relpath) {
            Ok(url) => url,
            Err(err) => {
                tracing::debug!(error = %err, "bad destination URL; fetching anyway");
                return false;
            }
        };
        let request = HttpRequest::head(url.as_str(), self.timeout).no_redirects();
        match self.http.send(request) {
            Ok(response) => response.status == 200,
            Err(err) => {
                tracing::debug!(error = %err, "presence check failed; fetching anyway");
                false
            }
        }
    }

    fn fetch_symbols(&self, file: &ModuleFile, id: &DebugId) -> Result<String, Miss> {
        let url = self
            .servers
            .upstream_url(file, id)
            .map_err(|e| Miss::Http(format!("bad upstream URL: {e}")))?;
        let request = HttpRequest::get(url.as_str(), self.timeout)
            .header("User-Agent", SYMBOL_SERVER_USER_AGENT);
        let response = self
            .http
            .send(request)
            .map_err(|e| Miss::Http(e.to_string()))?;
        if response.status != 200 {
            return Err(Miss::Status(response.status));
        }
        if !response.body.starts_with(CAB_SIGNATURE) {
            return Err(Miss::NotCabinet);
        }

        let work = tempfile::tempdir().map_err(|e| Miss::Tool(e.to_string()))?;
        let cab_path = work.path().join(file.compressed_name());
        std::fs::write(&cab_path, &response.body).map_err(|e| Miss::Tool(e.to_string()))?;

        let extract_dir = work.path().join("extract");
        std::fs::create_dir_all(&extract_dir).map_err(|e| Miss::Tool(e.to_string()))?;
        self.decompressor
            .decompress(&cab_path, &extract_dir)
            .map_err(|e| Miss::Tool(e.to_string()))?;

        let debug_file = find_extracted(&extract_dir, file)
            .ok_or_else(|| Miss::Tool(format!("{file} not found after decompression")))?;
        self.dumper
            .dump(&debug_file)
            .map_err(|e| Miss::Tool(e.to_string()))
    }

    fn write_symbols(&self, relpath: &str, text: &str) -> Result<(), PipelineError> {
        let path = self.output_dir.join(relpath);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        std::fs::write(&path, text).map_err(|e| io_err(&path, e))
    }
}

/// The extracted debug file, matching `file` case-insensitively.
fn find_extracted(dir: &Path, file: &ModuleFile) -> Option<PathBuf> {
    let exact = dir.join(&file.0);
    if exact.is_file() {
        return Some(exact);
    }
    let wanted = file.normalized();
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.to_lowercase() == wanted)
        })
}

fn print_progress(current: usize, total: usize, file: &ModuleFile) {
    let percent = if total == 0 { 100 } else { 100 * current / total };
    let name: String = file.0.chars().take(20).collect();
    eprint!("[{current:6}/{total:6}] {percent:3}% {name:<20}\r");
    let _ = std::io::stderr().flush();
}
