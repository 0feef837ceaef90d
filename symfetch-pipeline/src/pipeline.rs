//! Full fetch run: feed → fetch → archive → upload, then skiplist.
//!
//! The skiplist is written exactly once at the end of every run that got as
//! far as loading it, whether the stages in between succeeded or not. The
//! upload token is only needed once there is an archive to upload.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use symfetch_core::types::{pair_count, Tallies};
use symfetch_core::{Config, RunContext, Skiplist};
use symfetch_http::HttpClient;

use crate::archive;
use crate::error::{io_err, PipelineError};
use crate::feed::{self, FeedSource};
use crate::fetcher::{Fetcher, SymbolServers};
use crate::tools::{Decompressor, SymbolDumper};
use crate::upload::{self, UploadOutcome, UploadSettings};

/// Everything a run needs from the outside world.
pub struct Pipeline<'a, H, D, S> {
    pub config: &'a Config,
    pub http: &'a H,
    pub decompressor: &'a D,
    pub dumper: &'a S,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Feed URL the module list came from.
    pub feed_url: String,
    pub tallies: Tallies,
    pub file_index: Vec<String>,
    /// Archive left on disk, if any (only after a failed upload).
    pub archive: Option<PathBuf>,
    pub upload: Option<UploadOutcome>,
    /// Whether the end-of-run skiplist write succeeded.
    pub skiplist_saved: bool,
}

impl RunReport {
    /// `true` for a completed upload and for a run with nothing to upload.
    pub fn is_success(&self) -> bool {
        self.upload.as_ref().map_or(true, UploadOutcome::is_success)
    }
}

impl<'a, H, D, S> Pipeline<'a, H, D, S>
where
    H: HttpClient,
    D: Decompressor,
    S: SymbolDumper,
{
    /// Run against the current local time.
    pub fn run(&self, source: &FeedSource, verbose: bool) -> Result<RunReport, PipelineError> {
        self.run_at(source, verbose, Local::now())
    }

    /// Run as if the current local time were `now`.
    pub fn run_at(
        &self,
        source: &FeedSource,
        verbose: bool,
        now: DateTime<Local>,
    ) -> Result<RunReport, PipelineError> {
        let state_dir = self.config.state_dir.as_path();
        let mut ctx = RunContext::load_at(state_dir, verbose)?;

        let result = self.fetch_and_upload(source, &mut ctx, now);
        let skiplist_saved = persist_skiplist(&ctx.skiplist, state_dir);

        let mut report = result?;
        report.skiplist_saved = skiplist_saved;
        Ok(report)
    }

    fn fetch_and_upload(
        &self,
        source: &FeedSource,
        ctx: &mut RunContext,
        now: DateTime<Local>,
    ) -> Result<RunReport, PipelineError> {
        let (feed_url, modules) =
            feed::load_modules(self.http, source, now.date_naive(), self.config.request_timeout())?;
        tracing::info!(
            feed = %feed_url,
            modules = modules.len(),
            pairs = pair_count(&modules),
            "loaded module list"
        );

        let scratch;
        let output_dir = match &self.config.output_dir {
            Some(dir) => dir.clone(),
            None => {
                scratch = tempfile::tempdir().map_err(|e| io_err(std::env::temp_dir(), e))?;
                scratch.path().to_path_buf()
            }
        };

        let fetcher = Fetcher {
            http: self.http,
            decompressor: self.decompressor,
            dumper: self.dumper,
            servers: SymbolServers {
                upstream: self.config.microsoft_symbol_server.clone(),
                destination: self.config.destination_symbol_server.clone(),
            },
            output_dir: output_dir.clone(),
            timeout: self.config.request_timeout(),
        };
        fetcher.fetch_all(&modules, ctx)?;

        let mut report = RunReport {
            feed_url,
            tallies: ctx.tallies.clone(),
            file_index: ctx.file_index.clone(),
            archive: None,
            upload: None,
            skiplist_saved: false,
        };

        let build_id = archive::build_id(&now);
        let Some(archive_path) =
            archive::build_archive(&ctx.file_index, &output_dir, &self.config.state_dir, &build_id)?
        else {
            tracing::info!("no symbols downloaded: {}", ctx.tallies);
            return Ok(report);
        };

        let auth_token = match self.config.resolve_auth_token() {
            Ok(token) => token,
            Err(err) => {
                tracing::error!(
                    archive = %archive_path.display(),
                    "cannot upload; archive kept for manual recovery"
                );
                return Err(err.into());
            }
        };
        let settings = UploadSettings::from_config(self.config);
        let outcome = upload::upload(self.http, &archive_path, &auth_token, &settings)?;
        if outcome.is_success() {
            tracing::info!("uploaded {} symbol files", ctx.file_index.len());
            discard_archive(&archive_path);
        } else {
            tracing::error!(
                archive = %archive_path.display(),
                "upload failed; archive kept for manual recovery"
            );
            report.archive = Some(archive_path);
        }
        tracing::info!("{}", ctx.tallies);
        report.upload = Some(outcome);
        Ok(report)
    }
}

/// Write the skiplist; failures are logged, never raised.
fn persist_skiplist(skiplist: &Skiplist, state_dir: &Path) -> bool {
    match skiplist.save_at(state_dir) {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(error = %err, "error writing skiplist");
            false
        }
    }
}

fn discard_archive(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %err, "could not remove uploaded archive");
    }
}
