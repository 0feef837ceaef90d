//! `symfetch fetch` — fetch missing symbols, archive and upload them.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use symfetch_core::Config;
use symfetch_http::UreqClient;
use symfetch_pipeline::{CommandDecompressor, CommandDumper, FeedSource, Pipeline};

/// Arguments for `symfetch fetch`.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Module list URL. Defaults to today's feed, falling back a few days.
    pub feed_url: Option<String>,
}

impl FetchArgs {
    pub fn run(self, config: &Config, verbose: bool) -> Result<ExitCode> {
        let source = match self.feed_url {
            Some(url) => FeedSource::Explicit(url),
            None => FeedSource::Dated {
                template: config.feed_url_template.clone(),
                fallback_days: config.feed_fallback_days,
            },
        };

        let http = UreqClient::new();
        let decompressor =
            CommandDecompressor::new(config.decompress_command.clone(), config.tool_timeout());
        let dumper = CommandDumper::new(config.dump_syms_command.clone(), config.tool_timeout());
        let pipeline = Pipeline {
            config,
            http: &http,
            decompressor: &decompressor,
            dumper: &dumper,
        };

        let report = pipeline
            .run(&source, verbose)
            .context("symbol fetch run failed")?;

        if let Some(archive) = &report.archive {
            eprintln!("upload failed; archive kept at {}", archive.display());
        }
        if report.is_success() {
            Ok(ExitCode::SUCCESS)
        } else {
            Ok(ExitCode::FAILURE)
        }
    }
}
