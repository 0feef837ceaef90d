//! `symfetch upload` — upload an existing symbol archive.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Args;

use symfetch_core::Config;
use symfetch_http::UreqClient;
use symfetch_pipeline::upload::upload;
use symfetch_pipeline::UploadSettings;

/// Arguments for `symfetch upload`.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// The symbols zip to upload.
    pub zip: PathBuf,
}

impl UploadArgs {
    pub fn run(self, config: &Config) -> Result<ExitCode> {
        if !self.zip.is_file() {
            bail!("zip file \"{}\" does not exist!", self.zip.display());
        }
        let token = config
            .resolve_auth_token()
            .context("cannot upload without an auth token")?;

        let settings = UploadSettings::from_config(config);
        let outcome = upload(&UreqClient::new(), &self.zip, &token, &settings)
            .with_context(|| format!("failed to upload {}", self.zip.display()))?;

        if outcome.is_success() {
            Ok(ExitCode::SUCCESS)
        } else {
            Ok(ExitCode::FAILURE)
        }
    }
}
