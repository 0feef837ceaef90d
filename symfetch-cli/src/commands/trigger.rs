//! `symfetch trigger` — spawn the fetch and upload tasks on the queue.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;

use symfetch_core::Config;
use symfetch_http::UreqClient;
use symfetch_tasks::{trigger, TriggerSettings, DECISION_TASK_ENV};

/// Arguments for `symfetch trigger`.
#[derive(Args, Debug)]
pub struct TriggerArgs {
    /// Directory of JSON task templates (overrides `task_template_dir`).
    #[arg(long)]
    pub templates: Option<std::path::PathBuf>,
}

impl TriggerArgs {
    pub fn run(self, config: &Config) -> Result<()> {
        let mut settings = TriggerSettings::from_config(config);
        if let Some(dir) = self.templates {
            settings.template_dir = dir;
        }
        let decision_task = std::env::var(DECISION_TASK_ENV).ok();

        let report = trigger(
            &UreqClient::new(),
            &settings,
            decision_task.as_deref(),
            Utc::now(),
        )
        .context("failed to submit tasks")?;

        for task in &report.tasks {
            tracing::info!("{}: {}", task.template, task.task_id);
        }
        println!("{}", report.inspector_url());
        Ok(())
    }
}
