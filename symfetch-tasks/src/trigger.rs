//! Fill every task template in a directory and submit it to the queue.
//!
//! Inside a decision task (`TASK_ID` set) the decision task becomes the
//! group and the queue is reached through the unauthenticated in-task
//! proxy. Otherwise a fresh group id is minted and requests are signed with
//! the credentials file.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use symfetch_core::Config;
use symfetch_http::HttpClient;

use crate::error::TaskError;
use crate::hawk::Credentials;
use crate::queue::{Queue, IN_TASK_QUEUE_URL};
use crate::slug;
use crate::template::{self, TemplateKeys};

/// Environment variable naming the task we are running inside, if any.
pub const DECISION_TASK_ENV: &str = "TASK_ID";

const INSPECTOR_URL: &str = "https://tools.taskcluster.net/task-group-inspector/#/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSettings {
    pub template_dir: PathBuf,
    pub credentials_file: PathBuf,
    pub queue_base_url: String,
    pub timeout: Duration,
}

impl TriggerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            template_dir: config.task_template_dir.clone(),
            credentials_file: config.taskcluster_credentials_file.clone(),
            queue_base_url: config.queue_base_url.clone(),
            timeout: config.request_timeout(),
        }
    }
}

/// One submitted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTask {
    pub template: String,
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerReport {
    pub task_group_id: String,
    pub tasks: Vec<SubmittedTask>,
}

impl TriggerReport {
    pub fn inspector_url(&self) -> String {
        format!("{INSPECTOR_URL}{}", self.task_group_id)
    }
}

/// Submit every template in `settings.template_dir`, in file-name order.
///
/// A template whose `dependencies` is missing or empty is made to depend on
/// the task submitted just before it, or on the decision task for the first
/// one. The first failure aborts the run.
pub fn trigger<H: HttpClient>(
    http: &H,
    settings: &TriggerSettings,
    decision_task_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TriggerReport, TaskError> {
    let templates = template::load_dir(&settings.template_dir)?;

    let (task_group_id, queue) = match decision_task_id.filter(|id| !id.is_empty()) {
        Some(id) => {
            tracing::info!(decision_task = id, "running inside a decision task");
            (
                id.to_string(),
                Queue::new(http, IN_TASK_QUEUE_URL, None, settings.timeout),
            )
        }
        None => {
            let creds = Credentials::load(&settings.credentials_file)?;
            (
                slug::slug_id(),
                Queue::new(
                    http,
                    settings.queue_base_url.as_str(),
                    Some(creds),
                    settings.timeout,
                ),
            )
        }
    };

    let mut keys = TemplateKeys::new(&task_group_id, now);
    let mut previous = decision_task_id.filter(|id| !id.is_empty()).map(str::to_string);
    let mut tasks = Vec::with_capacity(templates.len());

    for tpl in &templates {
        let task_id = slug::slug_id();
        let mut definition = tpl.fill(&keys)?;
        if !has_dependencies(definition.get("dependencies")) {
            if let Some(dep) = &previous {
                definition.insert("dependencies".into(), Value::from(vec![dep.clone()]));
            }
        }
        queue.create_task(&task_id, &definition)?;
        tracing::info!(template = %tpl.name, task_id = %task_id, "submitted task");

        keys.insert(tpl.id_key(), task_id.as_str());
        previous = Some(task_id.clone());
        tasks.push(SubmittedTask {
            template: tpl.name.clone(),
            task_id,
        });
    }

    Ok(TriggerReport {
        task_group_id,
        tasks,
    })
}

fn has_dependencies(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_detection() {
        assert!(!has_dependencies(None));
        assert!(!has_dependencies(Some(&Value::Null)));
        assert!(!has_dependencies(Some(&Value::from(Vec::<String>::new()))));
        assert!(has_dependencies(Some(&Value::from(vec!["x"]))));
    }

    #[test]
    fn inspector_url() {
        let report = TriggerReport {
            task_group_id: "GROUP".into(),
            tasks: Vec::new(),
        };
        assert_eq!(
            report.inspector_url(),
            "https://tools.taskcluster.net/task-group-inspector/#/GROUP"
        );
    }
}
