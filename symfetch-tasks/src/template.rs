//! Task templates: JSON documents with `{{ key }}` placeholders.
//!
//! Only string values are interpolated, recursively through objects and
//! arrays; numbers, booleans and `null` pass through untouched. Strings
//! without a `{{` are left as-is so literal braces in commands survive.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tera::{Context, Tera};

use crate::error::{io_err, TaskError};

/// Extension every template file carries.
pub const TEMPLATE_EXTENSION: &str = "json";

/// How long a submitted task may wait before the queue gives up on it.
pub const DEADLINE_HOURS: i64 = 8;
/// How long task artifacts are kept.
pub const ARTIFACT_DAYS: i64 = 1;

/// `2026-10-17T08:00:00.000Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Placeholder values available to every template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateKeys(BTreeMap<String, String>);

impl TemplateKeys {
    /// The fixed keys for a run starting at `now`.
    pub fn new(task_group_id: &str, now: DateTime<Utc>) -> Self {
        let mut keys = Self::default();
        keys.insert("task_group_id", task_group_id);
        keys.insert("task_created", format_timestamp(now));
        keys.insert(
            "task_deadline",
            format_timestamp(now + Duration::hours(DEADLINE_HOURS)),
        );
        keys.insert(
            "artifacts_expires",
            format_timestamp(now + Duration::days(ARTIFACT_DAYS)),
        );
        keys.insert("date_index", now.format("%Y%m%d%H%M%S").to_string());
        keys
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn context(&self) -> Context {
        let mut ctx = Context::new();
        for (key, value) in &self.0 {
            ctx.insert(key.as_str(), value);
        }
        ctx
    }
}

/// One template file, parsed but not yet filled.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTemplate {
    /// File stem, e.g. `fetch-task`.
    pub name: String,
    pub path: PathBuf,
    pub body: Map<String, Value>,
}

impl TaskTemplate {
    pub fn load(path: &Path) -> Result<Self, TaskError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let value: Value = serde_json::from_str(&contents).map_err(|source| TaskError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let Value::Object(body) = value else {
            return Err(TaskError::NotAnObject {
                path: path.to_path_buf(),
            });
        };
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            path: path.to_path_buf(),
            body,
        })
    }

    /// Key under which this template's submitted task id is published to
    /// later templates: `fetch-task` → `fetch_task_id`.
    pub fn id_key(&self) -> String {
        format!("{}_id", self.name.replace('-', "_"))
    }

    /// A filled copy of the body.
    pub fn fill(&self, keys: &TemplateKeys) -> Result<Map<String, Value>, TaskError> {
        let ctx = keys.context();
        let mut body = self.body.clone();
        for value in body.values_mut() {
            fill_value(value, &ctx).map_err(|source| TaskError::Render {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(body)
    }
}

/// Every `*.json` template in `dir`, ordered by file name.
///
/// File names decide submission order, so a template referencing another's
/// `<name>_id` must sort after it.
pub fn load_dir(dir: &Path) -> Result<Vec<TaskTemplate>, TaskError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(TaskError::NoTemplates {
            dir: dir.to_path_buf(),
        });
    }
    paths.iter().map(|p| TaskTemplate::load(p)).collect()
}

fn fill_value(value: &mut Value, ctx: &Context) -> Result<(), tera::Error> {
    match value {
        Value::String(s) if s.contains("{{") => {
            *s = Tera::one_off(s, ctx, false)?;
        }
        Value::Array(items) => {
            for item in items {
                fill_value(item, ctx)?;
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                fill_value(item, ctx)?;
            }
        }
        _ => {}
    }
    Ok(())
}
