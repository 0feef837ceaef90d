//! YAML configuration with environment overrides.
//!
//! # Lookup order
//!
//! 1. `--config <path>` (must exist)
//! 2. `./symfetch.yaml`
//! 3. `<user config dir>/symfetch/symfetch.yaml`
//! 4. built-in defaults
//!
//! Every field is optional. After loading, [`Config::apply_env`] folds in
//! `SOCORRO_SYMBOL_UPLOAD_URL` and `SOCORRO_SYMBOL_UPLOAD_TOKEN_FILE`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, StateError};
use crate::paths;

pub const DEFAULT_FEED_URL_TEMPLATE: &str =
    "https://crash-analysis.mozilla.com/crash_analysis/{date}/{date}-missing-symbols.txt";
pub const DEFAULT_MICROSOFT_SYMBOL_SERVER: &str = "https://msdl.microsoft.com/download/symbols";
pub const DEFAULT_DESTINATION_SYMBOL_SERVER: &str =
    "https://s3-us-west-2.amazonaws.com/org.mozilla.crash-stats.symbols-public/v1";
pub const DEFAULT_UPLOAD_URL: &str = "https://crash-stats.mozilla.com/symbols/upload";
pub const DEFAULT_QUEUE_BASE_URL: &str = "https://queue.taskcluster.net/v1/";

pub const UPLOAD_URL_ENV: &str = "SOCORRO_SYMBOL_UPLOAD_URL";
pub const UPLOAD_TOKEN_FILE_ENV: &str = "SOCORRO_SYMBOL_UPLOAD_TOKEN_FILE";

/// Placeholder replaced with the input file in tool command lines.
pub const INPUT_PLACEHOLDER: &str = "{input}";
/// Placeholder replaced with the output directory in tool command lines.
pub const OUTPUT_DIR_PLACEHOLDER: &str = "{output_dir}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the list files and logs.
    pub state_dir: PathBuf,
    /// Feed URL with a `{date}` placeholder (`YYYYMMDD`).
    pub feed_url_template: String,
    /// How many days before today to fall back through.
    pub feed_fallback_days: u32,
    /// Upstream server the raw debug files come from.
    pub microsoft_symbol_server: String,
    /// Server checked with HEAD for already-converted symbols.
    pub destination_symbol_server: String,
    pub upload_url: String,
    pub auth_token: Option<String>,
    pub auth_token_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub upload_attempts: u32,
    /// Pause between upload attempts.
    pub upload_retry_delay_secs: u64,
    pub tool_timeout_secs: u64,
    /// Cabinet extraction command; `{input}` and `{output_dir}` are substituted.
    pub decompress_command: Vec<String>,
    /// Symbol dump command; `{input}` is substituted, output read from stdout.
    pub dump_syms_command: Vec<String>,
    /// Where fetched `.sym` files go. A temporary directory when unset.
    pub output_dir: Option<PathBuf>,
    pub task_template_dir: PathBuf,
    pub queue_base_url: String,
    pub taskcluster_credentials_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("."),
            feed_url_template: DEFAULT_FEED_URL_TEMPLATE.to_string(),
            feed_fallback_days: 4,
            microsoft_symbol_server: DEFAULT_MICROSOFT_SYMBOL_SERVER.to_string(),
            destination_symbol_server: DEFAULT_DESTINATION_SYMBOL_SERVER.to_string(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            auth_token: None,
            auth_token_file: None,
            request_timeout_secs: 60,
            upload_timeout_secs: 120,
            upload_attempts: 5,
            upload_retry_delay_secs: 5,
            tool_timeout_secs: 30,
            decompress_command: vec![
                "cabextract".to_string(),
                "-q".to_string(),
                "-d".to_string(),
                OUTPUT_DIR_PLACEHOLDER.to_string(),
                INPUT_PLACEHOLDER.to_string(),
            ],
            dump_syms_command: vec!["dump_syms".to_string(), INPUT_PLACEHOLDER.to_string()],
            output_dir: None,
            task_template_dir: PathBuf::from("tasks"),
            queue_base_url: DEFAULT_QUEUE_BASE_URL.to_string(),
            taskcluster_credentials_file: PathBuf::from(paths::TASKCLUSTER_AUTH_FILE),
        }
    }
}

impl Config {
    /// Load a config file. A missing file yields the defaults.
    pub fn load_at(path: &Path) -> Result<Self, StateError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| StateError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the config following the documented lookup order.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, StateError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(StateError::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            return Self::load_at(path);
        }

        let local = PathBuf::from(paths::CONFIG_FILE);
        if local.exists() {
            return Self::load_at(&local);
        }
        if let Some(user) = paths::user_config_path().filter(|p| p.exists()) {
            return Self::load_at(&user);
        }
        Ok(Self::default())
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(UPLOAD_URL_ENV).filter(|v| !v.is_empty()) {
            self.upload_url = url;
        }
        if let Some(file) = lookup(UPLOAD_TOKEN_FILE_ENV).filter(|v| !v.is_empty()) {
            self.auth_token_file = Some(PathBuf::from(file));
        }
    }

    /// [`Config::apply_env`] against the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// The upload token: inline `auth_token` first, then the token file.
    pub fn resolve_auth_token(&self) -> Result<String, StateError> {
        if let Some(token) = self.auth_token.as_deref().map(str::trim) {
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
        let Some(path) = self.auth_token_file.as_deref() else {
            return Err(StateError::MissingToken);
        };
        let token = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(StateError::EmptyToken {
                path: path.to_path_buf(),
            });
        }
        Ok(token.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}
