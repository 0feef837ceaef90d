use std::path::{Path, PathBuf};

pub const DENYLIST_FILE: &str = "blacklist.txt";
pub const KNOWN_MICROSOFT_FILE: &str = "known-microsoft-symbols.txt";
pub const SKIPLIST_FILE: &str = "skiplist.txt";

pub const CONFIG_FILE: &str = "symfetch.yaml";
pub const FETCH_LOG: &str = "symsrv-fetch.log";
pub const VERBOSE_LOG: &str = "verbose.log";
pub const TASKCLUSTER_AUTH_FILE: &str = "taskcluster-auth.json";

pub fn denylist_path(state_dir: &Path) -> PathBuf {
    state_dir.join(DENYLIST_FILE)
}

pub fn known_microsoft_path(state_dir: &Path) -> PathBuf {
    state_dir.join(KNOWN_MICROSOFT_FILE)
}

pub fn skiplist_path(state_dir: &Path) -> PathBuf {
    state_dir.join(SKIPLIST_FILE)
}

pub fn fetch_log_path(state_dir: &Path) -> PathBuf {
    state_dir.join(FETCH_LOG)
}

pub fn verbose_log_path(state_dir: &Path) -> PathBuf {
    state_dir.join(VERBOSE_LOG)
}

/// `<user config dir>/symfetch/symfetch.yaml`, if the platform has one.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("symfetch").join(CONFIG_FILE))
}
