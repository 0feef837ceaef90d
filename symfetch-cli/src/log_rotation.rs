//! Size-based rotation for the run logs.
//!
//! Runs before the log writers open their files. A log over 10 MiB is
//! shifted to `<name>.1`, older copies move up, and at most 5 are kept.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Maximum log file size before rotation (10 MiB).
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum number of rotated backup files to keep.
pub const MAX_ROTATED_FILES: usize = 5;

/// Rotate `log_path` if it is at least `max_bytes` long.
///
/// Returns `true` when the file was rotated. A missing log is not an error.
pub fn rotate_if_needed(log_path: &Path, max_bytes: u64, max_files: usize) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if size < max_bytes {
        return Ok(false);
    }

    let oldest = numbered_path(log_path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..max_files).rev() {
        let src = numbered_path(log_path, n);
        if src.exists() {
            fs::rename(&src, numbered_path(log_path, n + 1))?;
        }
    }
    fs::rename(log_path, numbered_path(log_path, 1))?;
    Ok(true)
}

/// Outcome of rotating one file, reported once logging is up.
#[derive(Debug)]
pub struct Rotation {
    pub path: PathBuf,
    pub result: io::Result<bool>,
}

/// Rotate each of `logs`. Failures are returned, never raised.
pub fn rotate_logs(logs: &[PathBuf]) -> Vec<Rotation> {
    logs.iter()
        .map(|path| Rotation {
            path: path.clone(),
            result: rotate_if_needed(path, MAX_LOG_BYTES, MAX_ROTATED_FILES),
        })
        .collect()
}

/// `symsrv-fetch.log` → `symsrv-fetch.log.2`.
fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.with_file_name(format!("{name}.{n}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn oversized(path: &Path, fill: u8) {
        fs::write(path, vec![fill; MAX_LOG_BYTES as usize]).unwrap();
    }

    #[test]
    fn small_or_missing_file_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("symsrv-fetch.log");
        assert!(!rotate_if_needed(&log, MAX_LOG_BYTES, MAX_ROTATED_FILES).unwrap());

        fs::write(&log, "one line\n").unwrap();
        assert!(!rotate_if_needed(&log, MAX_LOG_BYTES, MAX_ROTATED_FILES).unwrap());
        assert!(!numbered_path(&log, 1).exists());
    }

    #[test]
    fn oversized_file_moves_to_first_slot() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("symsrv-fetch.log");
        oversized(&log, b'a');

        assert!(rotate_if_needed(&log, MAX_LOG_BYTES, MAX_ROTATED_FILES).unwrap());
        assert!(!log.exists(), "the writer recreates the live log");
        assert_eq!(
            fs::metadata(numbered_path(&log, 1)).unwrap().len(),
            MAX_LOG_BYTES
        );
    }

    #[test]
    fn keeps_at_most_five_copies() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("verbose.log");
        for n in 1..=MAX_ROTATED_FILES {
            fs::write(numbered_path(&log, n), format!("copy-{n}")).unwrap();
        }
        oversized(&log, b'b');

        rotate_if_needed(&log, 16, MAX_ROTATED_FILES).unwrap();
        assert!(!numbered_path(&log, MAX_ROTATED_FILES + 1).exists());
        assert_eq!(
            fs::read_to_string(numbered_path(&log, MAX_ROTATED_FILES)).unwrap(),
            "copy-4"
        );
        assert_eq!(
            fs::read_to_string(numbered_path(&log, 2)).unwrap(),
            "copy-1"
        );
    }

    #[test]
    fn rotate_logs_reports_each_file() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        oversized(&a, b'x');

        let results = rotate_logs(&[a.clone(), b.clone()]);
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0].result, Ok(true)));
        assert!(matches!(results[1].result, Ok(false)));
        assert_eq!(results[1].path, b);
    }
}
