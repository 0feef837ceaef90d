//! Symbol archive: every fetched `.sym` file plus one manifest entry.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{io_err, PipelineError};

/// `YYYYMMDDHHMMSS` in the timestamp's own zone.
pub fn build_id<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y%m%d%H%M%S").to_string()
}

pub fn archive_name(build_id: &str) -> String {
    format!("symbols-{build_id}.zip")
}

pub fn manifest_name(build_id: &str) -> String {
    format!("microsoftsyms-1.0-WINNT-{build_id}-symbols.txt")
}

/// Zip `file_index` (paths relative to `source_dir`) into
/// `<dest_dir>/symbols-<build_id>.zip`.
///
/// Returns `None` without touching the filesystem when the index is empty.
pub fn build_archive(
    file_index: &[String],
    source_dir: &Path,
    dest_dir: &Path,
    build_id: &str,
) -> Result<Option<PathBuf>, PipelineError> {
    if file_index.is_empty() {
        return Ok(None);
    }

    std::fs::create_dir_all(dest_dir).map_err(|e| io_err(dest_dir, e))?;
    let path = dest_dir.join(archive_name(build_id));
    let file = File::create(&path).map_err(|e| io_err(&path, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for relpath in file_index {
        let source = source_dir.join(relpath);
        let contents = std::fs::read(&source).map_err(|e| io_err(&source, e))?;
        zip.start_file(relpath.as_str(), options)?;
        zip.write_all(&contents).map_err(|e| io_err(&path, e))?;
    }

    let manifest = manifest_name(build_id);
    tracing::debug!("adding {manifest}");
    zip.start_file(manifest.as_str(), options)?;
    zip.write_all(file_index.join("\n").as_bytes())
        .map_err(|e| io_err(&path, e))?;
    zip.finish()?;

    Ok(Some(path))
}
