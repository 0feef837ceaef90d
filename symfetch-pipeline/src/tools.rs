//! External decompression and symbol-dump tools.
//!
//! The fetcher only sees the [`Decompressor`] and [`SymbolDumper`] traits.
//! The command-backed implementations run a configured argv with `{input}`
//! and `{output_dir}` substituted, capture output through unnamed temp files
//! (a full pipe cannot stall the child) and kill the child after a timeout.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use symfetch_core::config::{INPUT_PLACEHOLDER, OUTPUT_DIR_PLACEHOLDER};

use crate::error::ToolError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Expands a cabinet file into `output_dir`.
pub trait Decompressor {
    fn decompress(&self, archive: &Path, output_dir: &Path) -> Result<(), ToolError>;
}

/// Converts a native debug file into symbol text.
pub trait SymbolDumper {
    fn dump(&self, debug_file: &Path) -> Result<String, ToolError>;
}

// ---------------------------------------------------------------------------
// CommandTool
// ---------------------------------------------------------------------------

/// A configured command line run with a kill-after timeout.
#[derive(Debug, Clone)]
pub struct CommandTool {
    argv: Vec<String>,
    timeout: Duration,
}

/// Captured result of a finished command.
struct ToolOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl CommandTool {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Self {
        Self { argv, timeout }
    }

    fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    fn render(&self, input: &Path, output_dir: Option<&Path>) -> Result<Vec<String>, ToolError> {
        if self.argv.is_empty() {
            return Err(ToolError::EmptyCommand);
        }
        let input = input.display().to_string();
        let output_dir = output_dir.map(|d| d.display().to_string()).unwrap_or_default();
        Ok(self
            .argv
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_DIR_PLACEHOLDER, &output_dir)
            })
            .collect())
    }

    fn run(&self, input: &Path, output_dir: Option<&Path>) -> Result<ToolOutput, ToolError> {
        let argv = self.render(input, output_dir)?;
        let program = self.program().to_string();
        let capture_err = |source| ToolError::Io {
            path: input.to_path_buf(),
            source,
        };

        let mut stdout = tempfile::tempfile().map_err(capture_err)?;
        let mut stderr = tempfile::tempfile().map_err(capture_err)?;
        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout.try_clone().map_err(capture_err)?))
            .stderr(Stdio::from(stderr.try_clone().map_err(capture_err)?))
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: program.clone(),
                source,
            })?;

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait().map_err(capture_err)? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ToolError::TimedOut {
                    program,
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(ToolOutput {
            status,
            stdout: read_back(&mut stdout).map_err(capture_err)?,
            stderr: read_back(&mut stderr).map_err(capture_err)?,
        })
    }

    fn check(&self, output: ToolOutput) -> Result<Vec<u8>, ToolError> {
        if output.status.success() {
            return Ok(output.stdout);
        }
        Err(ToolError::Failed {
            program: self.program().to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

fn read_back(file: &mut File) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Command-backed implementations
// ---------------------------------------------------------------------------

/// Runs e.g. `cabextract -q -d {output_dir} {input}`.
#[derive(Debug, Clone)]
pub struct CommandDecompressor(pub CommandTool);

impl CommandDecompressor {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Self {
        Self(CommandTool::new(argv, timeout))
    }
}

impl Decompressor for CommandDecompressor {
    fn decompress(&self, archive: &Path, output_dir: &Path) -> Result<(), ToolError> {
        let output = self.0.run(archive, Some(output_dir))?;
        self.0.check(output).map(|_| ())
    }
}

/// Runs e.g. `dump_syms {input}` and returns its stdout.
#[derive(Debug, Clone)]
pub struct CommandDumper(pub CommandTool);

impl CommandDumper {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Self {
        Self(CommandTool::new(argv, timeout))
    }
}

impl SymbolDumper for CommandDumper {
    fn dump(&self, debug_file: &Path) -> Result<String, ToolError> {
        let output = self.0.run(debug_file, None)?;
        let stdout = self.0.check(output)?;
        let text = String::from_utf8_lossy(&stdout).into_owned();
        if text.trim().is_empty() {
            return Err(ToolError::MissingOutput {
                program: self.0.program().to_string(),
                path: debug_file.to_path_buf(),
            });
        }
        Ok(text)
    }
}
