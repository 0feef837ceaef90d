//! symfetch — fetch missing Windows symbols and upload them for crash symbolication.
//!
//! # Usage
//!
//! ```text
//! symfetch [--config <file>] [-v] fetch [feed_url]
//! symfetch [--config <file>] [-v] upload <zip>
//! symfetch [--config <file>] [-v] trigger [--templates <dir>]
//! ```
//!
//! Exit status is 0 on success or when there was nothing to do, 1 on any
//! failure including usage errors.

mod commands;
mod log_rotation;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use commands::{fetch::FetchArgs, trigger::TriggerArgs, upload::UploadArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "symfetch",
    version,
    about = "Fetch missing symbols from the Microsoft symbol server and upload them",
    long_about = None,
)]
struct Cli {
    /// Config file (default: ./symfetch.yaml, then the user config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose console output and an extra verbose log file.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch missing symbols, archive them and upload the archive.
    Fetch(FetchArgs),

    /// Upload an existing symbol archive.
    Upload(UploadArgs),

    /// Submit the fetch and upload tasks to the task queue.
    Trigger(TriggerArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage errors exit 1, not clap's default 2.
            let _ = err.print();
            return Ok(match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            });
        }
    };

    let config = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Fetch(args) => {
            let _guards = logging::init_run_logs(&config.state_dir, cli.verbose)?;
            let result = args.run(&config, cli.verbose);
            if let Err(err) = &result {
                tracing::error!("{err:#}");
            }
            result
        }
        Commands::Upload(args) => {
            logging::init_console(cli.verbose)?;
            args.run(&config)
        }
        Commands::Trigger(args) => {
            logging::init_console(cli.verbose)?;
            args.run(&config).map(|()| ExitCode::SUCCESS)
        }
    }
}
