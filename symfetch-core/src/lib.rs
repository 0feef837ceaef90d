//! symfetch core library — domain types, run context, state files, config.
//!
//! Public API surface:
//! - [`types`]: newtypes, fetch outcomes and tallies
//! - [`context`]: [`RunContext`], the per-run state threaded through the pipeline
//! - [`lists`]: denylist / skiplist / known-symbols files
//! - [`config`]: YAML configuration with environment overrides
//! - [`paths`]: well-known file names inside the state directory
//! - [`error`]: [`StateError`]

pub mod config;
pub mod context;
pub mod error;
pub mod lists;
pub mod paths;
pub mod types;

pub use config::Config;
pub use context::RunContext;
pub use error::StateError;
pub use lists::{Denylist, KnownSymbols, Skiplist};
pub use types::{DebugId, FetchOutcome, ModuleFile, ModuleList, ModuleRecord, Tallies};
