//! # symfetch-pipeline
//!
//! The fetch → convert → archive → upload batch run.
//!
//! Call [`pipeline::Pipeline::run`] for a complete run, or use the stage
//! modules directly: [`feed`], [`fetcher`], [`archive`], [`upload`].

pub mod archive;
pub mod error;
pub mod feed;
pub mod fetcher;
pub mod pipeline;
pub mod tools;
pub mod upload;

pub use error::{PipelineError, ToolError};
pub use feed::FeedSource;
pub use fetcher::{Fetcher, SymbolServers};
pub use pipeline::{Pipeline, RunReport};
pub use tools::{CommandDecompressor, CommandDumper, Decompressor, SymbolDumper};
pub use upload::{UploadOutcome, UploadSettings};
