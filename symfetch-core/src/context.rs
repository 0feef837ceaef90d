//! Per-run state threaded explicitly through every pipeline stage.

use std::path::Path;

use crate::error::StateError;
use crate::lists::{Denylist, KnownSymbols, Skiplist};
use crate::types::{FetchOutcome, Tallies};

/// Everything a fetch run reads and accumulates.
///
/// Owned by the single run thread and passed by `&mut` into each stage.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub denylist: Denylist,
    pub skiplist: Skiplist,
    pub known_microsoft: KnownSymbols,
    pub tallies: Tallies,
    /// Relative paths of fetched symbol files, in fetch order.
    pub file_index: Vec<String>,
    /// Emit a per-item progress line on the console.
    pub verbose: bool,
}

impl RunContext {
    /// Load the three list files from `state_dir`.
    pub fn load_at(state_dir: &Path, verbose: bool) -> Result<Self, StateError> {
        let denylist = Denylist::load_at(state_dir)?;
        tracing::debug!("denylist contains {} items", denylist.len());
        let known_microsoft = KnownSymbols::load_at(state_dir)?;
        tracing::debug!(
            "known Microsoft symbols contains {} items",
            known_microsoft.len()
        );
        let skiplist = Skiplist::load_at(state_dir)?;
        tracing::debug!("skiplist contains {} items", skiplist.len());

        Ok(Self {
            denylist,
            skiplist,
            known_microsoft,
            tallies: Tallies::default(),
            file_index: Vec::new(),
            verbose,
        })
    }

    pub fn record(&mut self, outcome: FetchOutcome) {
        self.tallies.record(outcome);
    }
}
