//! Domain types for a symbol fetch run.
//!
//! Module filenames keep the case they arrive with in the feed; comparisons
//! against the denylist and skiplist go through [`ModuleFile::normalized`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Suffix every accepted module filename must carry.
pub const MODULE_SUFFIX: &str = ".pdb";

/// Suffix of converted symbol files.
pub const SYMBOL_SUFFIX: &str = ".sym";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A debug-file name such as `xul.pdb`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleFile(pub String);

impl ModuleFile {
    /// Lower-cased form used for denylist and skiplist matching.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }

    /// The filename without its `.pdb` suffix (`xul.pdb` → `xul`).
    pub fn stem(&self) -> &str {
        let Some(cut) = self.0.len().checked_sub(MODULE_SUFFIX.len()) else {
            return &self.0;
        };
        match (self.0.get(..cut), self.0.get(cut..)) {
            (Some(stem), Some(tail)) if tail.eq_ignore_ascii_case(MODULE_SUFFIX) => stem,
            _ => &self.0,
        }
    }

    /// Name of the cabinet-compressed file on the symbol server: the last
    /// character of the filename replaced with `_` (`xul.pdb` → `xul.pd_`).
    pub fn compressed_name(&self) -> String {
        let mut chars = self.0.chars();
        chars.next_back();
        format!("{}_", chars.as_str())
    }

    /// Relative path of the converted symbol file:
    /// `<filename>/<debug id>/<stem>.sym`.
    pub fn symbol_relpath(&self, id: &DebugId) -> String {
        format!("{}/{}/{}{}", self.0, id.0, self.stem(), SYMBOL_SUFFIX)
    }
}

impl fmt::Display for ModuleFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ModuleFile {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ModuleFile {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A debug identifier naming one specific build of a module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DebugId(pub String);

impl fmt::Display for DebugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DebugId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DebugId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One `(filename, debug id)` pair from the missing-symbols feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRecord {
    pub file: ModuleFile,
    pub debug_id: DebugId,
}

/// Feed records grouped by filename. Ordered so runs are reproducible.
pub type ModuleList = BTreeMap<ModuleFile, BTreeSet<DebugId>>;

/// Total number of `(filename, id)` pairs in a module list.
pub fn pair_count(modules: &ModuleList) -> usize {
    modules.values().map(BTreeSet::len).sum()
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to a single `(filename, id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchOutcome {
    /// Filename is one of ours; never looked up upstream.
    Denylisted,
    /// Asked before without success; skipped without a network call.
    Skiplisted,
    /// The destination symbol store already has the converted file.
    AlreadyPresent,
    /// Downloaded, decompressed and converted.
    Fetched,
    /// Upstream did not have it, or a conversion step failed.
    NotFound,
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Denylisted => write!(f, "denylisted"),
            FetchOutcome::Skiplisted => write!(f, "skiplisted"),
            FetchOutcome::AlreadyPresent => write!(f, "already present"),
            FetchOutcome::Fetched => write!(f, "fetched"),
            FetchOutcome::NotFound => write!(f, "not found"),
        }
    }
}

/// Per-outcome counters for the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tallies {
    pub considered: usize,
    pub denylisted: usize,
    pub skiplisted: usize,
    pub existing: usize,
    pub fetched: usize,
    pub not_found: usize,
}

impl Tallies {
    /// Count one pair against its outcome.
    pub fn record(&mut self, outcome: FetchOutcome) {
        self.considered += 1;
        match outcome {
            FetchOutcome::Denylisted => self.denylisted += 1,
            FetchOutcome::Skiplisted => self.skiplisted += 1,
            FetchOutcome::AlreadyPresent => self.existing += 1,
            FetchOutcome::Fetched => self.fetched += 1,
            FetchOutcome::NotFound => self.not_found += 1,
        }
    }
}

impl fmt::Display for Tallies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} considered, {} fetched, {} already present, {} in denylist, {} skipped, {} not found",
            self.considered,
            self.fetched,
            self.existing,
            self.denylisted,
            self.skiplisted,
            self.not_found
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("xul.pdb", "xul")]
    #[case("NTDLL.PDB", "NTDLL")]
    #[case("odd", "odd")]
    #[case(".pdb", "")]
    fn stem_strips_suffix_case_insensitively(#[case] name: &str, #[case] stem: &str) {
        assert_eq!(ModuleFile::from(name).stem(), stem);
    }

    #[test]
    fn compressed_name_replaces_last_char() {
        assert_eq!(ModuleFile::from("foo.pdb").compressed_name(), "foo.pd_");
    }

    #[test]
    fn symbol_relpath_layout() {
        let file = ModuleFile::from("foo.pdb");
        let id = DebugId::from("ABC123");
        assert_eq!(file.symbol_relpath(&id), "foo.pdb/ABC123/foo.sym");
    }

    #[test]
    fn tallies_count_each_outcome_once() {
        let mut t = Tallies::default();
        t.record(FetchOutcome::Denylisted);
        t.record(FetchOutcome::Fetched);
        t.record(FetchOutcome::NotFound);
        assert_eq!(t.considered, 3);
        assert_eq!(t.denylisted, 1);
        assert_eq!(t.fetched, 1);
        assert_eq!(t.not_found, 1);
        assert_eq!(t.existing, 0);
    }

    #[test]
    fn pair_count_sums_ids() {
        let mut modules = ModuleList::new();
        modules
            .entry(ModuleFile::from("a.pdb"))
            .or_default()
            .extend([DebugId::from("1"), DebugId::from("2")]);
        modules
            .entry(ModuleFile::from("b.pdb"))
            .or_default()
            .insert(DebugId::from("3"));
        assert_eq!(pair_count(&modules), 3);
    }
}
