//! Newline-delimited state files kept in the state directory.
//!
//! | File                          | Shape                     | Lifetime        |
//! |-------------------------------|---------------------------|-----------------|
//! | `blacklist.txt`               | one filename per line     | static          |
//! | `known-microsoft-symbols.txt` | one filename per line     | static          |
//! | `skiplist.txt`                | `debugId filename` lines  | rewritten per run |
//!
//! A missing file loads as an empty list. The skiplist is written with the
//! same `.tmp` + rename pattern as every other persisted file.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;

use crate::error::{io_err, StateError};
use crate::paths;
use crate::types::{DebugId, ModuleFile};

/// Read `path` to a string, treating a missing file as empty.
fn read_optional(path: &Path) -> Result<String, StateError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

fn filename_set(contents: &str) -> HashSet<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect()
}

// ---------------------------------------------------------------------------
// Denylist
// ---------------------------------------------------------------------------

/// Filenames that belong to our own products and are never looked up upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Denylist {
    entries: HashSet<String>,
}

impl Denylist {
    /// Load `<state_dir>/blacklist.txt`.
    pub fn load_at(state_dir: &Path) -> Result<Self, StateError> {
        let contents = read_optional(&paths::denylist_path(state_dir))?;
        Ok(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        Self {
            entries: filename_set(contents),
        }
    }

    pub fn contains(&self, file: &ModuleFile) -> bool {
        self.entries.contains(&file.normalized())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Denylist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|s| s.as_ref().to_lowercase()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Known Microsoft symbols
// ---------------------------------------------------------------------------

/// Filenames known to be published by Microsoft.
///
/// Loaded and reported for compatibility with existing state directories; no
/// fetch decision reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownSymbols {
    entries: HashSet<String>,
}

impl KnownSymbols {
    /// Load `<state_dir>/known-microsoft-symbols.txt`.
    pub fn load_at(state_dir: &Path) -> Result<Self, StateError> {
        let contents = read_optional(&paths::known_microsoft_path(state_dir))?;
        Ok(Self {
            entries: filename_set(&contents),
        })
    }

    pub fn contains(&self, file: &ModuleFile) -> bool {
        self.entries.contains(&file.normalized())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Skiplist
// ---------------------------------------------------------------------------

/// Lookups the upstream server had nothing for: `debug id → lower-cased filename`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skiplist {
    entries: BTreeMap<DebugId, String>,
}

impl Skiplist {
    /// Load `<state_dir>/skiplist.txt`.
    pub fn load_at(state_dir: &Path) -> Result<Self, StateError> {
        let contents = read_optional(&paths::skiplist_path(state_dir))?;
        Ok(Self::parse(&contents))
    }

    /// Parse `debugId filename` lines. Blank and single-field lines are ignored.
    pub fn parse(contents: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((id, file)) = line.split_once(char::is_whitespace) else {
                continue;
            };
            let file = file.trim();
            if file.is_empty() {
                continue;
            }
            entries.insert(DebugId::from(id), file.to_lowercase());
        }
        Self { entries }
    }

    /// True when `id` is recorded against this same filename.
    pub fn matches(&self, file: &ModuleFile, id: &DebugId) -> bool {
        self.entries
            .get(id)
            .is_some_and(|stored| *stored == file.normalized())
    }

    pub fn insert(&mut self, id: DebugId, file: &ModuleFile) {
        self.entries.insert(id, file.normalized());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as `debugId filename` lines, one per entry.
    pub fn to_lines(&self) -> String {
        self.entries
            .iter()
            .map(|(id, file)| format!("{id} {file}\n"))
            .collect()
    }

    /// Atomically overwrite `<state_dir>/skiplist.txt`.
    ///
    /// Write flow: render → `skiplist.txt.tmp` sibling → `rename`.
    pub fn save_at(&self, state_dir: &Path) -> Result<(), StateError> {
        std::fs::create_dir_all(state_dir).map_err(|e| io_err(state_dir, e))?;
        let path = paths::skiplist_path(state_dir);
        let tmp = path.with_extension("txt.tmp");
        std::fs::write(&tmp, self.to_lines()).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&path, e));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_files_load_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(Denylist::load_at(tmp.path()).unwrap().is_empty());
        assert!(KnownSymbols::load_at(tmp.path()).unwrap().is_empty());
        assert!(Skiplist::load_at(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn denylist_is_case_insensitive() {
        let deny = Denylist::parse("XUL.pdb\n\nmozglue.pdb  \n");
        assert_eq!(deny.len(), 2);
        assert!(deny.contains(&ModuleFile::from("xul.PDB")));
        assert!(deny.contains(&ModuleFile::from("mozglue.pdb")));
        assert!(!deny.contains(&ModuleFile::from("ntdll.pdb")));
    }

    #[test]
    fn skiplist_parse_skips_malformed_lines() {
        let skip = Skiplist::parse("ABC foo.pdb\n\nlonely\nDEF  Bar.PDB\n");
        assert_eq!(skip.len(), 2);
        assert!(skip.matches(&ModuleFile::from("Foo.pdb"), &DebugId::from("ABC")));
        assert!(skip.matches(&ModuleFile::from("bar.pdb"), &DebugId::from("DEF")));
    }

    #[test]
    fn skiplist_match_requires_same_filename() {
        let skip = Skiplist::parse("ABC foo.pdb\n");
        assert!(!skip.matches(&ModuleFile::from("other.pdb"), &DebugId::from("ABC")));
        assert!(!skip.matches(&ModuleFile::from("foo.pdb"), &DebugId::from("XYZ")));
    }

    #[test]
    fn skiplist_roundtrip_through_disk() {
        let tmp = TempDir::new().unwrap();
        let mut skip = Skiplist::default();
        skip.insert(DebugId::from("B2"), &ModuleFile::from("Two.pdb"));
        skip.insert(DebugId::from("A1"), &ModuleFile::from("one.pdb"));
        skip.save_at(tmp.path()).unwrap();

        let on_disk = std::fs::read_to_string(paths::skiplist_path(tmp.path())).unwrap();
        assert_eq!(on_disk, "A1 one.pdb\nB2 two.pdb\n");

        let loaded = Skiplist::load_at(tmp.path()).unwrap();
        assert_eq!(loaded, skip);
    }

    #[test]
    fn skiplist_save_cleans_up_tmp() {
        let tmp = TempDir::new().unwrap();
        Skiplist::default().save_at(tmp.path()).unwrap();
        let tmp_path = paths::skiplist_path(tmp.path()).with_extension("txt.tmp");
        assert!(!tmp_path.exists(), "tmp file should be removed after rename");
    }
}
