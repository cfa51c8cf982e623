//! In-memory archive trees.
//!
//! An archive is read fully into an [`EntryTree`]: a map from normalized
//! entry path to owned bytes. Trees carry no file handles, so merging and
//! stamping are pure data transformations.

use serde::Serialize;
use std::borrow::Borrow;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies one input archive by its file-system path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArtifactRef(PathBuf);

impl ArtifactRef {
    /// Source recorded for entries generated during assembly.
    pub const SYNTHETIC: &'static str = "<generated>";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub(crate) fn synthetic() -> Self {
        Self(PathBuf::from(Self::SYNTHETIC))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for ArtifactRef {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&str> for ArtifactRef {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

/// Normalized entry name.
///
/// POSIX separators, no leading slash, no `.`/`..` or empty segments.
/// Directory paths end with exactly one `/`, so `a/` and `a` never collide
/// and a directory sorts before everything it contains.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryPath(String);

impl EntryPath {
    /// Normalize a raw archive name.
    ///
    /// Returns `Ok(None)` for names that normalize to the archive root
    /// (`/`, `./`) and are directories; those carry no information.
    pub fn normalize(raw: &str, is_dir: bool) -> Result<Option<Self>, String> {
        let unified = raw.replace('\\', "/");
        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(format!("entry path escapes archive root: {raw:?}")),
                s if segments.is_empty() && s.len() == 2 && s.ends_with(':') => {
                    return Err(format!("absolute entry path: {raw:?}"));
                }
                s if s.contains('\0') => {
                    return Err(format!("entry path contains NUL: {raw:?}"));
                }
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            if is_dir {
                return Ok(None);
            }
            return Err(format!("empty entry path: {raw:?}"));
        }

        let mut path = segments.join("/");
        if is_dir {
            path.push('/');
        }
        Ok(Some(Self(path)))
    }

    /// Normalized file path.
    pub fn file(raw: &str) -> Result<Self, String> {
        Self::normalize(raw, false)?.ok_or_else(|| format!("empty entry path: {raw:?}"))
    }

    /// Normalized directory path.
    pub fn dir(raw: &str) -> Result<Self, String> {
        Self::normalize(raw, true)?.ok_or_else(|| format!("empty entry path: {raw:?}"))
    }

    /// Wrap a constant that is already in normalized form.
    pub(crate) fn from_static(path: &'static str) -> Self {
        Self(path.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_dir(&self) -> bool {
        self.0.ends_with('/')
    }
}

impl Borrow<str> for EntryPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One archive entry with its content and origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    /// File contents; always empty for directories.
    pub data: Vec<u8>,
    pub source: ArtifactRef,
}

impl Entry {
    pub fn file(data: impl Into<Vec<u8>>, source: ArtifactRef) -> Self {
        Self {
            kind: EntryKind::File,
            data: data.into(),
            source,
        }
    }

    pub fn directory(source: ArtifactRef) -> Self {
        Self {
            kind: EntryKind::Directory,
            data: Vec::new(),
            source,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// All entries of one artifact, keyed by normalized path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTree {
    source: ArtifactRef,
    entries: BTreeMap<EntryPath, Entry>,
}

impl EntryTree {
    pub fn new(source: ArtifactRef) -> Self {
        Self {
            source,
            entries: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> &ArtifactRef {
        &self.source
    }

    /// Insert an entry unless the path is already present.
    ///
    /// Returns `false` when the path was taken; the existing entry is kept.
    pub fn insert(&mut self, path: EntryPath, entry: Entry) -> bool {
        match self.entries.entry(path) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Add a file attributed to this tree's artifact.
    pub fn add_file(&mut self, path: EntryPath, data: impl Into<Vec<u8>>) -> bool {
        let entry = Entry::file(data, self.source.clone());
        self.insert(path, entry)
    }

    /// Add a directory attributed to this tree's artifact.
    pub fn add_dir(&mut self, path: EntryPath) -> bool {
        let entry = Entry::directory(self.source.clone());
        self.insert(path, entry)
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &EntryPath> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntryPath, &Entry)> {
        self.entries.iter()
    }

    pub(crate) fn into_parts(self) -> (ArtifactRef, BTreeMap<EntryPath, Entry>) {
        (self.source, self.entries)
    }
}
