//! Entry Merger: exclude-on-duplicate.
//!
//! The first tree that contains a path wins it. Later occurrences are
//! dropped: never overwritten, never concatenated. The primary artifact is
//! visited first, so the build's own entries are never shadowed by a
//! dependency.
//!
//! Directories shared by several inputs are merged silently; only file
//! collisions are recorded as [`Conflict`]s.
//!
//! Service-registration style files (`META-INF/services/*`) contributed by
//! several dependencies are therefore NOT combined; only the first one
//! survives.

use crate::tree::{ArtifactRef, Entry, EntryPath, EntryTree};
use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// A file path present in more than one input tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub path: EntryPath,
    pub winner: ArtifactRef,
    /// Losing artifacts, in visit order.
    pub dropped: Vec<ArtifactRef>,
}

/// Union of all input trees with exactly one entry per path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedTree {
    entries: BTreeMap<EntryPath, Entry>,
    conflicts: BTreeMap<EntryPath, Conflict>,
}

impl MergedTree {
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

    /// Entries in lexicographic path order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntryPath, &Entry)> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &EntryPath> {
        self.entries.keys()
    }

    /// Contested paths, ordered by path.
    pub fn conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.values()
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// Add an entry under the merge policy: a taken path keeps its winner.
    fn offer(&mut self, path: EntryPath, entry: Entry) {
        match self.entries.entry(path) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            // Directories shared by several inputs carry no content.
            btree_map::Entry::Occupied(slot) if entry.is_dir() => {
                tracing::trace!(path = %slot.key(), dropped = %entry.source, "shared directory");
            }
            btree_map::Entry::Occupied(slot) => {
                let winner = &slot.get().source;
                tracing::debug!(
                    path = %slot.key(),
                    %winner,
                    dropped = %entry.source,
                    "duplicate entry excluded"
                );
                self.conflicts
                    .entry(slot.key().clone())
                    .or_insert_with(|| Conflict {
                        path: slot.key().clone(),
                        winner: winner.clone(),
                        dropped: Vec::new(),
                    })
                    .dropped
                    .push(entry.source);
            }
        }
    }

    /// Replace an entry regardless of policy; returns the previous one.
    pub(crate) fn replace(&mut self, path: EntryPath, entry: Entry) -> Option<Entry> {
        self.entries.insert(path, entry)
    }

    pub(crate) fn remove(&mut self, path: &str) -> Option<Entry> {
        self.entries.remove(path)
    }

    /// Insert only when absent.
    pub(crate) fn insert_if_absent(&mut self, path: EntryPath, entry: Entry) -> bool {
        match self.entries.entry(path) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }
}

/// Merge dependency trees with the primary tree.
///
/// Visit order is `primary`, then `trees` in the given order.
pub fn merge(trees: impl IntoIterator<Item = EntryTree>, primary: EntryTree) -> MergedTree {
    let mut merged = MergedTree::default();
    for tree in std::iter::once(primary).chain(trees) {
        let (_, entries) = tree.into_parts();
        for (path, entry) in entries {
            merged.offer(path, entry);
        }
    }
    merged
}
