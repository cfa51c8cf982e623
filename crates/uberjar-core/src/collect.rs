//! Archive Collector: input artifacts → in-memory entry trees.
//!
//! Each artifact is opened, read fully and closed before the next one is
//! touched. A bad artifact aborts the whole run; nothing is skipped.

use crate::archive::{self, limits::ReadLimits};
use crate::error::{AssemblyError, AssemblyResult};
use crate::tree::{ArtifactRef, EntryKind, EntryPath, EntryTree};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::fs::File;
use std::io::Read;

/// Options shared by every artifact of one collection run.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    limits: ReadLimits,
    patterns: Vec<String>,
    excludes: GlobSet,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            limits: ReadLimits::default(),
            patterns: Vec::new(),
            excludes: GlobSet::empty(),
        }
    }
}

impl CollectOptions {
    /// Build options from read limits and exclude globs.
    ///
    /// Globs match normalized entry paths; `*` stays within one segment,
    /// `**` crosses segments.
    pub fn new(limits: ReadLimits, excludes: &[String]) -> AssemblyResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in excludes {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| AssemblyError::config(format!("invalid exclude pattern {pattern:?}: {e}")))?;
            builder.add(glob);
        }
        let excludes_set = builder
            .build()
            .map_err(|e| AssemblyError::config(format!("invalid exclude patterns: {e}")))?;

        Ok(Self {
            limits,
            patterns: excludes.to_vec(),
            excludes: excludes_set,
        })
    }

    pub fn limits(&self) -> ReadLimits {
        self.limits
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_excluded(&self, path: &EntryPath) -> bool {
        !self.patterns.is_empty() && self.excludes.is_match(path.as_str())
    }
}

/// Read every artifact into an `EntryTree`, preserving input order.
pub fn collect(
    artifacts: &[ArtifactRef],
    options: &CollectOptions,
) -> AssemblyResult<Vec<EntryTree>> {
    artifacts
        .iter()
        .map(|artifact| collect_one(artifact, options))
        .collect()
}

/// Read a single artifact into an `EntryTree`.
///
/// If the container stores the same name twice, the first stored entry is
/// kept.
pub fn collect_one(artifact: &ArtifactRef, options: &CollectOptions) -> AssemblyResult<EntryTree> {
    let bytes = read_artifact(artifact, options.limits.max_artifact_bytes)?;
    let (format, raw_entries) = archive::read_entries(artifact, &bytes, options.limits)?;

    let mut tree = EntryTree::new(artifact.clone());
    let mut excluded = 0usize;
    for raw in raw_entries {
        if options.is_excluded(&raw.path) {
            excluded += 1;
            continue;
        }
        let path = raw.path;
        let inserted = match raw.kind {
            EntryKind::File => tree.add_file(path.clone(), raw.data),
            EntryKind::Directory => tree.add_dir(path.clone()),
        };
        if !inserted {
            tracing::debug!(%artifact, %path, "duplicate name within archive, keeping first");
        }
    }

    tracing::debug!(
        %artifact,
        %format,
        entries = tree.len(),
        excluded,
        "collected artifact"
    );
    Ok(tree)
}

/// Read a whole artifact file; the handle is closed on return.
pub(crate) fn read_artifact(artifact: &ArtifactRef, max_bytes: u64) -> AssemblyResult<Vec<u8>> {
    let mut file = File::open(artifact.path()).map_err(|e| unreadable(artifact, e))?;
    let meta = file.metadata().map_err(|e| unreadable(artifact, e))?;
    if meta.is_dir() {
        return Err(unreadable(
            artifact,
            std::io::Error::other("is a directory, expected an archive file"),
        ));
    }
    if meta.len() > max_bytes {
        return Err(AssemblyError::corrupt(
            artifact,
            format!(
                "LimitArtifactBytes: {} bytes exceeds limit {}",
                meta.len(),
                max_bytes
            ),
        ));
    }

    let mut bytes = Vec::with_capacity(meta.len() as usize);
    file.read_to_end(&mut bytes)
        .map_err(|e| unreadable(artifact, e))?;
    Ok(bytes)
}

fn unreadable(artifact: &ArtifactRef, source: std::io::Error) -> AssemblyError {
    AssemblyError::UnreadableArtifact {
        artifact: artifact.clone(),
        source,
    }
}
