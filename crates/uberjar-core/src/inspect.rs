//! Read back an archive and summarize it.

use crate::archive::{self, limits::ReadLimits, ArchiveFormat};
use crate::collect::read_artifact;
use crate::error::{AssemblyError, AssemblyResult};
use crate::manifest::{Manifest, MANIFEST_PATH};
use crate::tree::{ArtifactRef, EntryKind, EntryPath};
use crate::write::digest;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub path: EntryPath,
    pub kind: EntryKind,
    pub size: u64,
}

/// Contents of an archive, in stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub format: ArchiveFormat,
    pub entries: Vec<EntrySummary>,
    /// `Main-Class` of the first manifest entry, if any.
    pub main_class: Option<String>,
    pub sha256: String,
}

impl ArchiveSummary {
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }
}

/// Summarize the archive at `path` using default read limits.
pub fn inspect(path: &Path) -> AssemblyResult<ArchiveSummary> {
    inspect_with_limits(path, ReadLimits::default())
}

pub fn inspect_with_limits(path: &Path, limits: ReadLimits) -> AssemblyResult<ArchiveSummary> {
    let artifact = ArtifactRef::new(path);
    let bytes = read_artifact(&artifact, limits.max_artifact_bytes)?;
    let (format, raw_entries) = archive::read_entries(&artifact, &bytes, limits)?;

    let mut main_class = None;
    let mut seen_manifest = false;
    let mut entries = Vec::with_capacity(raw_entries.len());
    for raw in raw_entries {
        if !seen_manifest && raw.path.as_str() == MANIFEST_PATH {
            seen_manifest = true;
            let manifest = Manifest::parse(&raw.data).map_err(|e| match e {
                AssemblyError::InvalidManifest { reason } => {
                    AssemblyError::corrupt(&artifact, format!("{MANIFEST_PATH}: {reason}"))
                }
                other => other,
            })?;
            main_class = manifest.main_class().map(str::to_string);
        }
        entries.push(EntrySummary {
            path: raw.path,
            kind: raw.kind,
            size: raw.data.len() as u64,
        });
    }

    Ok(ArchiveSummary {
        path: path.to_path_buf(),
        format,
        entries,
        main_class,
        sha256: digest(&bytes),
    })
}
