//! Archive Writer.
//!
//! Deterministic layout: the manifest directory and manifest first (where a
//! `JarInputStream` expects them), then every other entry in lexicographic
//! path order. Directory paths end in `/`, so a directory always precedes
//! its contents.
//!
//! The archive is assembled in memory, written to a temporary file next to
//! the output, synced and renamed into place. A failed write leaves nothing
//! at the output path.

use crate::archive::{self, ArchiveFormat};
use crate::error::{AssemblyError, AssemblyResult};
use crate::manifest::{MANIFEST_DIR, MANIFEST_PATH};
use crate::merge::MergedTree;
use crate::tree::{Entry, EntryPath};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};

/// The written uber-archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub format: ArchiveFormat,
    pub entry_count: usize,
    pub bytes: u64,
    /// `sha256:<hex>` of the file contents.
    pub sha256: String,
}

/// Write `tree` to `output` atomically.
pub fn write(
    tree: &MergedTree,
    output: &Path,
    format: ArchiveFormat,
) -> AssemblyResult<OutputArtifact> {
    let bytes = write_to(tree, format, Cursor::new(Vec::new()))
        .map_err(|e| write_failure(output, e))?
        .into_inner();
    let sha256 = digest(&bytes);

    persist_atomic(output, &bytes).map_err(|e| write_failure(output, e))?;

    tracing::info!(
        output = %output.display(),
        %format,
        entries = tree.len(),
        bytes = bytes.len(),
        %sha256,
        "wrote archive"
    );

    Ok(OutputArtifact {
        path: output.to_path_buf(),
        format,
        entry_count: tree.len(),
        bytes: bytes.len() as u64,
        sha256,
    })
}

/// Serialize `tree` into `sink` in write order.
pub fn write_to<W: Write + Seek>(
    tree: &MergedTree,
    format: ArchiveFormat,
    sink: W,
) -> std::io::Result<W> {
    let ordered = write_order(tree);
    archive::write_entries(format, &ordered, sink)
}

/// Entries in the order they are written.
pub fn write_order(tree: &MergedTree) -> Vec<(&EntryPath, &Entry)> {
    let mut head = Vec::with_capacity(2);
    let mut rest = Vec::with_capacity(tree.len());
    for (path, entry) in tree.iter() {
        if path.as_str() == MANIFEST_DIR || path.as_str() == MANIFEST_PATH {
            head.push((path, entry));
        } else {
            rest.push((path, entry));
        }
    }
    head.extend(rest);
    head
}

pub(crate) fn digest(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}

fn persist_atomic(output: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    // Dropping the temp file on any error path removes it.
    let mut tmp = tempfile::Builder::new()
        .prefix(".uberjar-")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| e.error)?;
    Ok(())
}

fn write_failure(output: &Path, source: std::io::Error) -> AssemblyError {
    AssemblyError::WriteFailure {
        path: output.to_path_buf(),
        source,
    }
}
