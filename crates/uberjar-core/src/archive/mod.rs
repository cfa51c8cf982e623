//! Archive container formats.
//!
//! Two containers are understood:
//! - `Jar`: zip container (`.jar`, `.zip`, `.war`, `.ear`)
//! - `TarGz`: gzip-compressed tar (`.tar.gz`, `.tgz`)
//!
//! Inputs are detected from their magic bytes; outputs take their format
//! from configuration or the output file extension.
//!
//! # Modules
//!
//! - [`limits`]: read limits shared by both readers
//! - `jar`: zip read/write
//! - `tar_gz`: deterministic tar.gz read/write

pub mod limits;

mod jar;
mod tar_gz;

use crate::error::{AssemblyError, AssemblyResult};
use crate::tree::{ArtifactRef, Entry, EntryKind, EntryPath};
use limits::ReadLimits;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Seek, Write};
use std::path::Path;

const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";
const GZIP_MAGIC: &[u8] = b"\x1f\x8b";

/// Container format of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    #[default]
    Jar,
    TarGz,
}

impl ArchiveFormat {
    /// Detect the container from leading magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(ZIP_LOCAL_HEADER) || bytes.starts_with(ZIP_EMPTY_ARCHIVE) {
            Some(Self::Jar)
        } else if bytes.starts_with(GZIP_MAGIC) {
            Some(Self::TarGz)
        } else {
            None
        }
    }

    /// Infer the container from a file name.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            return Some(Self::TarGz);
        }
        match Path::new(&name).extension()?.to_str()? {
            "jar" | "zip" | "war" | "ear" => Some(Self::Jar),
            _ => None,
        }
    }

    /// Output format for `path`, defaulting to `Jar`.
    pub fn for_output(path: &Path) -> Self {
        Self::from_extension(path).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jar => "jar",
            Self::TarGz => "tar-gz",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry as stored in an archive, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawEntry {
    pub path: EntryPath,
    pub kind: EntryKind,
    pub data: Vec<u8>,
}

/// Running totals checked against `ReadLimits` while one artifact is decoded.
pub(crate) struct ReadBudget {
    limits: ReadLimits,
    entries: usize,
    total_bytes: u64,
}

impl ReadBudget {
    pub(crate) fn new(limits: ReadLimits) -> Self {
        Self {
            limits,
            entries: 0,
            total_bytes: 0,
        }
    }

    /// Count one more entry and normalize its name.
    pub(crate) fn admit(&mut self, raw: &str, is_dir: bool) -> Result<Option<EntryPath>, String> {
        self.entries += 1;
        if self.entries > self.limits.max_entries {
            return Err(format!(
                "LimitEntries: more than {} entries",
                self.limits.max_entries
            ));
        }
        if raw.len() > self.limits.max_path_len {
            return Err(format!(
                "LimitPathLength: path length {} exceeds limit {}",
                raw.len(),
                self.limits.max_path_len
            ));
        }
        EntryPath::normalize(raw, is_dir)
    }

    /// Byte allowance for the next entry and the limit that bounds it.
    pub(crate) fn entry_allowance(&self) -> (u64, &'static str) {
        let remaining_total = self.limits.max_total_bytes.saturating_sub(self.total_bytes);
        if self.limits.max_entry_bytes <= remaining_total {
            (self.limits.max_entry_bytes, "LimitEntryBytes")
        } else {
            (remaining_total, "LimitTotalBytes")
        }
    }

    pub(crate) fn consume(&mut self, bytes: u64) {
        self.total_bytes += bytes;
    }
}

/// Decode every entry of an in-memory archive, in stored order.
pub(crate) fn read_entries(
    artifact: &ArtifactRef,
    bytes: &[u8],
    limits: ReadLimits,
) -> AssemblyResult<(ArchiveFormat, Vec<RawEntry>)> {
    let format = ArchiveFormat::detect(bytes).ok_or_else(|| {
        AssemblyError::corrupt(artifact, "unrecognized archive format (expected jar/zip or tar.gz)")
    })?;

    let mut budget = ReadBudget::new(limits);
    let entries = match format {
        ArchiveFormat::Jar => jar::read_entries(bytes, &mut budget),
        ArchiveFormat::TarGz => tar_gz::read_entries(bytes, &mut budget),
    }
    .map_err(|reason| AssemblyError::corrupt(artifact, reason))?;

    Ok((format, entries))
}

/// Serialize entries, in the given order, into `sink`.
pub(crate) fn write_entries<W: Write + Seek>(
    format: ArchiveFormat,
    entries: &[(&EntryPath, &Entry)],
    sink: W,
) -> std::io::Result<W> {
    match format {
        ArchiveFormat::Jar => jar::write_entries(entries, sink),
        ArchiveFormat::TarGz => tar_gz::write_entries(entries, sink),
    }
}
