//! Deterministic tar.gz container read/write.

use super::limits::read_bounded;
use super::{RawEntry, ReadBudget};
use crate::tree::{Entry, EntryKind, EntryPath};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use std::io::{self, Write};
use tar::{Builder, EntryType, Header};

const OWNER: &str = "uberjar";

pub(super) fn read_entries(bytes: &[u8], budget: &mut ReadBudget) -> Result<Vec<RawEntry>, String> {
    // Multi-member streams (pigz, concatenated gzip) are one archive.
    let mut archive = tar::Archive::new(MultiGzDecoder::new(bytes));
    let entries = archive
        .entries()
        .map_err(|e| format!("invalid tar.gz stream: {e}"))?;

    let mut out = Vec::new();
    for (i, entry) in entries.enumerate() {
        let mut entry = entry.map_err(|e| format!("tar entry #{i}: {e}"))?;
        let name = String::from_utf8(entry.path_bytes().into_owned())
            .map_err(|_| format!("tar entry #{i}: path is not UTF-8"))?;

        let is_dir = match entry.header().entry_type() {
            EntryType::Directory => true,
            EntryType::Regular | EntryType::Continuous => false,
            other => {
                tracing::warn!(path = %name, entry_type = ?other, "skipping unsupported tar entry");
                continue;
            }
        };

        let Some(path) = budget.admit(&name, is_dir)? else {
            continue;
        };

        if is_dir {
            out.push(RawEntry {
                path,
                kind: EntryKind::Directory,
                data: Vec::new(),
            });
            continue;
        }

        let (allowance, tag) = budget.entry_allowance();
        let data = read_bounded(&mut entry, allowance, tag).map_err(|e| format!("{name}: {e}"))?;
        budget.consume(data.len() as u64);
        out.push(RawEntry {
            path,
            kind: EntryKind::File,
            data,
        });
    }

    // The tar reader stops at the end-of-archive blocks; drain the rest so
    // the gzip trailer (CRC32 and length) is verified.
    let mut decoder = archive.into_inner();
    io::copy(&mut decoder, &mut io::sink())
        .map_err(|e| format!("invalid tar.gz stream: {e}"))?;
    Ok(out)
}

pub(super) fn write_entries<W: Write>(
    entries: &[(&EntryPath, &Entry)],
    sink: W,
) -> std::io::Result<W> {
    let mut tar = create_deterministic_tar(sink);
    for (path, entry) in entries {
        write_entry(&mut tar, path.as_str(), entry)?;
    }
    let encoder = tar.into_inner()?;
    encoder.finish()
}

fn create_deterministic_tar<W: Write>(writer: W) -> Builder<GzEncoder<W>> {
    let encoder = GzBuilder::new()
        .mtime(0)
        .operating_system(255)
        .write(writer, Compression::best());

    let mut tar = Builder::new(encoder);
    tar.mode(tar::HeaderMode::Deterministic);
    tar
}

fn write_entry<T: Write>(tar: &mut Builder<T>, path: &str, entry: &Entry) -> std::io::Result<()> {
    let mut header = Header::new_gnu();
    match entry.kind {
        EntryKind::Directory => {
            header.set_entry_type(EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
        }
        EntryKind::File => {
            header.set_entry_type(EntryType::Regular);
            header.set_mode(0o644);
            header.set_size(entry.data.len() as u64);
        }
    }
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_username(OWNER)?;
    header.set_groupname(OWNER)?;

    // append_data writes GNU long-name records for paths over 100 bytes.
    tar.append_data(&mut header, path, entry.data.as_slice())
}
