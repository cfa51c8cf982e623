//! Zip (jar) container read/write.

use super::limits::read_bounded;
use super::{RawEntry, ReadBudget};
use crate::tree::{Entry, EntryKind, EntryPath};
use std::io::{self, Cursor, Seek, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

pub(super) fn read_entries(bytes: &[u8], budget: &mut ReadBudget) -> Result<Vec<RawEntry>, String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("invalid zip container: {e}"))?;

    let mut out = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| format!("zip entry #{i}: {e}"))?;
        let name = file.name().to_string();
        let is_dir = file.is_dir();

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

        // CRC32 is checked by the zip reader once the entry is read to the end.
        let (allowance, tag) = budget.entry_allowance();
        let data = read_bounded(&mut file, allowance, tag).map_err(|e| format!("{name}: {e}"))?;
        budget.consume(data.len() as u64);
        out.push(RawEntry {
            path,
            kind: EntryKind::File,
            data,
        });
    }
    Ok(out)
}

pub(super) fn write_entries<W: Write + Seek>(
    entries: &[(&EntryPath, &Entry)],
    sink: W,
) -> io::Result<W> {
    let file_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);
    let dir_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o755);

    let mut zip = ZipWriter::new(sink);
    for (path, entry) in entries {
        match entry.kind {
            EntryKind::Directory => zip
                .add_directory(path.as_str(), dir_options)
                .map_err(into_io)?,
            EntryKind::File => {
                zip.start_file(path.as_str(), file_options)
                    .map_err(into_io)?;
                zip.write_all(&entry.data)?;
            }
        }
    }
    zip.finish().map_err(into_io)
}

/// Unwrap sink errors so the underlying cause reaches the caller.
fn into_io(err: ZipError) -> io::Error {
    match err {
        ZipError::Io(e) => e,
        other => io::Error::other(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::limits::ReadLimits;
    use crate::tree::ArtifactRef;

    fn sample() -> Vec<(EntryPath, Entry)> {
        let src = ArtifactRef::new("t.jar");
        vec![
            (EntryPath::dir("com").unwrap(), Entry::directory(src.clone())),
            (
                EntryPath::file("com/Main.class").unwrap(),
                Entry::file(b"\xca\xfe\xba\xbe".to_vec(), src),
            ),
        ]
    }

    fn write(entries: &[(EntryPath, Entry)]) -> Vec<u8> {
        let refs: Vec<_> = entries.iter().map(|(p, e)| (p, e)).collect();
        write_entries(&refs, Cursor::new(Vec::new()))
            .unwrap()
            .into_inner()
    }

    #[test]
    fn written_jar_reads_back_in_order() {
        let bytes = write(&sample());
        let mut budget = ReadBudget::new(ReadLimits::default());
        let read = read_entries(&bytes, &mut budget).unwrap();

        assert_eq!(read.len(), 2);
        assert_eq!(read[0].path.as_str(), "com/");
        assert_eq!(read[0].kind, EntryKind::Directory);
        assert_eq!(read[1].path.as_str(), "com/Main.class");
        assert_eq!(read[1].data, b"\xca\xfe\xba\xbe");
    }

    #[test]
    fn output_is_reproducible() {
        assert_eq!(write(&sample()), write(&sample()));
    }

    #[test]
    fn truncated_jar_is_rejected() {
        let bytes = write(&sample());
        let truncated = &bytes[..bytes.len() / 2];
        let mut budget = ReadBudget::new(ReadLimits::default());
        let err = read_entries(truncated, &mut budget).unwrap_err();
        assert!(err.contains("invalid zip container"), "{err}");
    }

    #[test]
    fn oversized_entry_hits_limit() {
        let src = ArtifactRef::new("big.jar");
        let entries = vec![(
            EntryPath::file("blob.bin").unwrap(),
            Entry::file(vec![0u8; 4096], src),
        )];
        let bytes = write(&entries);
        let mut budget = ReadBudget::new(ReadLimits {
            max_entry_bytes: 1024,
            ..Default::default()
        });
        let err = read_entries(&bytes, &mut budget).unwrap_err();
        assert!(err.contains("LimitEntryBytes"), "{err}");
    }
}
