use serde::Deserialize;
use std::io::Read;

/// Resource limits applied while reading input archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    pub max_artifact_bytes: u64,
    pub max_entry_bytes: u64,
    pub max_total_bytes: u64,
    pub max_entries: usize,
    pub max_path_len: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_artifact_bytes: 1024_u64 * 1024 * 1024,
            max_entry_bytes: 512_u64 * 1024 * 1024,
            max_total_bytes: 2048_u64 * 1024 * 1024,
            max_entries: 500_000,
            max_path_len: 1024,
        }
    }
}

/// Partial overrides for `ReadLimits`. Used for YAML config parsing.
/// Unknown keys cause deserialization to fail (deny_unknown_fields).
/// Merge with `ReadLimits::default().apply(overrides)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadLimitsOverrides {
    pub max_artifact_bytes: Option<u64>,
    pub max_entry_bytes: Option<u64>,
    pub max_total_bytes: Option<u64>,
    pub max_entries: Option<usize>,
    pub max_path_len: Option<usize>,
}

impl ReadLimitsOverrides {
    /// Layer `other` on top of `self`; `other` wins where set.
    pub fn or(self, other: Self) -> Self {
        Self {
            max_artifact_bytes: other.max_artifact_bytes.or(self.max_artifact_bytes),
            max_entry_bytes: other.max_entry_bytes.or(self.max_entry_bytes),
            max_total_bytes: other.max_total_bytes.or(self.max_total_bytes),
            max_entries: other.max_entries.or(self.max_entries),
            max_path_len: other.max_path_len.or(self.max_path_len),
        }
    }
}

impl ReadLimits {
    /// Apply overrides onto these defaults. Only `Some` values override.
    pub fn apply(self, overrides: ReadLimitsOverrides) -> Self {
        Self {
            max_artifact_bytes: overrides
                .max_artifact_bytes
                .unwrap_or(self.max_artifact_bytes),
            max_entry_bytes: overrides.max_entry_bytes.unwrap_or(self.max_entry_bytes),
            max_total_bytes: overrides.max_total_bytes.unwrap_or(self.max_total_bytes),
            max_entries: overrides.max_entries.unwrap_or(self.max_entries),
            max_path_len: overrides.max_path_len.unwrap_or(self.max_path_len),
        }
    }
}

/// A reader that limits the total number of bytes read and fails explicitly on overflow.
pub(crate) struct LimitReader<R> {
    inner: R,
    limit: u64,
    read: u64,
    error_tag: &'static str,
}

impl<R: Read> LimitReader<R> {
    pub(crate) fn new(inner: R, limit: u64, error_tag: &'static str) -> Self {
        Self {
            inner,
            limit,
            read: 0,
            error_tag,
        }
    }
}

impl<R: Read> Read for LimitReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.read >= self.limit {
            // At the limit: only a clean EOF is acceptable.
            let mut probe = [0u8; 1];
            return match self.inner.read(&mut probe)? {
                0 => Ok(0),
                _ => Err(std::io::Error::other(format!(
                    "{}: exceeded limit of {} bytes",
                    self.error_tag, self.limit
                ))),
            };
        }

        let max_to_read = (self.limit - self.read).min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..max_to_read])?;
        self.read += n as u64;

        Ok(n)
    }
}

/// Read `reader` to the end, failing once more than `limit` bytes arrive.
pub(crate) fn read_bounded<R: Read>(
    reader: R,
    limit: u64,
    error_tag: &'static str,
) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    LimitReader::new(reader, limit, error_tag).read_to_end(&mut out)?;
    Ok(out)
}
