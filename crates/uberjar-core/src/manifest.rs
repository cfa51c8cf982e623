//! Jar manifest model: declaration, rendering and parsing.
//!
//! Rendering follows the jar manifest line format: `Name: value` lines
//! terminated by CRLF, at most 72 bytes per line, continuation lines
//! starting with a single space, and an empty line closing the section.

use crate::error::{AssemblyError, AssemblyResult};
use std::collections::BTreeMap;

/// Canonical manifest location inside the archive.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
/// Directory holding the manifest.
pub const MANIFEST_DIR: &str = "META-INF/";

pub const MANIFEST_VERSION: &str = "Manifest-Version";
pub const MAIN_CLASS: &str = "Main-Class";

const DEFAULT_MANIFEST_VERSION: &str = "1.0";
const MAX_LINE_BYTES: usize = 72;
const MAX_NAME_BYTES: usize = 70;

/// Attributes to stamp into the output manifest.
///
/// Names are compared case-insensitively, as the jar format does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestSpec {
    attributes: BTreeMap<String, String>,
}

impl ManifestSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declaration holding only the entry-point.
    pub fn with_main_class(main_class: impl Into<String>) -> Self {
        Self::new().attribute(MAIN_CLASS, main_class)
    }

    /// Set an attribute, replacing any existing one with the same name.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.attributes
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.attributes.insert(name, value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Declared entry-point, if any and not blank.
    pub fn main_class(&self) -> Option<&str> {
        self.get(MAIN_CLASS)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Check the declaration can be rendered.
    pub fn validate(&self) -> AssemblyResult<()> {
        let main_class = self.main_class().ok_or(AssemblyError::MissingEntryPoint)?;
        if !is_qualified_name(main_class) {
            return Err(AssemblyError::InvalidManifest {
                reason: format!("{MAIN_CLASS} {main_class:?} is not a fully qualified class name"),
            });
        }
        for (name, value) in &self.attributes {
            if !is_header_name(name) {
                return Err(AssemblyError::InvalidManifest {
                    reason: format!("attribute name {name:?} is not a valid manifest header"),
                });
            }
            if value.contains(['\r', '\n', '\0']) {
                return Err(AssemblyError::InvalidManifest {
                    reason: format!("attribute {name} contains a line break or NUL"),
                });
            }
        }
        Ok(())
    }

    /// Ordered attributes as they will be written.
    ///
    /// `Manifest-Version` first, `Main-Class` second, the rest by name.
    pub fn ordered(&self) -> Vec<(&str, &str)> {
        let version = self.get(MANIFEST_VERSION).unwrap_or(DEFAULT_MANIFEST_VERSION);
        let mut out = vec![(MANIFEST_VERSION, version)];
        if let Some(main_class) = self.main_class() {
            out.push((MAIN_CLASS, main_class));
        }
        out.extend(
            self.attributes
                .iter()
                .filter(|(k, _)| {
                    !k.eq_ignore_ascii_case(MANIFEST_VERSION) && !k.eq_ignore_ascii_case(MAIN_CLASS)
                })
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        out
    }

    /// Render the manifest bytes. Call `validate` first.
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, value) in self.ordered() {
            write_header(&mut out, name, value);
        }
        out.extend_from_slice(b"\r\n");
        out
    }
}

fn write_header(out: &mut Vec<u8>, name: &str, value: &str) {
    let line = format!("{name}: {value}");
    let mut rest = line.as_str();
    let mut budget = MAX_LINE_BYTES;
    loop {
        let cut = split_at_char_boundary(rest, budget);
        out.extend_from_slice(rest[..cut].as_bytes());
        out.extend_from_slice(b"\r\n");
        rest = &rest[cut..];
        if rest.is_empty() {
            break;
        }
        out.push(b' ');
        budget = MAX_LINE_BYTES - 1;
    }
}

/// Largest prefix length of `s` no longer than `max` bytes on a char boundary.
fn split_at_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}

fn is_header_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= MAX_NAME_BYTES
        && bytes[0].is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_')
}

fn is_qualified_name(name: &str) -> bool {
    name.split('.').all(|segment| {
        let mut chars = segment.chars();
        match chars.next() {
            Some(first) if first.is_ascii_digit() => false,
            Some(first) if is_identifier_char(first) => chars.all(is_identifier_char),
            _ => false,
        }
    })
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Main section of a parsed manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    /// Parse the main section of a manifest.
    ///
    /// Accepts CRLF, LF or CR line endings and continuation lines. Parsing
    /// stops at the first empty line; per-entry sections are ignored.
    pub fn parse(bytes: &[u8]) -> AssemblyResult<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| AssemblyError::InvalidManifest {
            reason: format!("manifest is not UTF-8: {e}"),
        })?;

        let mut attributes: Vec<(String, String)> = Vec::new();
        for (i, line) in text.split("\r\n").flat_map(|l| l.split(['\n', '\r'])).enumerate() {
            if line.is_empty() {
                break;
            }
            if let Some(continued) = line.strip_prefix(' ') {
                let Some((_, value)) = attributes.last_mut() else {
                    return Err(AssemblyError::InvalidManifest {
                        reason: format!("line {}: continuation without a header", i + 1),
                    });
                };
                value.push_str(continued);
                continue;
            }
            let Some((name, value)) = line.split_once(": ") else {
                return Err(AssemblyError::InvalidManifest {
                    reason: format!("line {}: expected 'Name: value'", i + 1),
                });
            };
            attributes.push((name.to_string(), value.to_string()));
        }
        Ok(Self { attributes })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn main_class(&self) -> Option<&str> {
        self.get(MAIN_CLASS)
    }

    /// Attributes in file order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_version_and_main_class_first() {
        let spec = ManifestSpec::with_main_class("com.example.Main")
            .attribute("Implementation-Version", "0.0.1-SNAPSHOT")
            .attribute("Created-By", "uberjar");
        let text = String::from_utf8(spec.render()).unwrap();
        assert_eq!(
            text,
            "Manifest-Version: 1.0\r\n\
             Main-Class: com.example.Main\r\n\
             Created-By: uberjar\r\n\
             Implementation-Version: 0.0.1-SNAPSHOT\r\n\
             \r\n"
        );
    }

    #[test]
    fn missing_or_blank_entry_point() {
        assert!(matches!(
            ManifestSpec::new().validate(),
            Err(AssemblyError::MissingEntryPoint)
        ));
        assert!(matches!(
            ManifestSpec::with_main_class("   ").validate(),
            Err(AssemblyError::MissingEntryPoint)
        ));
    }

    #[test]
    fn rejects_bad_names_and_values() {
        let bad_class = ManifestSpec::with_main_class("com.example.1Main");
        assert!(matches!(
            bad_class.validate(),
            Err(AssemblyError::InvalidManifest { .. })
        ));

        let bad_name = ManifestSpec::with_main_class("Main").attribute("Bad Name", "x");
        assert!(matches!(
            bad_name.validate(),
            Err(AssemblyError::InvalidManifest { .. })
        ));

        let bad_value = ManifestSpec::with_main_class("Main").attribute("X-Note", "a\r\nb");
        assert!(matches!(
            bad_value.validate(),
            Err(AssemblyError::InvalidManifest { .. })
        ));

        assert!(ManifestSpec::with_main_class("com.example.Outer$Inner")
            .validate()
            .is_ok());
    }

    #[test]
    fn names_are_case_insensitive() {
        let spec = ManifestSpec::with_main_class("a.A").attribute("main-class", "b.B");
        assert_eq!(spec.main_class(), Some("b.B"));
        assert_eq!(spec.ordered().len(), 2);
    }

    #[test]
    fn long_values_wrap_at_72_bytes() {
        let long = format!("com.example.{}.Main", "verylongpackagename".repeat(6));
        let spec = ManifestSpec::with_main_class(&long);
        let rendered = spec.render();
        let text = String::from_utf8(rendered.clone()).unwrap();

        for line in text.split("\r\n") {
            assert!(line.len() <= 72, "line too long: {line:?}");
        }
        assert!(text.contains("\r\n "));

        let parsed = Manifest::parse(&rendered).unwrap();
        assert_eq!(parsed.main_class(), Some(long.as_str()));
    }

    #[test]
    fn wrapping_never_splits_utf8() {
        let value = "é".repeat(60);
        let spec = ManifestSpec::with_main_class("a.B").attribute("X-Title", &value);
        let rendered = spec.render();
        assert!(String::from_utf8(rendered.clone()).is_ok());
        let parsed = Manifest::parse(&rendered).unwrap();
        assert_eq!(parsed.get("x-title"), Some(value.as_str()));
    }

    #[test]
    fn parse_accepts_lf_and_stops_at_blank_line() {
        let text = b"Manifest-Version: 1.0\nMain-Class: com.old.Main\n\nName: a/B.class\nSHA-256-Digest: xyz\n";
        let parsed = Manifest::parse(text).unwrap();
        assert_eq!(parsed.main_class(), Some("com.old.Main"));
        assert!(parsed.get("SHA-256-Digest").is_none());
        assert_eq!(parsed.attributes().len(), 2);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Manifest::parse(b" orphan continuation\r\n").is_err());
        assert!(Manifest::parse(b"no separator\r\n").is_err());
    }
}
