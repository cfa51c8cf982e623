//! Deterministic uber-archive assembly.
//!
//! Folds a primary archive and its runtime dependencies into one
//! self-contained archive:
//!
//! 1. [`collect`]: read each input into an in-memory [`EntryTree`]
//! 2. [`merge`]: union the trees; the first occurrence of a path wins
//! 3. [`stamp`]: write `META-INF/MANIFEST.MF` with the configured `Main-Class`
//! 4. [`write`]: serialize deterministically and rename into place
//!
//! [`assemble`] runs the whole pipeline from a [`BuildConfig`].

pub mod archive;
pub mod assemble;
pub mod collect;
pub mod config;
pub mod error;
pub mod inspect;
pub mod manifest;
pub mod merge;
pub mod stamp;
pub mod tree;
pub mod write;

pub use archive::limits::{ReadLimits, ReadLimitsOverrides};
pub use archive::ArchiveFormat;
pub use assemble::{assemble, assemble_report, AssemblyReport};
pub use collect::{collect, collect_one, CollectOptions};
pub use config::{BuildConfig, BuildConfigOverrides, DEFAULT_CONFIG_FILE};
pub use error::{AssemblyError, AssemblyResult};
pub use inspect::{inspect, ArchiveSummary, EntrySummary};
pub use manifest::{Manifest, ManifestSpec, MAIN_CLASS, MANIFEST_PATH};
pub use merge::{merge, Conflict, MergedTree};
pub use stamp::stamp;
pub use tree::{ArtifactRef, Entry, EntryKind, EntryPath, EntryTree};
pub use write::{write, write_order, write_to, OutputArtifact};

/// Crate version, reported by `uberjar version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
