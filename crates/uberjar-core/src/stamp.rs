//! Manifest Stamper.
//!
//! The stamped manifest replaces whatever manifest the inputs carried. This
//! is the single exception to exclude-on-duplicate: the entry-point must be
//! the build's own declaration, not an inherited one.

use crate::error::AssemblyResult;
use crate::manifest::{ManifestSpec, MANIFEST_DIR, MANIFEST_PATH};
use crate::merge::MergedTree;
use crate::tree::{ArtifactRef, Entry, EntryPath};

/// Overwrite `META-INF/MANIFEST.MF` with the rendered `spec`.
///
/// Manifests stored under a case variant of that path (`meta-inf/manifest.mf`)
/// are dropped; jar readers match the name case-insensitively. Also adds a
/// `META-INF/` directory entry when none of the inputs had one.
pub fn stamp(mut tree: MergedTree, spec: &ManifestSpec) -> AssemblyResult<MergedTree> {
    spec.validate()?;

    let variants: Vec<String> = tree
        .paths()
        .filter(|p| {
            p.as_str() != MANIFEST_PATH && p.as_str().eq_ignore_ascii_case(MANIFEST_PATH)
        })
        .map(|p| p.as_str().to_string())
        .collect();
    for path in variants {
        if let Some(dropped) = tree.remove(&path) {
            tracing::debug!(%path, source = %dropped.source, "dropped case-variant manifest");
        }
    }

    let manifest_path = EntryPath::from_static(MANIFEST_PATH);
    let manifest_dir = EntryPath::from_static(MANIFEST_DIR);

    let rendered = Entry::file(spec.render(), ArtifactRef::synthetic());
    if let Some(previous) = tree.replace(manifest_path, rendered) {
        tracing::debug!(source = %previous.source, "replaced inherited manifest");
    }
    tree.insert_if_absent(manifest_dir, Entry::directory(ArtifactRef::synthetic()));

    tracing::debug!(main_class = ?spec.main_class(), "stamped manifest");
    Ok(tree)
}
