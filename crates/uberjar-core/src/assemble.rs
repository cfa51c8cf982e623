//! Assembler: collect → merge → stamp → write.
//!
//! The pipeline is strictly sequential. Any stage error aborts the run
//! before the output path is touched (writer errors excepted, and those
//! leave no partial file).

use crate::collect::{collect, collect_one};
use crate::config::BuildConfig;
use crate::error::AssemblyResult;
use crate::merge::{merge, Conflict};
use crate::stamp::stamp;
use crate::write::{write, OutputArtifact};
use serde::Serialize;

/// Result of an assembly run with merge diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    pub artifact: OutputArtifact,
    /// Paths present in more than one input, ordered by path.
    pub conflicts: Vec<Conflict>,
}

/// Build the uber-archive described by `config`.
pub fn assemble(config: &BuildConfig) -> AssemblyResult<OutputArtifact> {
    assemble_report(config).map(|report| report.artifact)
}

/// Build the uber-archive and report which duplicate entries were excluded.
pub fn assemble_report(config: &BuildConfig) -> AssemblyResult<AssemblyReport> {
    let span = tracing::info_span!("assemble", output = %config.output.display());
    let _guard = span.enter();

    // Validate first: a bad declaration fails before any input is read.
    config.manifest.validate()?;

    let (primary, dependencies) = {
        let _stage = tracing::debug_span!("collect").entered();
        let dependencies = collect(&config.dependencies, &config.collect)?;
        let primary = collect_one(&config.primary, &config.collect)?;
        (primary, dependencies)
    };
    tracing::info!(
        primary = %config.primary,
        primary_entries = primary.len(),
        dependencies = dependencies.len(),
        "collected inputs"
    );

    let merged = {
        let _stage = tracing::debug_span!("merge").entered();
        merge(dependencies, primary)
    };
    tracing::info!(
        entries = merged.len(),
        conflicts = merged.conflict_count(),
        "merged entry trees"
    );
    let conflicts: Vec<Conflict> = merged.conflicts().cloned().collect();

    let stamped = stamp(merged, &config.manifest)?;

    let artifact = {
        let _stage = tracing::debug_span!("write").entered();
        write(&stamped, &config.output, config.format)?
    };

    Ok(AssemblyReport {
        artifact,
        conflicts,
    })
}
