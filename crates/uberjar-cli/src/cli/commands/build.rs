use super::super::args::{BuildArgs, ReportFormat};
use super::report_failure;
use crate::exit_codes;
use anyhow::Context;
use std::path::{Path, PathBuf};
use uberjar_core::{
    assemble_report, AssemblyReport, AssemblyResult, BuildConfig, BuildConfigOverrides,
    DEFAULT_CONFIG_FILE,
};

pub fn run(args: BuildArgs) -> anyhow::Result<i32> {
    let report = match build(&args) {
        Ok(report) => report,
        Err(err) => return Ok(report_failure(&err)),
    };

    match args.report {
        ReportFormat::Text => print_text(&report),
        ReportFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("failed to serialize report")?;
            println!("{json}");
        }
    }
    Ok(exit_codes::EXIT_SUCCESS)
}

fn build(args: &BuildArgs) -> AssemblyResult<AssemblyReport> {
    let file_layer = match config_path(args.config.as_deref()) {
        Some(path) => {
            tracing::debug!(config = %path.display(), "loading build config");
            BuildConfigOverrides::load(&path)?
        }
        None => BuildConfigOverrides::default(),
    };
    let config = BuildConfig::from_overrides(file_layer.or(args.overrides()))?;
    assemble_report(&config)
}

/// Explicit `--config`, else `./uberjar.yaml` if it exists.
fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.is_file().then_some(default)
}

fn print_text(report: &AssemblyReport) {
    let a = &report.artifact;
    println!(
        "built {} ({}, {} entries, {} bytes, {})",
        a.path.display(),
        a.format,
        a.entry_count,
        a.bytes,
        a.sha256
    );
    if !report.conflicts.is_empty() {
        println!(
            "{} duplicate entries excluded (first occurrence kept)",
            report.conflicts.len()
        );
    }
}
