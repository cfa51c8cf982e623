use super::super::args::{InspectArgs, ReportFormat};
use super::report_failure;
use crate::exit_codes;
use anyhow::Context;
use uberjar_core::{inspect, ArchiveSummary, EntryKind};

pub fn run(args: InspectArgs) -> anyhow::Result<i32> {
    let summary = match inspect(&args.path) {
        Ok(summary) => summary,
        Err(err) => return Ok(report_failure(&err)),
    };

    match args.report {
        ReportFormat::Text => print_text(&summary),
        ReportFormat::Json => {
            let json =
                serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
            println!("{json}");
        }
    }
    Ok(exit_codes::EXIT_SUCCESS)
}

fn print_text(summary: &ArchiveSummary) {
    println!("archive:    {}", summary.path.display());
    println!("format:     {}", summary.format);
    println!(
        "main-class: {}",
        summary.main_class.as_deref().unwrap_or("(none)")
    );
    println!("sha256:     {}", summary.sha256);
    println!("entries:    {}", summary.entries.len());
    for entry in &summary.entries {
        let kind = match entry.kind {
            EntryKind::Directory => 'd',
            EntryKind::File => '-',
        };
        println!("  {kind} {:>10} {}", entry.size, entry.path);
    }
}
