use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use tooltrace_core::{is_skipped_record, normalize, NormalizedEvent, RecordReader};

/// Per-file breakdown of what the normalizer makes of a log.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct InspectReport {
    pub records: usize,
    /// Meta or internal bookkeeping records.
    pub skipped_records: usize,
    /// Records that were read but yielded no events.
    pub empty_records: usize,
    pub messages: usize,
    pub tool_uses: usize,
    pub tool_results: usize,
    pub tool_results_without_id: usize,
    pub tool_names: BTreeMap<String, usize>,
}

pub fn inspect_file(path: &Path) -> Result<InspectReport> {
    let reader = RecordReader::open(path)?;
    let mut report = InspectReport::default();

    for record in reader {
        report.records += 1;
        if is_skipped_record(&record) {
            report.skipped_records += 1;
            continue;
        }

        let events = normalize(&record);
        if events.is_empty() {
            report.empty_records += 1;
        }
        for event in events {
            match event {
                NormalizedEvent::Message(_) => report.messages += 1,
                NormalizedEvent::ToolUse(e) => {
                    report.tool_uses += 1;
                    *report.tool_names.entry(e.tool_name).or_insert(0) += 1;
                }
                NormalizedEvent::ToolResult(e) => {
                    report.tool_results += 1;
                    if e.tool_use_id.is_none() {
                        report.tool_results_without_id += 1;
                    }
                }
            }
        }
    }

    Ok(report)
}

pub fn handle_inspect_command(path: &Path, json: bool) -> Result<()> {
    let report =
        inspect_file(path).with_context(|| format!("Failed to inspect {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", path.display().to_string().bold());
    println!("  Records:        {}", report.records);
    println!(
        "  Skipped:        {}",
        report.skipped_records.to_string().dimmed()
    );
    println!("  No events:      {}", report.empty_records.to_string().dimmed());
    println!("  Messages:       {}", report.messages);
    println!("  Tool uses:      {}", report.tool_uses.to_string().cyan());
    println!(
        "  Tool results:   {} ({} without id)",
        report.tool_results.to_string().cyan(),
        report.tool_results_without_id
    );
    for (name, count) in &report.tool_names {
        println!("    {:<20} {}", name, count);
    }

    Ok(())
}
