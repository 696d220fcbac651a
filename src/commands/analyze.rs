//! Analyze command implementation.
//!
//! Offline concurrency analysis of a previously captured trace file.

use super::models::{AnalysisReport, AnalyzeArgs};
use crate::analyzer::{analyze_scoped, NamePattern};
use crate::trace::{filter_category, parse_trace_file, renumber, sort_events};
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use log::info;

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Unreadable or unparsable trace file
/// * Invalid pattern
/// * Malformed (unbalanced) event stream for a pattern
pub fn execute_analyze(args: &AnalyzeArgs) -> Result<AnalysisReport> {
    if args.patterns.is_empty() {
        anyhow::bail!("At least one pattern is required");
    }

    // Compile everything before touching the file
    let patterns = args
        .patterns
        .iter()
        .map(|p| NamePattern::new(p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut events = parse_trace_file(&args.trace_file)
        .with_context(|| format!("Failed to read trace {}", args.trace_file.display()))?;

    if let Some(category) = &args.category {
        events = filter_category(events, category);
    }

    sort_events(&mut events);
    renumber(&mut events);
    info!("{} begin/end events", events.len());

    let results = patterns
        .iter()
        .map(|pattern| {
            analyze_scoped(&events, pattern)
                .with_context(|| format!("Malformed trace for pattern '{}'", pattern))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AnalysisReport {
        version: SCHEMA_VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        trace_file: args.trace_file.display().to_string(),
        events: events.len(),
        results,
    })
}
