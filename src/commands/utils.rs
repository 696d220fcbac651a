use super::models::{AnalysisReport, RunSummary};
use crate::scenario::catalog;
use crate::utils::config::{SCHEMA_VERSION, WORKLET_CONCURRENCY_CEILING};
use anyhow::Result;

/// Print a run summary as text or JSON
pub fn print_run_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("WORKLET CONCURRENCY SUMMARY");
    println!("{}", "=".repeat(80));

    for outcome in &summary.outcomes {
        println!(
            "✓ {} ({:.1}s, {} trace events)",
            outcome.scenario, outcome.duration_secs, outcome.trace_events
        );
        if let Some(seed) = outcome.seed {
            println!("    seed: {}", seed);
        }
        for result in &outcome.results {
            println!("    {}", result);
        }
        if let Some(bid) = outcome.reported_bid {
            println!("    reported bid: {}", bid);
        }
    }

    for failure in &summary.failures {
        println!("✗ {}", failure.scenario);
        println!("    {}", failure.error);
    }

    println!("{}", "=".repeat(80));
    println!(
        "{} passed, {} failed",
        summary.outcomes.len(),
        summary.failures.len()
    );
    Ok(())
}

/// Print an offline analysis as text or JSON
pub fn print_analysis(report: &AnalysisReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Trace: {} ({} begin/end events)", report.trace_file, report.events);
    for result in &report.results {
        println!("  {}", result);
    }
    Ok(())
}

/// List the scenario catalog
pub fn display_scenarios(show_details: bool) {
    for scenario in catalog() {
        println!("{:<44} {}", scenario.name, scenario.description);

        if show_details {
            println!(
                "    seller port {}, buyer ports {}-{}, {} auction(s)",
                scenario.seller_port,
                scenario.buyer_base_port + 1,
                scenario.buyer_base_port + scenario.buyers as u16,
                scenario.auctions
            );
            for expectation in &scenario.expectations {
                let count = expectation
                    .count
                    .map_or_else(|| "any".to_string(), |c| c.to_string());
                let peak = expectation
                    .peak
                    .map_or_else(|| "any".to_string(), |p| p.to_string());
                println!("    {:<32} count {:<6} peak {}", expectation.pattern, count, peak);
            }
        }
    }
}

/// Display version information
pub fn display_version() {
    println!("Worklet Trace v{}", env!("CARGO_PKG_VERSION"));
    println!("Summary Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Measures bidding worklet concurrency of the on-device ad auction engine.");
    println!("Expected worklet ceiling: {}", WORKLET_CONCURRENCY_CEILING);
}
