//! Run command implementation.
//!
//! The run command:
//! 1. Resolves the requested scenarios
//! 2. Opens a fresh browser session per scenario
//! 3. Runs each scenario through the harness
//! 4. Collects outcomes and failures into a summary

use super::models::{RunArgs, RunSummary, ScenarioFailure};
use crate::driver::{BrowserDriver, WebDriverClient};
use crate::scenario::{
    catalog, find_scenario, run_scenario, ExecutionModeStrategy, ScenarioDefinition,
};
use anyhow::{Context, Result};
use log::{error, info};

/// Execute the run command against chromedriver
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// Summary of every scenario; failing scenarios are listed, not raised
///
/// # Errors
/// * Invalid arguments or unknown scenario names
pub fn execute_run(args: RunArgs) -> Result<RunSummary> {
    let url = args.webdriver_url.clone();
    let browser = args.browser.clone();

    run_suite(&args, || {
        WebDriverClient::connect(url.as_str(), &browser)
            .with_context(|| format!("Failed to open a browser session at {}", url))
    })
}

/// Run the requested scenarios with drivers from `connect`
///
/// **Public** - the driver source is injectable so the suite can run
/// against anything implementing `BrowserDriver`
///
/// Each scenario gets its own driver: the trace of a session covers every
/// scenario run in it. A failing scenario does not stop its siblings.
pub fn run_suite<D, F>(args: &RunArgs, mut connect: F) -> Result<RunSummary>
where
    D: BrowserDriver,
    F: FnMut() -> Result<D>,
{
    validate_args(args)?;
    let scenarios = resolve_scenarios(&args.scenarios)?;

    let mut summary = RunSummary::new();

    for scenario in &scenarios {
        let modes = strategy_for(args);

        let result = connect().and_then(|mut driver| {
            run_scenario(&mut driver, scenario, args.harness_settings(), modes)
                .with_context(|| format!("Scenario {} failed", scenario.name))
        });

        match result {
            Ok(outcome) => {
                info!("✓ {} ({:.1}s)", scenario.name, outcome.duration_secs);
                summary.outcomes.push(outcome);
            }
            Err(e) => {
                error!("✗ {}: {:#}", scenario.name, e);
                summary.failures.push(ScenarioFailure {
                    scenario: scenario.name.clone(),
                    error: format!("{:#}", e),
                });
            }
        }
    }

    Ok(summary)
}

/// Execution modes for one scenario
///
/// A pinned mode wins over a seed; without either, a fresh seed is drawn
/// (and logged).
fn strategy_for(args: &RunArgs) -> ExecutionModeStrategy {
    match (args.execution_mode, args.seed) {
        (Some(mode), _) => ExecutionModeStrategy::fixed(mode),
        (None, Some(seed)) => ExecutionModeStrategy::seeded(seed),
        (None, None) => ExecutionModeStrategy::from_entropy(),
    }
}

/// Map names to definitions; empty or `all` selects the whole catalog
pub fn resolve_scenarios(names: &[String]) -> Result<Vec<ScenarioDefinition>> {
    if names.is_empty() || names.iter().any(|n| n == "all") {
        return Ok(catalog());
    }

    names
        .iter()
        .map(|name| find_scenario(name).map_err(anyhow::Error::from))
        .collect()
}

/// Validate run arguments
///
/// **Public** - can be called before execute_run for early validation
pub fn validate_args(args: &RunArgs) -> Result<()> {
    if args.webdriver_url.is_empty() {
        anyhow::bail!("WebDriver URL cannot be empty");
    }

    if !args.webdriver_url.starts_with("http://") && !args.webdriver_url.starts_with("https://") {
        anyhow::bail!("WebDriver URL must start with http:// or https://");
    }

    if !args.fixtures_dir.is_dir() {
        anyhow::bail!(
            "Fixtures directory not found: {}",
            args.fixtures_dir.display()
        );
    }

    if args.report_grace.as_secs() > 60 {
        anyhow::bail!("Report grace period is too large (max 60s)");
    }

    Ok(())
}
