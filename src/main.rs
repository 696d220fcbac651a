//! Worklet Trace CLI
//!
//! Runs auction scenarios against a real browser and reports how many
//! bidding worklets the engine executed in parallel.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;
use std::time::Duration;

use worklet_trace::commands::{
    display_scenarios, display_version, execute_analyze, execute_run, print_analysis,
    print_run_summary, AnalyzeArgs, RunArgs,
};
use worklet_trace::driver::BrowserOptions;
use worklet_trace::scenario::ExecutionMode;
use worklet_trace::utils::config::{DEFAULT_FIXTURES_DIR, DEFAULT_WEBDRIVER_URL};

/// Worklet Trace - bidding worklet concurrency measurement
#[derive(Parser, Debug)]
#[command(name = "worklet-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run measurement scenarios in a browser
    Run {
        /// Scenario to run (repeatable, "all" for the whole catalog)
        #[arg(short, long, default_value = "all")]
        scenario: Vec<String>,

        /// chromedriver endpoint
        #[arg(short, long, env = "WORKLET_TRACE_WEBDRIVER", default_value = DEFAULT_WEBDRIVER_URL)]
        webdriver: String,

        /// Directory holding the buyer/ and seller/ fixtures
        #[arg(long, default_value = DEFAULT_FIXTURES_DIR)]
        fixtures: PathBuf,

        /// Seed for random execution modes (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Use this execution mode wherever a scenario leaves it open
        #[arg(long, value_enum)]
        execution_mode: Option<ExecutionMode>,

        /// Milliseconds to wait for reports after the last auction
        #[arg(long, default_value = "1000")]
        grace_ms: u64,

        /// Bind endpoints on free ports instead of the scenario ports
        #[arg(long)]
        ephemeral_ports: bool,

        /// Run Chrome headless
        #[arg(long)]
        headless: bool,

        /// Chrome binary to launch
        #[arg(long, env = "WORKLET_TRACE_CHROME")]
        chrome_binary: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze a captured trace file
    Analyze {
        /// Trace file (Chrome trace, event array or performance log)
        #[arg(short, long)]
        trace: PathBuf,

        /// Event name pattern (repeatable; anchored, case-insensitive)
        #[arg(short, long, required = true)]
        pattern: Vec<String>,

        /// Keep only events of this trace category
        #[arg(long)]
        category: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the available scenarios
    Scenarios {
        /// Show ports and expectations
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Run {
            scenario,
            webdriver,
            fixtures,
            seed,
            execution_mode,
            grace_ms,
            ephemeral_ports,
            headless,
            chrome_binary,
            json,
        } => {
            let args = RunArgs {
                webdriver_url: webdriver,
                scenarios: scenario,
                fixtures_dir: fixtures,
                seed,
                execution_mode,
                report_grace: Duration::from_millis(grace_ms),
                ephemeral_ports,
                browser: BrowserOptions {
                    headless,
                    chrome_binary,
                    extra_args: Vec::new(),
                },
            };

            let summary = execute_run(args)?;
            print_run_summary(&summary, json)?;

            if !summary.passed() {
                anyhow::bail!("{} scenario(s) failed", summary.failures.len());
            }
        }

        Commands::Analyze {
            trace,
            pattern,
            category,
            json,
        } => {
            let args = AnalyzeArgs {
                trace_file: trace,
                patterns: pattern,
                category,
            };
            let report = execute_analyze(&args)?;
            print_analysis(&report, json)?;
        }

        Commands::Scenarios { show } => {
            display_scenarios(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
