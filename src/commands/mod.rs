//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod analyze;
pub mod models;
pub mod run;
pub mod utils;

// Re-export main command functions
pub use analyze::execute_analyze;
pub use models::{AnalysisReport, AnalyzeArgs, RunArgs, RunSummary, ScenarioFailure};
pub use run::{execute_run, resolve_scenarios, run_suite, validate_args};
pub use utils::{display_scenarios, display_version, print_analysis, print_run_summary};
