use crate::analyzer::ScopedConcurrency;
use crate::driver::BrowserOptions;
use crate::scenario::{ExecutionMode, HarnessSettings, ScenarioOutcome};
use crate::utils::config::{
    DEFAULT_FIXTURES_DIR, DEFAULT_REPORT_GRACE, DEFAULT_WEBDRIVER_URL, SCHEMA_VERSION,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the run command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// chromedriver endpoint
    pub webdriver_url: String,

    /// Scenario names; empty means the whole catalog
    pub scenarios: Vec<String>,

    /// Root of the fixture directories
    pub fixtures_dir: PathBuf,

    /// Seed for random execution modes
    pub seed: Option<u64>,

    /// Pin every unspecified execution mode
    pub execution_mode: Option<ExecutionMode>,

    /// Wait for reports after the last auction
    pub report_grace: Duration,

    /// Bind endpoints on free ports
    pub ephemeral_ports: bool,

    pub browser: BrowserOptions,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            scenarios: Vec::new(),
            fixtures_dir: PathBuf::from(DEFAULT_FIXTURES_DIR),
            seed: None,
            execution_mode: None,
            report_grace: DEFAULT_REPORT_GRACE,
            ephemeral_ports: false,
            browser: BrowserOptions::default(),
        }
    }
}

impl RunArgs {
    pub fn harness_settings(&self) -> HarnessSettings {
        HarnessSettings {
            fixtures_dir: self.fixtures_dir.clone(),
            report_grace: self.report_grace,
            ephemeral_ports: self.ephemeral_ports,
        }
    }
}

/// Arguments for the analyze command
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Captured trace (any supported shape)
    pub trace_file: PathBuf,

    /// Name patterns to scope the analysis to
    pub patterns: Vec<String>,

    /// Keep only events of this trace category
    pub category: Option<String>,
}

/// A scenario that did not complete
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioFailure {
    pub scenario: String,
    pub error: String,
}

/// Result of a run over one or more scenarios
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub version: String,
    pub generated_at: String,
    pub outcomes: Vec<ScenarioOutcome>,
    pub failures: Vec<ScenarioFailure>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            outcomes: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of an offline analysis
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub version: String,
    pub generated_at: String,
    pub trace_file: String,
    pub events: usize,
    pub results: Vec<ScopedConcurrency>,
}
