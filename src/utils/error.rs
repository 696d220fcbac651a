//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while parsing a captured trace
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid trace format: {0}")]
    InvalidFormat(String),

    #[error("Failed to read trace file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the concurrency analyzer
///
/// An unbalanced stream is a contract violation of the engine or of the
/// capture, never something to paper over.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Unbalanced trace: {begins} begin events vs {ends} end events")]
    Unbalanced { begins: usize, ends: usize },

    #[error("Malformed trace: end event at position {position} with no open occurrence")]
    Underflow { position: usize },

    #[error("Invalid name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors that can occur while talking to the browser
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("WebDriver error '{error}': {message}")]
    WebDriver { error: String, message: String },

    #[error("Invalid WebDriver response: {0}")]
    InvalidResponse(String),

    #[error("No element matches '{0}'")]
    ElementNotFound(String),

    #[error("No nested frame to switch into")]
    FrameNotFound,

    #[error("Text '{marker}' did not appear in '{selector}' (last seen: {last_text:?})")]
    MarkerMissing {
        selector: String,
        marker: String,
        last_text: String,
    },

    #[error("Invalid trace capture: {0}")]
    Trace(#[from] TraceError),
}

/// Errors that can occur around mock endpoints
#[derive(Error, Debug)]
pub enum MockServerError {
    #[error("Failed to bind port {port}: {message}")]
    Bind { port: u16, message: String },

    #[error("Fixture directory not found: {0}")]
    MissingFixtures(String),

    #[error("No request received on {0}")]
    NoRequest(String),

    #[error("Request has no parameter '{0}'")]
    MissingParam(String),

    #[error("Parameter '{name}' is not valid JSON: {source}")]
    InvalidJson {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Oracle failures: the engine did not behave as the scenario expects
#[derive(Error, Debug)]
pub enum AssertionError {
    #[error("Event count for '{pattern}': expected {expected}, got {actual}")]
    CountMismatch {
        pattern: String,
        expected: usize,
        actual: usize,
    },

    #[error("Peak concurrency for '{pattern}': expected {bound}, got {actual}")]
    PeakMismatch {
        pattern: String,
        bound: String,
        actual: usize,
    },

    #[error("Report field missing: {0}")]
    ReportFieldMissing(String),

    #[error("Reported bid: expected {expected}, got {actual}")]
    BidMismatch { expected: f64, actual: f64 },
}

/// Errors that abort a scenario
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Invalid scenario transition {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid scenario definition: {0}")]
    InvalidDefinition(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    MockServer(#[from] MockServerError),

    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    #[error(transparent)]
    Assertion(#[from] AssertionError),
}
