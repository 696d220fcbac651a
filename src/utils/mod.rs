//! Utility modules for configuration, error handling, and timing.

pub mod config;
pub mod error;
pub mod timing;

// Re-export commonly used error types for convenience
pub use error::{
    AnalyzeError, AssertionError, DriverError, MockServerError, ScenarioError, TraceError,
};
pub use timing::MeasureDuration;
