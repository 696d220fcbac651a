//! Browser automation.
//!
//! The harness only needs a handful of blocking operations; they are
//! expressed by `BrowserDriver` so scenarios can run against chromedriver
//! or against a scripted stand-in.

pub mod types;
pub mod webdriver;

use crate::trace::TraceEvent;
use crate::utils::config::{DEFAULT_ELEMENT_WAIT, ELEMENT_POLL_INTERVAL};
use crate::utils::error::DriverError;
use std::time::{Duration, Instant};

// Re-export main types
pub use types::{BrowserOptions, LogEntry};
pub use webdriver::WebDriverClient;

/// Blocking browser operations used by the scenario harness
pub trait BrowserDriver {
    /// Load a page and wait for the navigation to finish
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// Rendered text of the first element matching a CSS selector
    fn element_text(&mut self, selector: &str) -> Result<String, DriverError>;

    /// Enter the frame that renders the auction winner
    fn switch_to_nested_frame(&mut self) -> Result<(), DriverError>;

    /// Return to the top-level document
    fn switch_to_top(&mut self) -> Result<(), DriverError>;

    /// Console/application log entries
    fn console_log(&mut self) -> Result<Vec<LogEntry>, DriverError>;

    /// Every trace event captured since the session started, capture order
    fn trace_events(&mut self) -> Result<Vec<TraceEvent>, DriverError>;

    /// How long `wait_for_text` polls by default
    fn element_wait(&self) -> Duration {
        DEFAULT_ELEMENT_WAIT
    }

    /// Poll until `marker` shows up in the text of `selector`
    ///
    /// # Errors
    /// * `DriverError::MarkerMissing` - Marker absent when the wait expires
    fn wait_for_text(&mut self, selector: &str, marker: &str) -> Result<(), DriverError> {
        let deadline = Instant::now() + self.element_wait();
        let mut last_text = String::new();

        loop {
            match self.element_text(selector) {
                Ok(text) if text.contains(marker) => return Ok(()),
                Ok(text) => last_text = text,
                Err(DriverError::ElementNotFound(_)) => {}
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(DriverError::MarkerMissing {
                    selector: selector.to_string(),
                    marker: marker.to_string(),
                    last_text,
                });
            }
            std::thread::sleep(ELEMENT_POLL_INTERVAL);
        }
    }
}
