//! Wall-clock measurement of harness steps.

use log::info;
use std::time::{Duration, Instant};

/// Logs how long a scope took when dropped
///
/// ```ignore
/// let _timer = MeasureDuration::new("runAdAuction");
/// // ... blocking round-trip ...
/// ```
pub struct MeasureDuration {
    label: String,
    start: Instant,
}

impl MeasureDuration {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for MeasureDuration {
    fn drop(&mut self) {
        info!("{}: {:.3}s", self.label, self.start.elapsed().as_secs_f64());
    }
}
