//! Concurrency level of a begin/end event stream.
//!
//! A running counter goes up on every Begin and down on every End. The peak
//! is sampled right after each increment, so an occurrence that ends before
//! the next one begins never counts twice.
//!
//! Example (ordered by time):
//! ```text
//! b b e b e e   -> open: 1 2 1 2 1 0   -> (3 occurrences, peak 2)
//! ```

use crate::trace::{Phase, TraceEvent};
use crate::utils::error::AnalyzeError;
use serde::Serialize;

/// Outcome of a concurrency analysis
///
/// **Public** - derived, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConcurrencyResult {
    /// Number of occurrences (begin events == end events)
    pub total_occurrences: usize,

    /// Highest number of simultaneously open occurrences
    pub max_concurrent: usize,
}

impl ConcurrencyResult {
    pub fn as_pair(&self) -> (usize, usize) {
        (self.total_occurrences, self.max_concurrent)
    }
}

/// Incremental open-count tracker
///
/// Feeds one phase at a time; `finish` validates the stream.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyCounter {
    open: usize,
    peak: usize,
    begins: usize,
    ends: usize,
}

impl ConcurrencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for the next event in time order
    ///
    /// # Errors
    /// * `AnalyzeError::Underflow` - End with nothing open
    pub fn observe(&mut self, phase: Phase) -> Result<(), AnalyzeError> {
        match phase {
            Phase::Begin => {
                self.begins += 1;
                self.open += 1;
                self.peak = self.peak.max(self.open);
            }
            Phase::End => {
                let position = self.begins + self.ends;
                self.ends += 1;
                self.open = self
                    .open
                    .checked_sub(1)
                    .ok_or(AnalyzeError::Underflow { position })?;
            }
        }
        Ok(())
    }

    /// Currently open occurrences
    pub fn open(&self) -> usize {
        self.open
    }

    /// Close the stream
    ///
    /// # Errors
    /// * `AnalyzeError::Unbalanced` - Begin and End counts differ
    pub fn finish(self) -> Result<ConcurrencyResult, AnalyzeError> {
        if self.open != 0 || self.begins != self.ends {
            return Err(AnalyzeError::Unbalanced {
                begins: self.begins,
                ends: self.ends,
            });
        }

        debug_assert!(self.peak <= self.begins);

        Ok(ConcurrencyResult {
            total_occurrences: self.begins,
            max_concurrent: self.peak,
        })
    }
}

/// Compute occurrence count and peak concurrency
///
/// **Public** - main entry point of the analyzer
///
/// # Arguments
/// * `events` - Events already ordered by timestamp (see `trace::sort_events`).
///   Their order is authoritative; same-timestamp events are taken as given.
///
/// # Returns
/// `(count, peak)` as a `ConcurrencyResult`; `(0, 0)` for an empty stream
///
/// # Errors
/// * `AnalyzeError::Underflow` - An End arrives with no open occurrence
/// * `AnalyzeError::Unbalanced` - Begin/End counts differ at end of stream
pub fn analyze<'a, I>(events: I) -> Result<ConcurrencyResult, AnalyzeError>
where
    I: IntoIterator<Item = &'a TraceEvent>,
{
    let mut counter = ConcurrencyCounter::new();
    for event in events {
        counter.observe(event.phase)?;
    }
    counter.finish()
}
