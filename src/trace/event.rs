//! Trace event model.
//!
//! One `TraceEvent` is a single lifecycle boundary (begin or end) of a named
//! operation inside the auction engine. Begin/End pairs are never matched
//! by identity; consumers only care about the aggregate open count.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle boundary of an occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Begin,
    End,
}

impl Phase {
    /// Map a Chrome trace `ph` code to a phase
    ///
    /// Only async nestable events (`b`/`e`) count as boundaries. Duration
    /// slices (`B`/`E`), instant, complete and metadata events yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "b" => Some(Phase::Begin),
            "e" => Some(Phase::End),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Phase::Begin => "b",
            Phase::End => "e",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One captured begin or end marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Operation name, repeats across invocations
    pub name: String,

    /// Begin or end
    pub phase: Phase,

    /// Engine timestamp in microseconds
    pub timestamp: f64,

    /// Position in the capture
    pub sequence: usize,

    /// Trace category (e.g. "fledge")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Async event id, if the engine supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl TraceEvent {
    pub fn new(name: impl Into<String>, phase: Phase, timestamp: f64, sequence: usize) -> Self {
        Self {
            name: name.into(),
            phase,
            timestamp,
            sequence,
            category: None,
            id: None,
        }
    }

    pub fn begin(name: impl Into<String>, timestamp: f64) -> Self {
        Self::new(name, Phase::Begin, timestamp, 0)
    }

    pub fn end(name: impl Into<String>, timestamp: f64) -> Self {
        Self::new(name, Phase::End, timestamp, 0)
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} ts={} ph={} name={}",
            self.sequence, self.timestamp, self.phase, self.name
        )
    }
}

/// Order events by timestamp
///
/// **Public** - the analyzer requires ordered input and the capture does not
/// guarantee it.
///
/// The sort is stable: events sharing a timestamp keep the order the
/// source supplied them in. No other tie-break is applied.
pub fn sort_events(events: &mut [TraceEvent]) {
    events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
}

/// Renumber `sequence` to match the current order
pub fn renumber(events: &mut [TraceEvent]) {
    for (i, event) in events.iter_mut().enumerate() {
        event.sequence = i;
    }
}
