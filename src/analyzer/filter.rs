//! Name-scoped concurrency queries.
//!
//! Patterns are regular expressions matched case-insensitively from the
//! start of the event name (a prefix match, not a search): `generate_bid`
//! matches `generate_bid` and `generate_bid_dependency_latency` but not
//! `bidder_worklet_generate_bid`. Use a leading `.*` to search anywhere.

use super::concurrency::{analyze, ConcurrencyResult};
use crate::trace::TraceEvent;
use crate::utils::error::AnalyzeError;
use log::info;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::fmt;

/// Compiled event-name pattern
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    regex: Regex,
}

impl NamePattern {
    /// Compile a pattern with anchored, case-insensitive semantics
    ///
    /// # Errors
    /// * `AnalyzeError::InvalidPattern` - Not a valid regular expression
    pub fn new(pattern: &str) -> Result<Self, AnalyzeError> {
        let regex = RegexBuilder::new(&format!("^(?:{})", pattern))
            .case_insensitive(true)
            .build()
            .map_err(|source| AnalyzeError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Concurrency result tagged with the pattern that scoped it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopedConcurrency {
    pub pattern: String,

    #[serde(flatten)]
    pub result: ConcurrencyResult,
}

impl ScopedConcurrency {
    pub fn count(&self) -> usize {
        self.result.total_occurrences
    }

    pub fn peak(&self) -> usize {
        self.result.max_concurrent
    }

    pub fn as_pair(&self) -> (usize, usize) {
        self.result.as_pair()
    }
}

impl fmt::Display for ScopedConcurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "concurrency level ({}): {} (total: {})",
            self.pattern,
            self.peak(),
            self.count()
        )
    }
}

/// Events whose name matches, in their original order
///
/// **Public** - borrows, the captured stream is left untouched
pub fn filter_events<'a>(events: &'a [TraceEvent], pattern: &NamePattern) -> Vec<&'a TraceEvent> {
    events.iter().filter(|e| pattern.matches(&e.name)).collect()
}

/// Analyze the subsequence of events matching a compiled pattern
pub fn analyze_scoped(
    events: &[TraceEvent],
    pattern: &NamePattern,
) -> Result<ScopedConcurrency, AnalyzeError> {
    let result = analyze(events.iter().filter(|e| pattern.matches(&e.name)))?;

    let scoped = ScopedConcurrency {
        pattern: pattern.as_str().to_string(),
        result,
    };
    info!("{}", scoped);

    Ok(scoped)
}

/// Analyze the subsequence of events whose name matches `pattern`
///
/// **Public** - main entry point for scoped queries
///
/// # Arguments
/// * `events` - Full ordered capture; not modified, so any number of
///   queries can run over the same stream
/// * `pattern` - Regular expression, anchored at the start, case-insensitive
///
/// # Errors
/// * `AnalyzeError::InvalidPattern` - Pattern does not compile
/// * Any analyzer error for the filtered subsequence
pub fn analyze_filtered(
    events: &[TraceEvent],
    pattern: &str,
) -> Result<ScopedConcurrency, AnalyzeError> {
    let pattern = NamePattern::new(pattern)?;
    analyze_scoped(events, &pattern)
}
