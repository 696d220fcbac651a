//! Concurrency analysis over captured trace events.
//!
//! This module computes, for a time-ordered begin/end stream:
//! - Occurrence count
//! - Peak number of simultaneously open occurrences
//! - The same pair scoped to event names matching a pattern

pub mod concurrency;
pub mod filter;

// Re-export main types and functions
pub use concurrency::{analyze, ConcurrencyCounter, ConcurrencyResult};
pub use filter::{analyze_filtered, analyze_scoped, filter_events, NamePattern, ScopedConcurrency};
