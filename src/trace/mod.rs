//! Trace event model and capture parsing.
//!
//! This module handles:
//! - The begin/end event model
//! - Ordering of captured events
//! - Parsing captures in their various shapes

pub mod event;
pub mod parser;

// Re-export main types
pub use event::{renumber, sort_events, Phase, TraceEvent};
pub use parser::{filter_category, parse_trace_events, parse_trace_file};
