//! Parser for captured trace data.
//!
//! Converts raw JSON into `TraceEvent`s. Handles the shapes a capture
//! arrives in:
//! - a bare array of Chrome trace events
//! - a Chrome trace file object (`{"traceEvents": [...]}`)
//! - WebDriver performance log entries wrapping `Tracing.dataCollected`

use super::event::{Phase, TraceEvent};
use crate::utils::config::{TRACE_EVENTS_FIELD_NAMES, TRACING_DATA_METHOD};
use crate::utils::error::TraceError;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Detected capture format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureFormat {
    /// Plain trace events with `ph`/`name`/`ts`
    TraceEvents,
    /// WebDriver log entries whose `message` is a JSON string
    PerformanceLog,
}

/// Raw trace event as emitted by the engine
#[derive(Debug, Clone, Deserialize)]
struct RawTraceEvent {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    ph: Option<String>,

    /// Microseconds; integer or float depending on the producer
    #[serde(default)]
    ts: Option<f64>,

    #[serde(default)]
    cat: Option<String>,

    #[serde(default)]
    id: Option<Value>,
}

/// Parse raw capture JSON into trace events
///
/// **Public** - main entry point for parsing
///
/// # Arguments
/// * `raw` - Capture JSON in any supported shape
///
/// # Returns
/// Begin/End events in capture order, `sequence` set to their position.
/// Events of other phases are dropped.
///
/// # Errors
/// * `TraceError::InvalidFormat` - Neither an array nor a known wrapper object
pub fn parse_trace_events(raw: &Value) -> Result<Vec<TraceEvent>, TraceError> {
    let entries = locate_entries(raw)?;
    let format = detect_capture_format(entries);
    debug!("Parsing {} capture entries ({:?})", entries.len(), format);

    let mut events = Vec::with_capacity(entries.len());
    let mut skipped = 0usize;

    for entry in entries {
        let payload = match format {
            CaptureFormat::TraceEvents => Some(entry.clone()),
            CaptureFormat::PerformanceLog => unwrap_performance_entry(entry),
        };

        let Some(payload) = payload else {
            continue;
        };

        match to_trace_event(payload, events.len()) {
            Some(event) => events.push(event),
            None => skipped += 1,
        }
    }

    debug!("Parsed {} begin/end events ({} other entries skipped)", events.len(), skipped);
    Ok(events)
}

/// Read and parse a capture file
///
/// **Public** - used by the offline `analyze` command
pub fn parse_trace_file(path: impl AsRef<Path>) -> Result<Vec<TraceEvent>, TraceError> {
    let path = path.as_ref();
    debug!("Reading trace capture: {}", path.display());

    let content = std::fs::read_to_string(path)?;
    let raw: Value = serde_json::from_str(&content)?;
    parse_trace_events(&raw)
}

/// Keep only the events of one trace category
///
/// Events without a category are kept: some producers omit `cat`.
pub fn filter_category(events: Vec<TraceEvent>, category: &str) -> Vec<TraceEvent> {
    events
        .into_iter()
        .filter(|e| e.category.as_deref().map_or(true, |c| c.split(',').any(|part| part == category)))
        .collect()
}

/// Find the array of entries inside the capture
///
/// **Private** - internal helper for parse_trace_events
fn locate_entries(raw: &Value) -> Result<&Vec<Value>, TraceError> {
    match raw {
        Value::Array(entries) => Ok(entries),
        Value::Object(obj) => TRACE_EVENTS_FIELD_NAMES
            .iter()
            .find_map(|field| obj.get(*field).and_then(Value::as_array))
            .ok_or_else(|| {
                TraceError::InvalidFormat(format!(
                    "object has none of the fields {:?}",
                    TRACE_EVENTS_FIELD_NAMES
                ))
            }),
        _ => Err(TraceError::InvalidFormat(
            "Trace must be a JSON object or array".to_string(),
        )),
    }
}

/// Heuristic: performance log entries carry a string `message` and no `ph`
fn detect_capture_format(entries: &[Value]) -> CaptureFormat {
    let is_log_entry = entries.first().is_some_and(|first| {
        first.get("message").is_some_and(Value::is_string) && first.get("ph").is_none()
    });

    if is_log_entry {
        CaptureFormat::PerformanceLog
    } else {
        CaptureFormat::TraceEvents
    }
}

/// Extract the trace event carried by a performance log entry
///
/// Entries for other DevTools methods yield `None`.
fn unwrap_performance_entry(entry: &Value) -> Option<Value> {
    let message = entry.get("message")?.as_str()?;

    let decoded: Value = match serde_json::from_str(message) {
        Ok(v) => v,
        Err(e) => {
            warn!("Skipping undecodable performance log entry: {}", e);
            return None;
        }
    };

    let inner = decoded.get("message")?;
    if inner.get("method")?.as_str()? != TRACING_DATA_METHOD {
        return None;
    }

    inner.get("params").cloned()
}

/// Convert one raw event, `None` if it is not a begin/end boundary
fn to_trace_event(payload: Value, sequence: usize) -> Option<TraceEvent> {
    let raw: RawTraceEvent = match serde_json::from_value(payload) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("Skipping malformed trace event: {}", e);
            return None;
        }
    };

    let phase = Phase::from_code(raw.ph.as_deref()?)?;
    let name = raw.name?;

    let Some(timestamp) = raw.ts else {
        debug!("Skipping '{}' {} event without timestamp", name, phase);
        return None;
    };

    Some(TraceEvent {
        name,
        phase,
        timestamp,
        sequence,
        category: raw.cat,
        id: raw.id.map(|id| match id {
            Value::String(s) => s,
            other => other.to_string(),
        }),
    })
}
