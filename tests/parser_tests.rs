use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;
use worklet_trace::analyzer::analyze_filtered;
use worklet_trace::trace::{filter_category, parse_trace_events, parse_trace_file, sort_events, Phase};
use worklet_trace::utils::TraceError;

fn write_capture(content: &serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_chrome_trace_file() {
    let capture = json!({
        "traceEvents": [
            {"name": "generate_bid", "ph": "b", "ts": 10, "cat": "fledge", "id": "0x1"},
            {"name": "generate_bid", "ph": "b", "ts": 11, "cat": "fledge", "id": "0x2"},
            {"name": "thread_name", "ph": "M", "ts": 0},
            {"name": "generate_bid", "ph": "e", "ts": 20, "cat": "fledge", "id": "0x1"},
            {"name": "generate_bid", "ph": "e", "ts": 21, "cat": "fledge", "id": "0x2"}
        ],
        "metadata": {}
    });
    let file = write_capture(&capture);

    let events = parse_trace_file(file.path()).unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0].id.as_deref(), Some("0x1"));
    assert_eq!(events[3].sequence, 3);

    assert_eq!(analyze_filtered(&events, "generate_bid").unwrap().as_pair(), (2, 2));
}

#[test]
fn test_bare_event_array() {
    let capture = json!([
        {"name": "create_bidder_worklet", "ph": "b", "ts": 1.5},
        {"name": "create_bidder_worklet", "ph": "B", "ts": 1.6},
        {"name": "create_bidder_worklet", "ph": "E", "ts": 2.4},
        {"name": "create_bidder_worklet", "ph": "e", "ts": 2.5},
        {"name": "instant", "ph": "i", "ts": 3.0}
    ]);

    let events = parse_trace_events(&capture).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].phase, Phase::Begin);
    assert_eq!(events[1].phase, Phase::End);
    assert_eq!(events[1].timestamp, 2.5);
}

#[test]
fn test_duration_slices_do_not_count() {
    let capture = json!([
        {"name": "generate_bid", "ph": "b", "ts": 10},
        {"name": "generate_bid", "ph": "B", "ts": 11},
        {"name": "generate_bid", "ph": "E", "ts": 12},
        {"name": "generate_bid", "ph": "e", "ts": 13}
    ]);

    let events = parse_trace_events(&capture).unwrap();
    assert_eq!(analyze_filtered(&events, "generate_bid").unwrap().as_pair(), (1, 1));
}

#[test]
fn test_events_without_timestamp_are_skipped() {
    let capture = json!([
        {"name": "generate_bid", "ph": "e"},
        {"name": "generate_bid", "ph": "b", "ts": 10},
        {"name": "generate_bid", "ph": "e", "ts": 20}
    ]);

    let mut events = parse_trace_events(&capture).unwrap();
    assert_eq!(events.len(), 2);

    sort_events(&mut events);
    assert_eq!(analyze_filtered(&events, "generate_bid").unwrap().as_pair(), (1, 1));
}

#[test]
fn test_performance_log() {
    let entry = |name: &str, ph: &str, ts: u64| {
        json!({
            "level": "INFO",
            "timestamp": 1_700_000_000_000u64,
            "message": json!({
                "message": {
                    "method": "Tracing.dataCollected",
                    "params": {"name": name, "ph": ph, "ts": ts, "cat": "fledge"}
                },
                "webview": "ABC"
            }).to_string()
        })
    };
    let other = json!({
        "level": "INFO",
        "timestamp": 1_700_000_000_000u64,
        "message": json!({"message": {"method": "Network.requestWillBeSent", "params": {}}}).to_string()
    });

    let capture = json!([
        entry("generate_bid", "e", 30),
        other,
        entry("generate_bid", "b", 10),
    ]);

    let mut events = parse_trace_events(&capture).unwrap();
    assert_eq!(events.len(), 2);

    // Capture order is not time order
    sort_events(&mut events);
    assert_eq!(events[0].phase, Phase::Begin);
    assert_eq!(analyze_filtered(&events, "generate_bid").unwrap().as_pair(), (1, 1));
}

#[test]
fn test_filter_category() {
    let capture = json!([
        {"name": "generate_bid", "ph": "b", "ts": 1, "cat": "fledge"},
        {"name": "generate_bid", "ph": "e", "ts": 2, "cat": "fledge"},
        {"name": "paint", "ph": "b", "ts": 1, "cat": "devtools.timeline,blink"},
        {"name": "paint", "ph": "e", "ts": 2, "cat": "devtools.timeline,blink"},
        {"name": "uncategorized", "ph": "b", "ts": 3}
    ]);

    let events = filter_category(parse_trace_events(&capture).unwrap(), "fledge");
    let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["generate_bid", "generate_bid", "uncategorized"]);

    let blink = filter_category(parse_trace_events(&capture).unwrap(), "blink");
    assert_eq!(blink.len(), 3);
}

#[test]
fn test_invalid_capture() {
    assert!(matches!(
        parse_trace_events(&json!("not a trace")),
        Err(TraceError::InvalidFormat(_))
    ));
    assert!(matches!(
        parse_trace_events(&json!({"unrelated": []})),
        Err(TraceError::InvalidFormat(_))
    ));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        parse_trace_file("/nonexistent/trace.json"),
        Err(TraceError::Io(_))
    ));
}

#[test]
fn test_malformed_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{\"traceEvents\": [").unwrap();

    assert!(matches!(
        parse_trace_file(file.path()),
        Err(TraceError::JsonError(_))
    ));
}
