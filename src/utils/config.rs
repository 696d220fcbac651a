//! Configuration and constants for the harness and the CLI.

use std::time::Duration;

/// Default chromedriver endpoint
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Default timeout for WebDriver HTTP requests
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// How long to wait for a success marker to be rendered
pub const DEFAULT_ELEMENT_WAIT: Duration = Duration::from_secs(10);

/// Poll interval while waiting for a success marker
pub const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Grace period for asynchronous report callbacks to land on the endpoints
pub const DEFAULT_REPORT_GRACE: Duration = Duration::from_secs(1);

/// Current summary schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Markers rendered by the fixtures once a round-trip succeeded
pub const JOIN_SUCCESS_MARKER: &str = "joined interest group";
pub const AUCTION_SUCCESS_MARKER: &str = "TC AD";
pub const MARKER_ELEMENT: &str = "body";

/// Trace category the engine emits auction events under
pub const TRACE_CATEGORY: &str = "fledge";

/// Worklet concurrency observed to saturate at this level
pub const WORKLET_CONCURRENCY_CEILING: usize = 10;

// Fixture layout, relative to the fixtures root
pub const DEFAULT_FIXTURES_DIR: &str = "resources";
pub const BUYER_FIXTURES: &str = "buyer";
pub const SELLER_FIXTURES: &str = "seller";

// Report callback issued by the bidding logic
pub const REPORT_WIN_PATH: &str = "/reportWin";
pub const REPORT_SIGNALS_PARAM: &str = "signals";

// Trace event names the scenarios measure
pub const GENERATE_BID_PATTERN: &str = "generate_bid";
pub const BIDDER_WORKLET_GENERATE_BID_PATTERN: &str = "bidder_worklet_generate_bid";
pub const ANY_WORKLET_PATTERN: &str = ".*worklet.*";

// Field names for trace parsing (captures come in several shapes)
pub const TRACE_EVENTS_FIELD_NAMES: &[&str] = &["traceEvents", "trace_events", "events", "value"];
pub const TRACING_DATA_METHOD: &str = "Tracing.dataCollected";

/// Chrome switches that enable the on-device auction API
pub const CHROME_FLEDGE_ARGS: &[&str] = &[
    "--enable-features=InterestGroupStorage,AdInterestGroupAPI,Fledge,FencedFrames,AllowURNsInIframes,FledgeBiddingAndAuctionServer",
    "--disable-features=EnforcePrivacySandboxAttestations",
    "--no-sandbox",
    "--disable-dev-shm-usage",
];
