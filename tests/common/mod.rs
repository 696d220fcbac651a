//! Scripted stand-in for the browser and its auction engine.
//!
//! Loads pages from the mock endpoints over HTTP, remembers joined groups,
//! and for every auction emits a synthetic trace in which at most
//! `worklet_ceiling` bidding worklets overlap. The winner (highest bid)
//! receives a `reportWin` request like the real bidding logic sends.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use worklet_trace::driver::{BrowserDriver, LogEntry};
use worklet_trace::scenario::HarnessSettings;
use worklet_trace::trace::{Phase, TraceEvent};
use worklet_trace::utils::DriverError;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources")
}

pub fn test_settings() -> HarnessSettings {
    HarnessSettings {
        fixtures_dir: fixtures_dir(),
        report_grace: Duration::from_millis(10),
        ephemeral_ports: true,
    }
}

/// Browser addresses use `localhost`; the test client talks IPv4 directly
fn local(url: &str) -> String {
    url.replacen("localhost", "127.0.0.1", 1)
}

pub struct FakeEngine {
    http: reqwest::blocking::Client,
    /// Buyer origin -> bid
    groups: HashMap<String, u32>,
    page_text: String,
    frame_text: Option<String>,
    in_frame: bool,
    trace: Vec<TraceEvent>,
    auctions: usize,
    pub visited: Vec<String>,
    pub worklet_ceiling: usize,
    pub render_ads: bool,
    pub send_reports: bool,
    pub drop_last_end: bool,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            groups: HashMap::new(),
            page_text: String::new(),
            frame_text: None,
            in_frame: false,
            trace: Vec::new(),
            auctions: 0,
            visited: Vec::new(),
            worklet_ceiling: 10,
            render_ads: true,
            send_reports: true,
            drop_last_end: false,
        }
    }

    fn push_interval(&mut self, name: &str, begin: f64, end: f64) {
        // Emitted newest-first: the harness has to sort
        self.trace.insert(0, TraceEvent::new(name, Phase::Begin, begin, 0).with_category("fledge"));
        self.trace.insert(0, TraceEvent::new(name, Phase::End, end, 0).with_category("fledge"));
    }

    fn join(&mut self, url: &url::Url) {
        let bid = url
            .query_pairs()
            .find(|(k, _)| k == "bid")
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0);
        self.groups.insert(url.origin().ascii_serialization(), bid);
        self.page_text = "joined interest group".to_string();
    }

    fn auction(&mut self, url: &url::Url) {
        let buyers: Vec<String> = url
            .query_pairs()
            .filter(|(k, _)| k == "buyer")
            .map(|(_, v)| v.into_owned())
            .collect();

        let base = self.auctions as f64 * 10_000.0;
        let mut winner: Option<(String, u32)> = None;

        for (j, buyer) in buyers.iter().enumerate() {
            let Some(&bid) = self.groups.get(buyer) else {
                continue;
            };
            let start = base + (j / self.worklet_ceiling) as f64 * 10.0;
            self.push_interval("create_bidder_worklet", start, start + 1.0);
            self.push_interval("bidder_worklet_generate_bid", start + 2.0, start + 7.0);
            self.push_interval("generate_bid", start + 3.0, start + 6.0);

            if winner.as_ref().map_or(true, |(_, best)| bid > *best) {
                winner = Some((buyer.clone(), bid));
            }
        }

        let batches = (buyers.len() + self.worklet_ceiling - 1) / self.worklet_ceiling;
        let end = base + batches as f64 * 10.0;
        self.push_interval("create_seller_worklet", end + 1.0, end + 2.0);
        self.push_interval("bidder_worklet_report_win", end + 3.0, end + 4.0);
        self.push_interval("seller_worklet_report_result", end + 5.0, end + 6.0);

        if let (true, Some((owner, bid))) = (self.send_reports, winner) {
            let signals = serde_json::json!({
                "browserSignals": { "bid": bid, "interestGroupOwner": owner },
                "auctionSignals": {},
            });
            self.http
                .get(local(&format!("{}/reportWin", owner)))
                .query(&[("signals", signals.to_string())])
                .send()
                .expect("report request");
        }

        self.auctions += 1;
        self.page_text = String::new();
        self.frame_text = self.render_ads.then(|| "TC AD".to_string());
    }
}

impl BrowserDriver for FakeEngine {
    fn navigate(&mut self, target: &str) -> Result<(), DriverError> {
        self.visited.push(target.to_string());
        self.in_frame = false;
        self.frame_text = None;

        let response = self.http.get(local(target)).send()?;
        if !response.status().is_success() {
            self.page_text = format!("HTTP {}", response.status());
            return Ok(());
        }

        let url = url::Url::parse(target).map_err(|e| DriverError::InvalidResponse(e.to_string()))?;
        if url.query_pairs().any(|(k, _)| k == "name") {
            self.join(&url);
        } else if url.query_pairs().any(|(k, _)| k == "buyer") {
            self.auction(&url);
        }
        Ok(())
    }

    fn element_text(&mut self, _selector: &str) -> Result<String, DriverError> {
        if self.in_frame {
            Ok(self.frame_text.clone().unwrap_or_default())
        } else {
            Ok(self.page_text.clone())
        }
    }

    fn switch_to_nested_frame(&mut self) -> Result<(), DriverError> {
        if self.frame_text.is_none() {
            return Err(DriverError::FrameNotFound);
        }
        self.in_frame = true;
        Ok(())
    }

    fn switch_to_top(&mut self) -> Result<(), DriverError> {
        self.in_frame = false;
        Ok(())
    }

    fn console_log(&mut self) -> Result<Vec<LogEntry>, DriverError> {
        Ok(vec![LogEntry {
            level: "INFO".to_string(),
            message: format!("{} auctions run", self.auctions),
            timestamp: 0,
        }])
    }

    fn trace_events(&mut self) -> Result<Vec<TraceEvent>, DriverError> {
        let mut trace = self.trace.clone();
        if self.drop_last_end {
            // Newest-first, so the first End is the latest one
            if let Some(pos) = trace.iter().position(|e| e.phase == Phase::End) {
                trace.remove(pos);
            }
        }
        Ok(trace)
    }

    fn element_wait(&self) -> Duration {
        Duration::from_millis(200)
    }
}
