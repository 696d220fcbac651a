//! Scenario harness.
//!
//! Drives the browser through one scenario:
//! 1. Bind the seller and buyer endpoints
//! 2. Join interest groups
//! 3. Run auctions
//! 4. Wait for reports to land
//! 5. Extract the trace
//! 6. Check expectations
//! 7. Release the endpoints
//!
//! Every step blocks; any failure aborts the scenario. Endpoints are owned
//! handles, so they are released when the harness goes out of scope on any
//! path, including errors.

use super::catalog::ScenarioDefinition;
use super::entities::{Buyer, ExecutionMode, InterestGroup, Seller};
use super::mode::ExecutionModeStrategy;
use crate::analyzer::ScopedConcurrency;
use crate::assertions::{check_all, check_report_bid, ConcurrencyExpectation, ReportExpectation};
use crate::driver::BrowserDriver;
use crate::mockserver::MockServer;
use crate::trace::{renumber, sort_events, TraceEvent};
use crate::utils::config::{
    AUCTION_SUCCESS_MARKER, BUYER_FIXTURES, DEFAULT_FIXTURES_DIR, DEFAULT_REPORT_GRACE,
    JOIN_SUCCESS_MARKER, MARKER_ELEMENT, REPORT_SIGNALS_PARAM, REPORT_WIN_PATH, SELLER_FIXTURES,
};
use crate::utils::error::ScenarioError;
use crate::utils::timing::MeasureDuration;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Lifecycle of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioState {
    Init,
    ServersUp,
    GroupsJoined,
    AuctionsRun,
    ReportsSettled,
    TraceExtracted,
    Asserted,
    Torndown,
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Runtime knobs of the harness
#[derive(Debug, Clone)]
pub struct HarnessSettings {
    /// Root holding the `buyer/` and `seller/` fixture directories
    pub fixtures_dir: PathBuf,

    /// Wait after the last auction before reports are read
    pub report_grace: Duration,

    /// Bind every endpoint on a free port instead of the scenario's ports
    pub ephemeral_ports: bool,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            fixtures_dir: PathBuf::from(DEFAULT_FIXTURES_DIR),
            report_grace: DEFAULT_REPORT_GRACE,
            ephemeral_ports: false,
        }
    }
}

impl HarnessSettings {
    fn buyer_fixtures(&self) -> PathBuf {
        self.fixtures_dir.join(BUYER_FIXTURES)
    }

    fn seller_fixtures(&self) -> PathBuf {
        self.fixtures_dir.join(SELLER_FIXTURES)
    }
}

/// What a finished scenario measured
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub scenario: String,

    /// Seed of the execution mode strategy, if it was random
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    pub interest_groups: Vec<InterestGroup>,
    pub auctions: usize,
    pub trace_events: usize,
    pub results: Vec<ScopedConcurrency>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_bid: Option<f64>,

    pub duration_secs: f64,
}

/// Scenario harness over a browser driver
pub struct ScenarioHarness<'d, D: BrowserDriver> {
    driver: &'d mut D,
    settings: HarnessSettings,
    modes: ExecutionModeStrategy,
    state: ScenarioState,
    seller: Option<Seller>,
    buyers: Vec<Buyer>,
    groups: Vec<InterestGroup>,
    auctions: usize,
    trace: Vec<TraceEvent>,
}

impl<'d, D: BrowserDriver> ScenarioHarness<'d, D> {
    pub fn new(driver: &'d mut D, settings: HarnessSettings, modes: ExecutionModeStrategy) -> Self {
        Self {
            driver,
            settings,
            modes,
            state: ScenarioState::Init,
            seller: None,
            buyers: Vec::new(),
            groups: Vec::new(),
            auctions: 0,
            trace: Vec::new(),
        }
    }

    pub fn state(&self) -> ScenarioState {
        self.state
    }

    pub fn buyers(&self) -> &[Buyer] {
        &self.buyers
    }

    pub fn interest_groups(&self) -> &[InterestGroup] {
        &self.groups
    }

    /// Sorted trace, available once extracted
    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    /// Move to `to` if the current state allows it
    fn enter(&mut self, allowed: &[ScenarioState], to: ScenarioState) -> Result<(), ScenarioError> {
        if !allowed.contains(&self.state) {
            return Err(ScenarioError::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        debug!("Scenario state: {} -> {}", self.state, to);
        self.state = to;
        Ok(())
    }

    fn port(&self, port: u16) -> u16 {
        if self.settings.ephemeral_ports {
            0
        } else {
            port
        }
    }

    /// Bind the seller and one endpoint per buyer port
    ///
    /// # Errors
    /// * `MockServerError::Bind` - A port is taken; endpoints bound so far are released
    pub fn start_servers(&mut self, seller_port: u16, buyer_ports: &[u16]) -> Result<(), ScenarioError> {
        self.enter(&[ScenarioState::Init], ScenarioState::ServersUp)?;

        let seller = MockServer::bind(self.port(seller_port), self.settings.seller_fixtures())?;
        info!("seller: {}", seller.address());
        self.seller = Some(Seller::new(seller));

        let buyer_dir = self.settings.buyer_fixtures();
        for (index, port) in buyer_ports.iter().enumerate() {
            let server = MockServer::bind(self.port(*port), &buyer_dir)?;
            debug!("buyer {}: {}", index + 1, server.address());
            self.buyers.push(Buyer::new(server));
        }

        info!("{} buyer endpoints up", self.buyers.len());
        Ok(())
    }

    /// Join one interest group owned by buyer `buyer`
    ///
    /// **Public** - `mode = None` defers to the execution mode strategy
    ///
    /// # Errors
    /// * `DriverError::MarkerMissing` - The join page never confirmed
    pub fn join_interest_group(
        &mut self,
        buyer: usize,
        name: &str,
        mode: Option<ExecutionMode>,
        bid: u32,
    ) -> Result<&InterestGroup, ScenarioError> {
        self.enter(
            &[ScenarioState::ServersUp, ScenarioState::GroupsJoined],
            ScenarioState::GroupsJoined,
        )?;

        let owner = self.buyers.get(buyer).ok_or_else(|| {
            ScenarioError::InvalidDefinition(format!(
                "buyer {} does not exist ({} buyers)",
                buyer,
                self.buyers.len()
            ))
        })?;

        let group = InterestGroup {
            name: name.to_string(),
            owner: owner.address(),
            bid,
            execution_mode: self.modes.pick(mode),
        };
        let url = owner.join_url(&group);

        {
            let _timer = MeasureDuration::new("joinAdInterestGroup");
            self.driver.navigate(&url)?;
            self.driver.wait_for_text(MARKER_ELEMENT, JOIN_SUCCESS_MARKER)?;
        }

        debug!(
            "joined '{}' on {} (bid {}, {})",
            group.name, group.owner, group.bid, group.execution_mode
        );
        self.groups.push(group);
        Ok(&self.groups[self.groups.len() - 1])
    }

    /// Run one auction among all buyers
    ///
    /// # Errors
    /// * `DriverError::FrameNotFound` - No winner was rendered
    /// * `DriverError::MarkerMissing` - The rendered ad is not ours
    pub fn run_ad_auction(&mut self) -> Result<(), ScenarioError> {
        self.enter(
            &[ScenarioState::GroupsJoined, ScenarioState::AuctionsRun],
            ScenarioState::AuctionsRun,
        )?;

        let url = match &self.seller {
            Some(seller) => seller.auction_url(&self.buyers),
            None => {
                return Err(ScenarioError::InvalidDefinition(
                    "no seller endpoint".to_string(),
                ))
            }
        };

        let _timer = MeasureDuration::new("runAdAuction");
        self.driver.navigate(&url)?;
        self.driver.switch_to_nested_frame()?;
        self.driver.wait_for_text(MARKER_ELEMENT, AUCTION_SUCCESS_MARKER)?;
        self.driver.switch_to_top()?;

        self.auctions += 1;
        Ok(())
    }

    /// Dump the browser console; never fails
    pub fn log_browser_console(&mut self) {
        match self.driver.console_log() {
            Ok(entries) => {
                for entry in entries {
                    info!("browser: [{}] {}", entry.level, entry.message);
                }
            }
            Err(e) => warn!("Could not read browser log: {}", e),
        }
    }

    /// Give asynchronous reports time to reach the endpoints
    pub fn settle_reports(&mut self) -> Result<(), ScenarioError> {
        self.enter(&[ScenarioState::AuctionsRun], ScenarioState::ReportsSettled)?;

        info!("sleep {} ms ...", self.settings.report_grace.as_millis());
        std::thread::sleep(self.settings.report_grace);
        Ok(())
    }

    /// Pull the trace from the browser and order it by timestamp
    pub fn extract_trace(&mut self) -> Result<&[TraceEvent], ScenarioError> {
        self.enter(&[ScenarioState::ReportsSettled], ScenarioState::TraceExtracted)?;

        let mut trace = self.driver.trace_events()?;
        sort_events(&mut trace);
        renumber(&mut trace);

        info!("trace: {} events", trace.len());
        for event in &trace {
            debug!("trace: {}", event);
        }

        self.trace = trace;
        Ok(&self.trace)
    }

    /// Signals of the last win report received by buyer `buyer`
    ///
    /// # Errors
    /// * `MockServerError::NoRequest` - The report never arrived
    /// * `MockServerError::InvalidJson` - Signals are not JSON
    pub fn report_signals(&self, buyer: usize) -> Result<Value, ScenarioError> {
        let buyer = self.buyers.get(buyer).ok_or_else(|| {
            ScenarioError::InvalidDefinition(format!("buyer {} does not exist", buyer))
        })?;

        let request = buyer.server.get_last_request(REPORT_WIN_PATH)?;
        Ok(request.get_first_json_param(REPORT_SIGNALS_PARAM)?)
    }

    /// Check the trace and, optionally, the winner's report
    ///
    /// # Returns
    /// Scoped results in expectation order and the reported bid, if checked
    pub fn verify(
        &mut self,
        expectations: &[ConcurrencyExpectation],
        report: Option<&ReportExpectation>,
    ) -> Result<(Vec<ScopedConcurrency>, Option<f64>), ScenarioError> {
        self.enter(&[ScenarioState::TraceExtracted], ScenarioState::Asserted)?;

        let results = check_all(expectations, &self.trace)?;

        let reported_bid = match report {
            Some(expected) => {
                let signals = self.report_signals(expected.buyer)?;
                Some(check_report_bid(&signals, expected.bid)?)
            }
            None => None,
        };

        Ok((results, reported_bid))
    }

    /// Release every endpoint
    pub fn teardown(&mut self) {
        let released = self.buyers.len() + usize::from(self.seller.is_some());
        self.buyers.clear();
        self.seller = None;
        self.state = ScenarioState::Torndown;
        debug!("released {} endpoints", released);
    }
}

/// Run a scenario from start to teardown
///
/// **Public** - main entry point for scenario execution
///
/// # Arguments
/// * `driver` - Browser session for this scenario
/// * `scenario` - What to run and what to expect
/// * `settings` - Fixtures, grace period, port policy
/// * `modes` - Execution modes for groups that do not pin one
///
/// # Errors
/// The first failure of any step; endpoints are released regardless.
pub fn run_scenario<D: BrowserDriver>(
    driver: &mut D,
    scenario: &ScenarioDefinition,
    settings: HarnessSettings,
    modes: ExecutionModeStrategy,
) -> Result<ScenarioOutcome, ScenarioError> {
    scenario.validate()?;
    info!("Scenario {}: {}", scenario.name, scenario.description);

    let timer = MeasureDuration::new(format!("scenario {}", scenario.name));
    let seed = modes.seed();
    let mut harness = ScenarioHarness::new(driver, settings, modes);

    harness.start_servers(scenario.seller_port, &scenario.buyer_ports())?;

    for group in scenario.interest_groups() {
        harness.join_interest_group(group.buyer, &group.name, scenario.execution_mode, group.bid)?;
    }

    for auction in 0..scenario.auctions {
        debug!("auction {}/{}", auction + 1, scenario.auctions);
        harness.run_ad_auction()?;
    }

    harness.log_browser_console();
    harness.settle_reports()?;

    let trace_events = harness.extract_trace()?.len();
    let (results, reported_bid) =
        harness.verify(&scenario.expectations, scenario.report.as_ref())?;

    let interest_groups = harness.interest_groups().to_vec();
    let auctions = harness.auctions;
    harness.teardown();

    Ok(ScenarioOutcome {
        scenario: scenario.name.clone(),
        seed,
        interest_groups,
        auctions,
        trace_events,
        results,
        reported_bid,
        duration_secs: timer.elapsed().as_secs_f64(),
    })
}
