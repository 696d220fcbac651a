mod common;

use common::{test_settings, FakeEngine};
use pretty_assertions::assert_eq;
use worklet_trace::mockserver::MockServer;
use worklet_trace::scenario::{
    find_scenario, run_scenario, ExecutionMode, ExecutionModeStrategy, ScenarioHarness,
    ScenarioState,
};
use worklet_trace::utils::{AnalyzeError, AssertionError, DriverError, MockServerError, ScenarioError};

fn run(engine: &mut FakeEngine, name: &str) -> Result<worklet_trace::scenario::ScenarioOutcome, ScenarioError> {
    let scenario = find_scenario(name).unwrap();
    run_scenario(engine, &scenario, test_settings(), ExecutionModeStrategy::seeded(7))
}

#[test]
fn test_basic_scenario() {
    let mut engine = FakeEngine::new();
    let outcome = run(&mut engine, "worklets_basic").unwrap();

    let pairs: Vec<(usize, usize)> = outcome.results.iter().map(|r| r.as_pair()).collect();
    assert_eq!(pairs, vec![(1, 1), (1, 1), (5, 1)]);
    assert_eq!(outcome.reported_bid, Some(101.0));
    assert_eq!(outcome.auctions, 1);
    assert_eq!(outcome.seed, Some(7));

    // Pinned by the scenario, not picked
    assert_eq!(outcome.interest_groups.len(), 1);
    assert_eq!(outcome.interest_groups[0].execution_mode, ExecutionMode::Compatibility);
    assert_eq!(outcome.interest_groups[0].name, "ig");
}

#[test]
fn test_16_buyers() {
    let mut engine = FakeEngine::new();
    let outcome = run(&mut engine, "worklets_16_buyers").unwrap();

    assert_eq!(outcome.results[0].count(), 16);
    assert!(outcome.results[0].peak() >= 2);
    assert_eq!(outcome.results[2].count(), 35);
    assert_eq!(outcome.reported_bid, Some(116.0));
}

#[test]
fn test_16_buyers_12_auctions_saturates() {
    let mut engine = FakeEngine::new();
    let outcome = run(&mut engine, "worklets_16_buyers_12_auctions").unwrap();

    assert_eq!(outcome.auctions, 12);
    assert_eq!(outcome.results[1].as_pair(), (192, 10));
    assert_eq!(outcome.reported_bid, None);
}

#[test]
fn test_32_buyers_12_auctions_saturates() {
    let mut engine = FakeEngine::new();
    let outcome = run(&mut engine, "worklets_32_buyers_12_auctions").unwrap();
    assert_eq!(outcome.results[1].as_pair(), (384, 10));
}

#[test]
fn test_32_interest_groups() {
    let mut engine = FakeEngine::new();
    let outcome = run(&mut engine, "worklets_32_buyers_32_igroups_12_auctions").unwrap();

    assert_eq!(outcome.results[1].as_pair(), (384, 10));
    let names: Vec<&str> = outcome.interest_groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names[0], "ig_0");
    assert_eq!(names[31], "ig_31");
}

#[test]
fn test_seed_replays_execution_modes() {
    let modes = |seed| {
        let mut engine = FakeEngine::new();
        let scenario = find_scenario("worklets_16_buyers").unwrap();
        run_scenario(&mut engine, &scenario, test_settings(), ExecutionModeStrategy::seeded(seed))
            .unwrap()
            .interest_groups
            .into_iter()
            .map(|g| g.execution_mode)
            .collect::<Vec<_>>()
    };

    assert_eq!(modes(42), modes(42));
}

#[test]
fn test_visits_join_pages_then_auctions() {
    let mut engine = FakeEngine::new();
    run(&mut engine, "worklets_16_buyers").unwrap();

    assert_eq!(engine.visited.len(), 17);
    assert!(engine.visited[..16].iter().all(|url| url.contains("name=ig")));
    assert!(engine.visited[16].contains("buyer="));
}

#[test]
fn test_too_many_parallel_worklets_fails() {
    let mut engine = FakeEngine::new();
    engine.worklet_ceiling = 16;

    match run(&mut engine, "worklets_16_buyers_12_auctions") {
        Err(ScenarioError::Assertion(AssertionError::PeakMismatch { actual, .. })) => {
            assert_eq!(actual, 16);
        }
        other => panic!("expected PeakMismatch, got {:?}", other.map(|o| o.results)),
    }
}

#[test]
fn test_missing_report_fails() {
    let mut engine = FakeEngine::new();
    engine.send_reports = false;

    assert!(matches!(
        run(&mut engine, "worklets_basic"),
        Err(ScenarioError::MockServer(MockServerError::NoRequest(_)))
    ));
}

#[test]
fn test_unbalanced_trace_fails() {
    let mut engine = FakeEngine::new();
    engine.drop_last_end = true;

    assert!(matches!(
        run(&mut engine, "worklets_basic"),
        Err(ScenarioError::Analyze(AnalyzeError::Unbalanced { .. }))
    ));
}

#[test]
fn test_failed_auction_releases_endpoints() {
    let mut engine = FakeEngine::new();
    engine.render_ads = false;

    let ports: Vec<u16> = {
        let mut harness = ScenarioHarness::new(
            &mut engine,
            test_settings(),
            ExecutionModeStrategy::fixed(ExecutionMode::FrozenContext),
        );
        harness.start_servers(0, &[0, 0]).unwrap();
        harness.join_interest_group(0, "ig", None, 101).unwrap();
        harness.join_interest_group(1, "ig", None, 102).unwrap();

        assert!(matches!(
            harness.run_ad_auction(),
            Err(ScenarioError::Driver(DriverError::FrameNotFound))
        ));

        let ports = harness.buyers().iter().map(|b| b.server.port()).collect();
        ports
    };

    let buyer_dir = common::fixtures_dir().join("buyer");
    for port in ports {
        MockServer::bind(port, &buyer_dir).unwrap();
    }
}

#[test]
fn test_out_of_order_steps_are_rejected() {
    let mut engine = FakeEngine::new();
    let mut harness = ScenarioHarness::new(
        &mut engine,
        test_settings(),
        ExecutionModeStrategy::fixed(ExecutionMode::Compatibility),
    );

    assert!(matches!(
        harness.run_ad_auction(),
        Err(ScenarioError::InvalidTransition { .. })
    ));
    assert_eq!(harness.state(), ScenarioState::Init);

    harness.start_servers(0, &[0]).unwrap();
    assert!(matches!(
        harness.settle_reports(),
        Err(ScenarioError::InvalidTransition { .. })
    ));

    let group = harness.join_interest_group(0, "ig", None, 101).unwrap();
    assert_eq!(group.execution_mode, ExecutionMode::Compatibility);
    assert!(matches!(
        harness.join_interest_group(5, "ig", None, 101),
        Err(ScenarioError::InvalidDefinition(_))
    ));

    harness.run_ad_auction().unwrap();
    harness.settle_reports().unwrap();
    assert_eq!(harness.extract_trace().unwrap().len(), 12);

    harness.teardown();
    assert_eq!(harness.state(), ScenarioState::Torndown);
    assert!(harness.buyers().is_empty());
}

#[test]
fn test_extracted_trace_is_time_ordered() {
    let mut engine = FakeEngine::new();
    let mut harness = ScenarioHarness::new(
        &mut engine,
        test_settings(),
        ExecutionModeStrategy::seeded(1),
    );
    harness.start_servers(0, &[0, 0, 0]).unwrap();
    for buyer in 0..3 {
        harness.join_interest_group(buyer, "ig", None, 100 + buyer as u32).unwrap();
    }
    harness.run_ad_auction().unwrap();
    harness.settle_reports().unwrap();

    let trace = harness.extract_trace().unwrap();
    assert!(trace.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(trace.iter().enumerate().all(|(i, e)| e.sequence == i));

    let signals = harness.report_signals(2).unwrap();
    assert_eq!(signals["browserSignals"]["bid"], 102);
}
