//! Measurement scenarios.
//!
//! Every scenario runs one seller against N buyers and checks how many
//! bidding worklets the engine runs at once. Ports are fixed per scenario so
//! sibling scenarios never collide; buyer `i` (zero-based) binds
//! `buyer_base_port + i + 1`.

use super::entities::ExecutionMode;
use crate::assertions::{ConcurrencyExpectation, ReportExpectation};
use crate::utils::config::{
    ANY_WORKLET_PATTERN, BIDDER_WORKLET_GENERATE_BID_PATTERN, GENERATE_BID_PATTERN,
    WORKLET_CONCURRENCY_CEILING,
};
use crate::utils::error::ScenarioError;
use serde::Serialize;

/// How interest groups are named across buyers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GroupNaming {
    /// Every buyer joins a group with the same name
    Shared(String),

    /// Buyer `i` joins `<prefix><i>`
    Indexed(String),
}

impl GroupNaming {
    pub fn name_for(&self, buyer: usize) -> String {
        match self {
            GroupNaming::Shared(name) => name.clone(),
            GroupNaming::Indexed(prefix) => format!("{}{}", prefix, buyer),
        }
    }
}

/// One interest group to join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    pub buyer: usize,
    pub name: String,
    pub bid: u32,
}

/// Complete definition of a scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub description: String,
    pub seller_port: u16,
    pub buyer_base_port: u16,
    pub buyers: usize,
    pub group_naming: GroupNaming,
    /// Buyer `i` bids `bid_base + i`
    pub bid_base: u32,
    /// `None` leaves the choice to the execution mode strategy
    pub execution_mode: Option<ExecutionMode>,
    pub auctions: usize,
    pub expectations: Vec<ConcurrencyExpectation>,
    pub report: Option<ReportExpectation>,
}

impl ScenarioDefinition {
    /// Reject definitions that cannot run
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.buyers == 0 {
            return Err(ScenarioError::InvalidDefinition(format!(
                "{}: at least one buyer is required",
                self.name
            )));
        }
        if self.auctions == 0 {
            return Err(ScenarioError::InvalidDefinition(format!(
                "{}: at least one auction is required",
                self.name
            )));
        }
        if let Some(report) = &self.report {
            if report.buyer >= self.buyers {
                return Err(ScenarioError::InvalidDefinition(format!(
                    "{}: report expected from buyer {} of {}",
                    self.name, report.buyer, self.buyers
                )));
            }
        }
        let last_port = u32::from(self.buyer_base_port) + self.buyers as u32;
        if last_port > u32::from(u16::MAX) {
            return Err(ScenarioError::InvalidDefinition(format!(
                "{}: buyer ports overflow",
                self.name
            )));
        }
        Ok(())
    }

    /// Ports for every buyer, in buyer order
    pub fn buyer_ports(&self) -> Vec<u16> {
        (0..self.buyers)
            .map(|i| self.buyer_base_port.saturating_add(i as u16 + 1))
            .collect()
    }

    /// Interest groups to join, one per buyer
    pub fn interest_groups(&self) -> Vec<GroupPlan> {
        (0..self.buyers)
            .map(|buyer| GroupPlan {
                buyer,
                name: self.group_naming.name_for(buyer),
                bid: self.bid_base + buyer as u32,
            })
            .collect()
    }
}

/// All scenarios of the suite
///
/// **Public** - used by the `run` and `scenarios` commands
pub fn catalog() -> Vec<ScenarioDefinition> {
    let ceiling = WORKLET_CONCURRENCY_CEILING;
    let shared = || GroupNaming::Shared("ig".to_string());

    vec![
        ScenarioDefinition {
            name: "worklets_basic".to_string(),
            description: "1 seller, 1 buyer, 1 interest group, 1 auction".to_string(),
            seller_port: 8083,
            buyer_base_port: 8100,
            buyers: 1,
            group_naming: shared(),
            bid_base: 101,
            execution_mode: Some(ExecutionMode::Compatibility),
            auctions: 1,
            expectations: vec![
                ConcurrencyExpectation::new(GENERATE_BID_PATTERN).count(1).peak_exactly(1),
                ConcurrencyExpectation::new(BIDDER_WORKLET_GENERATE_BID_PATTERN)
                    .count(1)
                    .peak_exactly(1),
                ConcurrencyExpectation::new(ANY_WORKLET_PATTERN).count(5).peak_exactly(1),
            ],
            report: Some(ReportExpectation { buyer: 0, bid: 101.0 }),
        },
        ScenarioDefinition {
            name: "worklets_16_buyers".to_string(),
            description: "1 seller, 16 buyers, 1 interest group, 1 auction".to_string(),
            seller_port: 8083,
            buyer_base_port: 8100,
            buyers: 16,
            group_naming: shared(),
            bid_base: 101,
            execution_mode: None,
            auctions: 1,
            expectations: vec![
                // at least 2 at the same time, subject to device capabilities
                ConcurrencyExpectation::new(GENERATE_BID_PATTERN).count(16).peak_at_least(2),
                ConcurrencyExpectation::new(BIDDER_WORKLET_GENERATE_BID_PATTERN)
                    .count(16)
                    .peak_at_least(2),
                ConcurrencyExpectation::new(ANY_WORKLET_PATTERN).count(35),
            ],
            report: Some(ReportExpectation { buyer: 15, bid: 116.0 }),
        },
        ScenarioDefinition {
            name: "worklets_16_buyers_12_auctions".to_string(),
            description: "1 seller, 16 buyers, 1 interest group, 12 auctions".to_string(),
            seller_port: 8283,
            buyer_base_port: 8300,
            buyers: 16,
            group_naming: shared(),
            bid_base: 101,
            execution_mode: None,
            auctions: 12,
            expectations: saturation_expectations(12 * 16, ceiling),
            report: None,
        },
        ScenarioDefinition {
            name: "worklets_32_buyers_12_auctions".to_string(),
            description: "1 seller, 32 buyers, 1 interest group, 12 auctions".to_string(),
            seller_port: 8483,
            buyer_base_port: 8500,
            buyers: 32,
            group_naming: shared(),
            bid_base: 100,
            execution_mode: None,
            auctions: 12,
            expectations: saturation_expectations(12 * 32, ceiling),
            report: None,
        },
        ScenarioDefinition {
            name: "worklets_32_buyers_32_igroups_12_auctions".to_string(),
            description: "1 seller, 32 buyers, 32 interest groups, 12 auctions".to_string(),
            seller_port: 8483,
            buyer_base_port: 8500,
            buyers: 32,
            group_naming: GroupNaming::Indexed("ig_".to_string()),
            bid_base: 100,
            execution_mode: None,
            auctions: 12,
            expectations: saturation_expectations(12 * 32, ceiling),
            report: None,
        },
    ]
}

/// Expectations once candidates outnumber the worklet ceiling
fn saturation_expectations(count: usize, ceiling: usize) -> Vec<ConcurrencyExpectation> {
    vec![
        ConcurrencyExpectation::new(GENERATE_BID_PATTERN).count(count).peak_at_least(2),
        ConcurrencyExpectation::new(BIDDER_WORKLET_GENERATE_BID_PATTERN)
            .count(count)
            .peak_exactly(ceiling),
    ]
}

/// Look up a scenario by name
pub fn find_scenario(name: &str) -> Result<ScenarioDefinition, ScenarioError> {
    catalog()
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| ScenarioError::UnknownScenario(name.to_string()))
}
