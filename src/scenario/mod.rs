//! Auction scenarios driven through the browser.
//!
//! This module handles:
//! - Buyer/seller endpoints and interest groups
//! - Execution mode selection
//! - The per-scenario state machine
//! - The catalog of measurement scenarios

pub mod catalog;
pub mod entities;
pub mod harness;
pub mod mode;

// Re-export main types
pub use catalog::{catalog, find_scenario, GroupNaming, GroupPlan, ScenarioDefinition};
pub use entities::{Buyer, ExecutionMode, InterestGroup, Seller};
pub use harness::{run_scenario, HarnessSettings, ScenarioHarness, ScenarioOutcome, ScenarioState};
pub use mode::ExecutionModeStrategy;
