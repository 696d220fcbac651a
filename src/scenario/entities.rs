//! Buyers, sellers and interest groups of one scenario.

use crate::mockserver::MockServer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

/// How isolated bidding worklet contexts are across interest groups
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    Compatibility,
    FrozenContext,
    GroupByOrigin,
}

impl ExecutionMode {
    pub const ALL: [ExecutionMode; 3] = [
        ExecutionMode::Compatibility,
        ExecutionMode::FrozenContext,
        ExecutionMode::GroupByOrigin,
    ];

    /// Name understood by the engine
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Compatibility => "compatibility",
            ExecutionMode::FrozenContext => "frozen-context",
            ExecutionMode::GroupByOrigin => "group-by-origin",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExecutionMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown execution mode '{}'", s))
    }
}

/// A joined interest group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterestGroup {
    pub name: String,

    /// Address of the owning buyer
    pub owner: String,

    pub bid: u32,

    pub execution_mode: ExecutionMode,
}

/// Buyer endpoint: serves the join page and the bidding logic
pub struct Buyer {
    pub server: MockServer,
}

impl Buyer {
    pub fn new(server: MockServer) -> Self {
        Self { server }
    }

    pub fn address(&self) -> String {
        self.server.address()
    }

    /// Page that joins `group` when loaded
    pub fn join_url(&self, group: &InterestGroup) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("name", &group.name)
            .append_pair("executionMode", group.execution_mode.as_str())
            .append_pair("bid", &group.bid.to_string())
            .finish();
        format!("{}/?{}", self.address(), query)
    }
}

/// Seller endpoint: serves the auction page and the decision logic
pub struct Seller {
    pub server: MockServer,
}

impl Seller {
    pub fn new(server: MockServer) -> Self {
        Self { server }
    }

    pub fn address(&self) -> String {
        self.server.address()
    }

    /// Page that runs one auction among `buyers` when loaded
    pub fn auction_url<'a>(&self, buyers: impl IntoIterator<Item = &'a Buyer>) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for buyer in buyers {
            query.append_pair("buyer", &buyer.address());
        }
        format!("{}/?{}", self.address(), query.finish())
    }
}
