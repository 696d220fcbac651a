//! Oracle checks over concurrency results and reports.
//!
//! Expectations encode what the engine is supposed to do in a scenario:
//! how many occurrences of an operation the trace holds and how far their
//! concurrency goes. Worklet concurrency saturates at a fixed ceiling no
//! matter how many buyers, groups or auctions are involved.

use crate::analyzer::{analyze_filtered, ScopedConcurrency};
use crate::trace::TraceEvent;
use crate::utils::error::{AssertionError, ScenarioError};
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Constraint on peak concurrency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeakBound {
    Exactly(usize),
    AtLeast(usize),
}

impl PeakBound {
    pub fn holds(&self, peak: usize) -> bool {
        match *self {
            PeakBound::Exactly(n) => peak == n,
            PeakBound::AtLeast(n) => peak >= n,
        }
    }
}

impl fmt::Display for PeakBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeakBound::Exactly(n) => write!(f, "exactly {}", n),
            PeakBound::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Expected shape of one scoped query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConcurrencyExpectation {
    pub pattern: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak: Option<PeakBound>,
}

impl ConcurrencyExpectation {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            count: None,
            peak: None,
        }
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn peak_exactly(mut self, peak: usize) -> Self {
        self.peak = Some(PeakBound::Exactly(peak));
        self
    }

    pub fn peak_at_least(mut self, peak: usize) -> Self {
        self.peak = Some(PeakBound::AtLeast(peak));
        self
    }

    /// Compare an already computed result
    ///
    /// # Errors
    /// * `AssertionError::CountMismatch` - Occurrence count differs
    /// * `AssertionError::PeakMismatch` - Peak outside the bound
    pub fn verify(&self, scoped: &ScopedConcurrency) -> Result<(), AssertionError> {
        if let Some(expected) = self.count {
            if scoped.count() != expected {
                return Err(AssertionError::CountMismatch {
                    pattern: self.pattern.clone(),
                    expected,
                    actual: scoped.count(),
                });
            }
        }

        if let Some(bound) = self.peak {
            if !bound.holds(scoped.peak()) {
                return Err(AssertionError::PeakMismatch {
                    pattern: self.pattern.clone(),
                    bound: bound.to_string(),
                    actual: scoped.peak(),
                });
            }
        }

        Ok(())
    }

    /// Run the scoped query over `events` and verify it
    pub fn check(&self, events: &[TraceEvent]) -> Result<ScopedConcurrency, ScenarioError> {
        let scoped = analyze_filtered(events, &self.pattern)?;
        self.verify(&scoped)?;
        Ok(scoped)
    }
}

/// Check every expectation in order, stopping at the first failure
pub fn check_all(
    expectations: &[ConcurrencyExpectation],
    events: &[TraceEvent],
) -> Result<Vec<ScopedConcurrency>, ScenarioError> {
    expectations.iter().map(|e| e.check(events)).collect()
}

/// Bid a buyer is expected to report as the winner
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportExpectation {
    /// Zero-based buyer index
    pub buyer: usize,

    pub bid: f64,
}

/// Verify `signals.browserSignals.bid` of a win report
///
/// # Returns
/// The reported bid
///
/// # Errors
/// * `AssertionError::ReportFieldMissing` - No numeric bid in the report
/// * `AssertionError::BidMismatch` - Bid differs from `expected`
pub fn check_report_bid(signals: &Value, expected: f64) -> Result<f64, AssertionError> {
    let bid = signals
        .get("browserSignals")
        .ok_or_else(|| AssertionError::ReportFieldMissing("browserSignals".to_string()))?
        .get("bid")
        .and_then(Value::as_f64)
        .ok_or_else(|| AssertionError::ReportFieldMissing("browserSignals.bid".to_string()))?;

    info!("reported bid: {} (expected {})", bid, expected);

    if bid != expected {
        return Err(AssertionError::BidMismatch {
            expected,
            actual: bid,
        });
    }
    Ok(bid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ConcurrencyResult;
    use serde_json::json;

    fn scoped(count: usize, peak: usize) -> ScopedConcurrency {
        ScopedConcurrency {
            pattern: "bidder_worklet_generate_bid".to_string(),
            result: ConcurrencyResult {
                total_occurrences: count,
                max_concurrent: peak,
            },
        }
    }

    #[test]
    fn test_peak_bound() {
        assert!(PeakBound::Exactly(10).holds(10));
        assert!(!PeakBound::Exactly(10).holds(11));
        assert!(PeakBound::AtLeast(2).holds(2));
        assert!(PeakBound::AtLeast(2).holds(9));
        assert!(!PeakBound::AtLeast(2).holds(1));
    }

    #[test]
    fn test_verify_passes() {
        let expectation = ConcurrencyExpectation::new("bidder_worklet_generate_bid")
            .count(192)
            .peak_exactly(10);
        assert!(expectation.verify(&scoped(192, 10)).is_ok());
    }

    #[test]
    fn test_verify_count_mismatch() {
        let expectation = ConcurrencyExpectation::new("generate_bid").count(16);
        let err = expectation.verify(&scoped(15, 1)).unwrap_err();
        assert!(matches!(
            err,
            AssertionError::CountMismatch { expected: 16, actual: 15, .. }
        ));
    }

    #[test]
    fn test_verify_peak_mismatch_message() {
        let expectation = ConcurrencyExpectation::new("bidder_worklet_generate_bid").peak_exactly(10);
        let err = expectation.verify(&scoped(384, 12)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Peak concurrency for 'bidder_worklet_generate_bid': expected exactly 10, got 12"
        );
    }

    #[test]
    fn test_check_report_bid() {
        let signals = json!({"browserSignals": {"bid": 101, "seller": "x"}, "auctionSignals": {}});
        assert_eq!(check_report_bid(&signals, 101.0).unwrap(), 101.0);

        assert!(matches!(
            check_report_bid(&signals, 116.0),
            Err(AssertionError::BidMismatch { .. })
        ));
        assert!(matches!(
            check_report_bid(&json!({}), 101.0),
            Err(AssertionError::ReportFieldMissing(_))
        ));
    }
}
