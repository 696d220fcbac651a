//! Worklet Trace
//!
//! Concurrency measurement of bidding worklets in the browser's on-device
//! ad auction engine.
//!
//! The engine is driven through WebDriver against mock buyer and seller
//! endpoints; its internal trace events are captured afterwards and the
//! peak number of simultaneously running operations is reconstructed from
//! the begin/end stream.
//!
//! ## Getting Started
//!
//! ```bash
//! chromedriver --port=9515 &
//! worklet-trace run --scenario worklets_basic
//! worklet-trace analyze --trace capture.json --pattern generate_bid
//! ```

pub mod analyzer;
pub mod assertions;
pub mod commands;
pub mod driver;
pub mod mockserver;
pub mod scenario;
pub mod trace;
pub mod utils;
