//! Mock buyer/seller endpoints.
//!
//! Endpoints serve fixed fixtures to the browser and record every request
//! they receive, so reports sent by the engine can be inspected afterwards.

pub mod request;
pub mod server;

pub use request::RecordedRequest;
pub use server::MockServer;
