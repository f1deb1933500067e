//! Message types passed from the network layer back to callers.

pub mod network;

pub use network::RequestOutcome;
