//! Network layer - HTTP request execution
//!
//! `client` turns one rendered request into one response; `executor` runs that
//! on a worker task with cooperative-plus-forceful cancellation.

pub mod client;
pub mod executor;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{execute_request, prepare_request, PreparedBody, PreparedRequest};
pub use executor::{CancelToken, RequestExecutor, RequestHandle};
