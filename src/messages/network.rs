//! Network messages - terminal signals of one request invocation

use crate::models::ResponseData;

/// Terminal result of a single send. Exactly one is produced per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Response fully received
    Completed(ResponseData),
    /// Transport or build failure, with a human-readable message
    Failed(String),
    /// Caller asked to stop; not an error
    Canceled,
}

impl RequestOutcome {
    pub const CANCELED_MESSAGE: &'static str = "Request canceled";

    pub fn is_canceled(&self) -> bool {
        matches!(self, RequestOutcome::Canceled)
    }

    pub fn response(&self) -> Option<&ResponseData> {
        match self {
            RequestOutcome::Completed(response) => Some(response),
            _ => None,
        }
    }
}
