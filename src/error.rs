use thiserror::Error;

/// Errors from the workspace store, history log and settings file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted document is malformed; nothing was loaded
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Classify a JSON read failure: I/O problems stay I/O, the rest is a
    /// malformed document.
    pub(crate) fn from_json_read(err: serde_json::Error) -> Self {
        if err.is_io() {
            StoreError::Io(err.into())
        } else {
            StoreError::Validation(err.to_string())
        }
    }
}

/// Failures while building or issuing one HTTP call
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Invalid HTTP method `{0}`")]
    InvalidMethod(String),

    #[error("Invalid proxy URL `{url}`: {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request timed out ({0}ms)")]
    Timeout(u64),

    #[error("Connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Error reading body: {0}")]
    Body(#[source] reqwest::Error),
}

impl ExecError {
    /// Classify a reqwest send error the way the UI reports it
    pub(crate) fn from_send(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            ExecError::Timeout(timeout_ms)
        } else if err.is_connect() {
            ExecError::Connect(err)
        } else {
            ExecError::Transport(err)
        }
    }
}
