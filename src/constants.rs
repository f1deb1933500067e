//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// User-Agent sent when the caller did not supply one
pub const DEFAULT_USER_AGENT: &str = concat!("restbench/", env!("CARGO_PKG_VERSION"));

/// Directory under the user's home holding settings, workspace and history
pub const APP_DIR_NAME: &str = ".restbench";

/// Request timeout used when a request carries `timeout_ms <= 0`
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Timeout written into requests that were stored without one
pub const DEFAULT_REQUEST_TIMEOUT_MS: i64 = DEFAULT_TIMEOUT_MS as i64;

/// Number of history entries shown when no limit is given
pub const DEFAULT_HISTORY_RETENTION: usize = 100;

/// Workspace document schema written by this version
pub const SCHEMA_VERSION: i64 = 1;

/// Redirect hop limit when redirect following is enabled
pub const MAX_REDIRECTS: usize = 10;

/// Default file names inside the app directory
pub const SETTINGS_FILE: &str = "settings.json";
pub const WORKSPACE_FILE: &str = "workspace.json";
pub const HISTORY_FILE: &str = "history.jsonl";
pub const LOG_FILE: &str = "restbench.log";
