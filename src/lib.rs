//! # restbench
//!
//! Compose, template, send and record HTTP requests.
//!
//! ## Features
//! - `{{variable}}` templating over every request field
//! - Cancellable request execution (raw and multipart bodies, Basic/Bearer auth,
//!   proxy, TLS and redirect options)
//! - Crash-safe workspace persistence (atomic JSON document)
//! - Durable append-only request history (JSON lines)
//!
//! ## Architecture
//! - Template layer - pure substitution
//! - Network layer (Tokio) - one worker task per send, oneshot outcome channel
//! - Storage layer - synchronous file I/O, single writer per path

pub mod constants;
pub mod error;
mod lenient;
pub mod messages;
pub mod models;
pub mod network;
pub mod settings;
pub mod storage;
pub mod template;
pub mod workspace;

// Re-export commonly used types
pub use error::{ExecError, StoreError};
pub use messages::RequestOutcome;
pub use models::{AuthConfig, BodyType, HistoryEntry, NetworkOptions, Pair, RequestSpec, ResponseData};
pub use network::{CancelToken, RequestExecutor, RequestHandle};
pub use settings::{AppPaths, Settings};
pub use storage::{HistoryLog, JsonWorkspaceStorage, WorkspaceStorage};
pub use template::{render_request, render_text};
pub use workspace::{Collection, Environment, EnvironmentScope, Folder, StoredRequest, WorkspaceDocument};
