//! Durable storage: the workspace document and the request history log.
//!
//! Both assume a single writer per path. Callers serialize concurrent writers.

pub mod atomic;
pub mod history;
pub mod json;

use std::path::Path;

use crate::error::StoreError;
use crate::workspace::WorkspaceDocument;

pub use atomic::atomic_write;
pub use history::{append_history_entry, load_history, HistoryLog};
pub use json::JsonWorkspaceStorage;

/// Loads and saves a whole workspace document
pub trait WorkspaceStorage {
    fn load(&self, path: &Path) -> Result<WorkspaceDocument, StoreError>;
    fn save(&self, path: &Path, workspace: &WorkspaceDocument) -> Result<(), StoreError>;
}

/// Load a workspace with the default JSON storage
pub fn load_workspace(path: impl AsRef<Path>) -> Result<WorkspaceDocument, StoreError> {
    JsonWorkspaceStorage::default().load(path.as_ref())
}

/// Save a workspace with the default JSON storage
pub fn save_workspace(path: impl AsRef<Path>, workspace: &WorkspaceDocument) -> Result<(), StoreError> {
    JsonWorkspaceStorage::default().save(path.as_ref(), workspace)
}
