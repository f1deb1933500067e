//! Workspace document: collections, folders, stored requests and environments.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::lenient;
use crate::models::RequestSpec;

/// Where an environment's variables apply
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum EnvironmentScope {
    /// Also the fallback for unrecognized values on disk
    #[default]
    Global,
    Collection,
    Request,
}

impl EnvironmentScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentScope::Global => "global",
            EnvironmentScope::Collection => "collection",
            EnvironmentScope::Request => "request",
        }
    }
}

impl From<String> for EnvironmentScope {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "global" => EnvironmentScope::Global,
            "collection" => EnvironmentScope::Collection,
            "request" => EnvironmentScope::Request,
            other => {
                tracing::warn!(scope = %other, "Unknown environment scope, using global");
                EnvironmentScope::Global
            }
        }
    }
}

impl From<EnvironmentScope> for String {
    fn from(value: EnvironmentScope) -> Self {
        value.as_str().to_string()
    }
}

impl<'de> Deserialize<'de> for EnvironmentScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(lenient::value_to_string(&value)
            .map(EnvironmentScope::from)
            .unwrap_or_default())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(deserialize_with = "lenient::required_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::required_string")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "String::is_empty"
    )]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(deserialize_with = "lenient::required_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::required_string")]
    pub collection_id: String,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub parent_id: Option<String>,
    #[serde(deserialize_with = "lenient::required_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub order: i64,
}

/// A request saved inside a folder
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRequest {
    #[serde(deserialize_with = "lenient::required_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::required_string")]
    pub folder_id: String,
    #[serde(flatten)]
    pub request: RequestSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub scope: EnvironmentScope,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub owner_id: Option<String>,
    /// Non-string values on disk are kept as their JSON text
    #[serde(default, deserialize_with = "lenient::variables")]
    pub variables: BTreeMap<String, String>,
}

/// The whole persisted workspace. Built fresh for every save and every load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceDocument {
    pub schema_version: i64,
    #[serde(
        default,
        deserialize_with = "lenient::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub collections: Vec<Collection>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub folders: Vec<Folder>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub requests: Vec<StoredRequest>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub environments: Vec<Environment>,
}

fn check_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(StoreError::Validation(format!("duplicate {} id `{}`", kind, id)));
        }
    }
    Ok(())
}

impl WorkspaceDocument {
    pub fn new(schema_version: i64) -> Self {
        WorkspaceDocument {
            schema_version,
            updated_at: None,
            collections: Vec::new(),
            folders: Vec::new(),
            requests: Vec::new(),
            environments: Vec::new(),
        }
    }

    pub fn find_request(&self, id: &str) -> Option<&StoredRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    pub fn find_folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    /// Check id uniqueness and folder/request references.
    ///
    /// Folder parents must live in the same collection and the parent chain
    /// must not loop; every request must point at an existing folder.
    pub fn validate(&self) -> Result<(), StoreError> {
        check_unique("collection", self.collections.iter().map(|c| c.id.as_str()))?;
        check_unique("folder", self.folders.iter().map(|f| f.id.as_str()))?;
        check_unique("request", self.requests.iter().map(|r| r.id.as_str()))?;

        let folders: HashMap<&str, &Folder> =
            self.folders.iter().map(|f| (f.id.as_str(), f)).collect();

        for folder in &self.folders {
            let Some(parent_id) = folder.parent_id.as_deref() else {
                continue;
            };
            let parent = folders.get(parent_id).ok_or_else(|| {
                StoreError::Validation(format!(
                    "folder `{}` has unknown parent `{}`",
                    folder.id, parent_id
                ))
            })?;
            if parent.collection_id != folder.collection_id {
                return Err(StoreError::Validation(format!(
                    "folder `{}` and its parent `{}` belong to different collections",
                    folder.id, parent_id
                )));
            }
        }

        for folder in &self.folders {
            let mut visited = HashSet::new();
            let mut current = Some(folder);
            while let Some(f) = current {
                if !visited.insert(f.id.as_str()) {
                    return Err(StoreError::Validation(format!(
                        "folder `{}` is part of a parent cycle",
                        folder.id
                    )));
                }
                current = f.parent_id.as_deref().and_then(|p| folders.get(p).copied());
            }
        }

        for request in &self.requests {
            if !folders.contains_key(request.folder_id.as_str()) {
                return Err(StoreError::Validation(format!(
                    "request `{}` refers to unknown folder `{}`",
                    request.id, request.folder_id
                )));
            }
        }

        Ok(())
    }

    /// Variables visible to a stored request.
    ///
    /// Global environments first, then the owning collection's, then the
    /// request's own; later scopes override earlier ones.
    pub fn variables_for(&self, request_id: &str) -> HashMap<String, String> {
        let collection_id = self
            .find_request(request_id)
            .and_then(|r| self.find_folder(&r.folder_id))
            .map(|f| f.collection_id.as_str());

        let mut variables = HashMap::new();
        let layers = [
            (EnvironmentScope::Global, None),
            (EnvironmentScope::Collection, collection_id),
            (EnvironmentScope::Request, Some(request_id)),
        ];

        for (scope, owner) in layers {
            for env in self.environments.iter().filter(|e| e.scope == scope) {
                let applies = match scope {
                    EnvironmentScope::Global => true,
                    _ => owner.is_some() && env.owner_id.as_deref() == owner,
                };
                if applies {
                    variables.extend(env.variables.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }

        variables
    }
}
