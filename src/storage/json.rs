//! JSON workspace storage

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;

use crate::constants::SCHEMA_VERSION;
use crate::error::StoreError;
use crate::storage::atomic::atomic_write;
use crate::storage::WorkspaceStorage;
use crate::workspace::WorkspaceDocument;

/// Stores the workspace as one pretty-printed JSON document
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonWorkspaceStorage;

impl JsonWorkspaceStorage {
    /// Parse a workspace from an already-read JSON value
    pub fn from_value(payload: Value) -> Result<WorkspaceDocument, StoreError> {
        let Some(object) = payload.as_object() else {
            return Err(StoreError::Validation(
                "workspace payload must be an object".to_string(),
            ));
        };

        let Some(schema_version) = object.get("schema_version").and_then(Value::as_i64) else {
            return Err(StoreError::Validation(
                "schema_version must be an integer".to_string(),
            ));
        };
        if schema_version > SCHEMA_VERSION {
            tracing::warn!(
                schema_version,
                supported = SCHEMA_VERSION,
                "Workspace uses a newer schema, unknown fields are ignored"
            );
        }

        let workspace: WorkspaceDocument =
            serde_json::from_value(payload).map_err(|e| StoreError::Validation(e.to_string()))?;
        workspace.validate()?;
        Ok(workspace)
    }
}

impl WorkspaceStorage for JsonWorkspaceStorage {
    fn load(&self, path: &Path) -> Result<WorkspaceDocument, StoreError> {
        let file = File::open(path)?;
        let payload: Value =
            serde_json::from_reader(BufReader::new(file)).map_err(StoreError::from_json_read)?;
        let workspace = Self::from_value(payload)?;

        tracing::info!(
            path = %path.display(),
            collections = workspace.collections.len(),
            folders = workspace.folders.len(),
            requests = workspace.requests.len(),
            environments = workspace.environments.len(),
            "Workspace loaded"
        );
        Ok(workspace)
    }

    fn save(&self, path: &Path, workspace: &WorkspaceDocument) -> Result<(), StoreError> {
        workspace.validate()?;
        let contents = serde_json::to_vec_pretty(workspace)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        atomic_write(path, &contents)?;

        tracing::info!(path = %path.display(), bytes = contents.len(), "Workspace saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthConfig, BodyType, NetworkOptions, Pair, RequestSpec};
    use crate::storage::{load_workspace, save_workspace};
    use crate::workspace::{Collection, Environment, EnvironmentScope, Folder, StoredRequest};

    fn base_document() -> WorkspaceDocument {
        let mut doc = WorkspaceDocument::new(1);
        doc.collections.push(Collection {
            id: "c1".into(),
            name: "Users API".into(),
            description: String::new(),
        });
        doc.folders.push(Folder {
            id: "f1".into(),
            collection_id: "c1".into(),
            parent_id: None,
            name: "Users".into(),
            order: 0,
        });
        doc.requests.push(StoredRequest {
            id: "r1".into(),
            folder_id: "f1".into(),
            request: RequestSpec::new("List Users", "GET", "https://api.example.com/users"),
        });
        doc
    }

    #[test]
    fn test_round_trip_simple_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.json");
        let doc = base_document();

        save_workspace(&path, &doc).unwrap();
        assert_eq!(load_workspace(&path).unwrap(), doc);
    }

    #[test]
    fn test_round_trip_full_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.json");

        let mut doc = base_document();
        doc.updated_at = Some("2024-05-01T12:00:00+00:00".into());
        doc.collections[0].description = "All user endpoints".into();
        doc.folders.push(Folder {
            id: "f2".into(),
            collection_id: "c1".into(),
            parent_id: Some("f1".into()),
            name: "Uploads".into(),
            order: 3,
        });

        let mut upload = RequestSpec::new("Upload File", "POST", "https://{{host}}/upload");
        upload.body_type = BodyType::Multipart;
        upload.headers = vec![Pair::new("X-Dup", "1"), Pair::new("X-Dup", "2")];
        upload.params = vec![Pair::new("z", "last"), Pair::new("a", "first")];
        upload.form_fields = vec![
            Pair::new("username", "testuser"),
            Pair::new("description", "file upload"),
        ];
        upload.files = vec![Pair::new("document", "/path/to/file.txt")];
        upload.auth = AuthConfig::basic("me", "pw");
        upload.timeout_ms = 5000;
        upload.network = NetworkOptions {
            proxy_url: "http://proxy:3128".into(),
            verify_ssl: false,
            follow_redirects: true,
            trust_env: false,
        };
        doc.requests.push(StoredRequest {
            id: "r2".into(),
            folder_id: "f2".into(),
            request: upload,
        });

        doc.environments.push(Environment {
            scope: EnvironmentScope::Collection,
            owner_id: Some("c1".into()),
            variables: [("host".to_string(), "api.test.com".to_string())].into(),
        });
        doc.environments.push(Environment::default());

        save_workspace(&path, &doc).unwrap();
        let loaded = load_workspace(&path).unwrap();
        assert_eq!(loaded, doc);
        assert_eq!(loaded.requests[1].request.body, "");
    }

    #[test]
    fn test_pairs_are_stored_as_key_value_objects() {
        let mut doc = base_document();
        doc.requests[0].request.headers = vec![Pair::new("Accept", "text/plain")];

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value["requests"][0]["headers"],
            serde_json::json!([{"key": "Accept", "value": "text/plain"}])
        );
        assert_eq!(value["requests"][0]["auth"], serde_json::json!({"type": "none"}));
    }

    #[test]
    fn test_missing_optional_fields_get_defaults() {
        let payload = serde_json::json!({
            "schema_version": 1,
            "collections": [{"id": "c1", "name": "C"}],
            "folders": [{"id": "f1", "collection_id": "c1", "name": "F"}],
            "requests": [{"id": "r1", "folder_id": "f1", "name": "R", "method": "GET", "url": "http://x"}],
            "environments": [{"variables": {"k": "v"}}]
        });

        let doc = JsonWorkspaceStorage::from_value(payload).unwrap();
        assert_eq!(doc.collections[0].description, "");
        assert_eq!(doc.folders[0].parent_id, None);
        assert_eq!(doc.folders[0].order, 0);

        let request = &doc.requests[0].request;
        assert_eq!(request.timeout_ms, 10_000);
        assert_eq!(request.auth, AuthConfig::None);
        assert_eq!(request.network, NetworkOptions::default());
        assert_eq!(doc.environments[0].scope, EnvironmentScope::Global);
    }

    #[test]
    fn test_null_and_wrong_typed_optional_fields_degrade() {
        let payload = serde_json::json!({
            "schema_version": 1,
            "updated_at": null,
            "collections": [{"id": "c1", "name": "C", "description": null}],
            "folders": [{"id": "f1", "collection_id": "c1", "parent_id": null, "name": "F", "order": "2"}],
            "requests": [{
                "id": "r1", "folder_id": "f1", "name": "R", "method": "GET", "url": "http://x",
                "headers": [{"value": "no key"}, {"key": "Accept", "value": null}],
                "params": null,
                "body": null,
                "body_type": null,
                "auth": null,
                "timeout_ms": "5000",
                "network": null
            }],
            "environments": [{"scope": "request", "owner_id": "r1", "variables": {"port": 8080}}]
        });

        let doc = JsonWorkspaceStorage::from_value(payload).unwrap();
        assert_eq!(doc.updated_at, None);
        assert_eq!(doc.collections[0].description, "");
        assert_eq!(doc.folders[0].parent_id, None);
        assert_eq!(doc.folders[0].order, 2);

        let request = &doc.requests[0].request;
        assert_eq!(request.headers, vec![Pair::new("Accept", "")]);
        assert!(request.params.is_empty());
        assert_eq!(request.body, "");
        assert_eq!(request.body_type, BodyType::Raw);
        assert_eq!(request.auth, AuthConfig::None);
        assert_eq!(request.timeout_ms, 5000);
        assert_eq!(request.network, NetworkOptions::default());
        assert_eq!(doc.environments[0].variables["port"], "8080");
        assert_eq!(doc.variables_for("r1")["port"], "8080");
    }

    #[test]
    fn test_non_list_sections_read_as_empty() {
        let payload = serde_json::json!({
            "schema_version": 1,
            "collections": null,
            "folders": {"f1": {}},
            "requests": "none",
            "environments": 3
        });

        let doc = JsonWorkspaceStorage::from_value(payload).unwrap();
        assert_eq!(doc, WorkspaceDocument::new(1));
    }

    #[test]
    fn test_missing_required_field_is_validation_error() {
        let payload = serde_json::json!({
            "schema_version": 1,
            "collections": [{"name": "no id"}]
        });
        assert!(matches!(
            JsonWorkspaceStorage::from_value(payload),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_enum_values_degrade() {
        let payload = serde_json::json!({
            "schema_version": 1,
            "folders": [{"id": "f1", "collection_id": "c1", "name": "F"}],
            "requests": [{
                "id": "r1", "folder_id": "f1", "name": "R", "method": "GET", "url": "http://x",
                "auth": {"type": "oauth2", "token": "t"},
                "body_type": "graphql"
            }],
            "environments": [{"scope": "galaxy", "owner_id": "x", "variables": {}}]
        });

        let doc = JsonWorkspaceStorage::from_value(payload).unwrap();
        assert_eq!(doc.requests[0].request.auth, AuthConfig::None);
        assert_eq!(doc.requests[0].request.body_type, BodyType::Raw);
        assert_eq!(doc.environments[0].scope, EnvironmentScope::Global);
    }

    #[test]
    fn test_schema_version_must_be_integer() {
        for payload in [
            serde_json::json!({"schema_version": "1"}),
            serde_json::json!({"schema_version": 1.5}),
            serde_json::json!({}),
            serde_json::json!([1, 2]),
        ] {
            assert!(matches!(
                JsonWorkspaceStorage::from_value(payload),
                Err(StoreError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_malformed_file_is_validation_error_and_missing_file_is_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.json");
        std::fs::write(&path, "{\"schema_version\": 1, ").unwrap();
        assert!(matches!(load_workspace(&path), Err(StoreError::Validation(_))));

        let missing = dir.path().join("nope.json");
        assert!(matches!(load_workspace(&missing), Err(StoreError::Io(_))));
    }

    #[test]
    fn test_invalid_document_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.json");
        save_workspace(&path, &base_document()).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let mut broken = base_document();
        broken.requests[0].folder_id = "ghost".into();
        assert!(matches!(save_workspace(&path, &broken), Err(StoreError::Validation(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }
}
