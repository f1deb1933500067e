use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::constants::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::lenient;
use crate::messages::RequestOutcome;

/// Ordered key/value pair (headers, params, form fields, files).
///
/// Stored as `{"key": .., "value": ..}` so order and duplicates survive JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl Pair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Pair {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Request payload encoding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum BodyType {
    #[default]
    Raw,
    Multipart,
}

impl BodyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyType::Raw => "raw",
            BodyType::Multipart => "multipart",
        }
    }
}

impl From<String> for BodyType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "raw" => BodyType::Raw,
            "multipart" => BodyType::Multipart,
            other => {
                tracing::warn!(body_type = %other, "Unknown body type, using raw");
                BodyType::Raw
            }
        }
    }
}

impl From<BodyType> for String {
    fn from(value: BodyType) -> Self {
        value.as_str().to_string()
    }
}

impl<'de> Deserialize<'de> for BodyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(lenient::value_to_string(&value)
            .map(BodyType::from)
            .unwrap_or_default())
    }
}

/// Authentication attached to a request.
///
/// Unknown `type` strings, or anything that is not an object, degrade to
/// [`AuthConfig::None`] instead of failing the whole document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(into = "AuthRecord")]
pub enum AuthConfig {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
}

impl AuthConfig {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthConfig::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        AuthConfig::Bearer {
            token: token.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuthConfig::None => "none",
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::Bearer { .. } => "bearer",
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let kind = lenient::read_str(map, "type")
            .map(|k| k.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let field = |key| lenient::read_str(map, key).unwrap_or_default();

        match kind.as_str() {
            "none" | "" => AuthConfig::None,
            "basic" => AuthConfig::Basic {
                username: field("username"),
                password: field("password"),
            },
            "bearer" => AuthConfig::Bearer {
                token: field("token"),
            },
            other => {
                tracing::warn!(auth_type = %other, "Unknown auth type, using none");
                AuthConfig::None
            }
        }
    }
}

impl<'de> Deserialize<'de> for AuthConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_object()
            .map(AuthConfig::from_map)
            .unwrap_or_default())
    }
}

/// On-disk shape of [`AuthConfig`]
#[derive(Clone, Debug, Default, Serialize)]
struct AuthRecord {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

impl From<AuthConfig> for AuthRecord {
    fn from(auth: AuthConfig) -> Self {
        let kind = Some(auth.kind().to_string());
        match auth {
            AuthConfig::None => AuthRecord {
                kind,
                ..AuthRecord::default()
            },
            AuthConfig::Basic { username, password } => AuthRecord {
                kind,
                username: Some(username),
                password: Some(password),
                token: None,
            },
            AuthConfig::Bearer { token } => AuthRecord {
                kind,
                token: Some(token),
                ..AuthRecord::default()
            },
        }
    }
}

/// Per-request transport options
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetworkOptions {
    pub proxy_url: String,
    pub verify_ssl: bool,
    pub follow_redirects: bool,
    pub trust_env: bool,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        NetworkOptions {
            proxy_url: String::new(),
            verify_ssl: true,
            follow_redirects: false,
            trust_env: true,
        }
    }
}

impl<'de> Deserialize<'de> for NetworkOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Value::Object(map) = Value::deserialize(deserializer)? else {
            return Ok(NetworkOptions::default());
        };
        Ok(NetworkOptions {
            proxy_url: lenient::read_str(&map, "proxy_url")
                .map(|url| url.trim().to_string())
                .unwrap_or_default(),
            verify_ssl: lenient::read_bool(&map, "verify_ssl", true),
            follow_redirects: lenient::read_bool(&map, "follow_redirects", false),
            trust_env: lenient::read_bool(&map, "trust_env", true),
        })
    }
}

fn default_timeout_ms() -> i64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// A single HTTP request, before or after variable substitution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    #[serde(deserialize_with = "lenient::required_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::required_string")]
    pub method: String,
    #[serde(deserialize_with = "lenient::required_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient::pairs")]
    pub headers: Vec<Pair>,
    #[serde(default, deserialize_with = "lenient::pairs")]
    pub params: Vec<Pair>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub body: String,
    #[serde(default)]
    pub body_type: BodyType,
    #[serde(default, deserialize_with = "lenient::pairs")]
    pub form_fields: Vec<Pair>,
    #[serde(default, deserialize_with = "lenient::pairs")]
    pub files: Vec<Pair>,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Values `<= 0` fall back to the executor's default
    #[serde(default = "default_timeout_ms", deserialize_with = "lenient::timeout")]
    pub timeout_ms: i64,
    #[serde(default)]
    pub network: NetworkOptions,
}

impl RequestSpec {
    pub fn new(name: impl Into<String>, method: impl Into<String>, url: impl Into<String>) -> Self {
        RequestSpec {
            name: name.into(),
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
            body: String::new(),
            body_type: BodyType::Raw,
            form_fields: Vec::new(),
            files: Vec::new(),
            auth: AuthConfig::None,
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            network: NetworkOptions::default(),
        }
    }
}

/// Response from HTTP request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseData {
    pub status_code: u16,
    /// In the order the server sent them
    pub headers: Vec<Pair>,
    pub body: String,
    pub elapsed_ms: u64,
}

/// One line of the history log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryEntry {
    /// Record the terminal outcome of sending `request`, stamped now.
    pub fn from_outcome(request: &RequestSpec, outcome: &RequestOutcome) -> Self {
        let mut entry = HistoryEntry {
            timestamp: Utc::now(),
            name: request.name.clone(),
            method: request.method.clone(),
            url: request.url.clone(),
            status_code: None,
            elapsed_ms: None,
            error: None,
        };

        match outcome {
            RequestOutcome::Completed(response) => {
                entry.status_code = Some(response.status_code);
                entry.elapsed_ms = Some(response.elapsed_ms);
            }
            RequestOutcome::Failed(message) => entry.error = Some(message.clone()),
            RequestOutcome::Canceled => entry.error = Some(RequestOutcome::CANCELED_MESSAGE.to_string()),
        }

        entry
    }
}
