//! HTTP client wrapper - prepares rendered requests and executes them

use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::{Method, Proxy};

use crate::constants::{DEFAULT_USER_AGENT, MAX_REDIRECTS};
use crate::error::ExecError;
use crate::models::{AuthConfig, BodyType, NetworkOptions, Pair, RequestSpec, ResponseData};

/// Payload after body-type resolution
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreparedBody {
    Empty,
    Raw(String),
    Multipart { fields: Vec<Pair>, files: Vec<Pair> },
}

/// A rendered request with headers, auth and body resolved, ready to issue
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: String,
    pub url: String,
    pub timeout_ms: u64,
    pub headers: Vec<Pair>,
    pub params: Vec<Pair>,
    pub basic_auth: Option<(String, String)>,
    pub body: PreparedBody,
    pub network: NetworkOptions,
}

/// Trim keys and values, dropping pairs whose key ends up empty
fn normalize_pairs(pairs: &[Pair]) -> Vec<Pair> {
    pairs
        .iter()
        .filter_map(|pair| {
            let key = pair.key.trim();
            if key.is_empty() {
                None
            } else {
                Some(Pair::new(key, pair.value.trim()))
            }
        })
        .collect()
}

fn has_header(headers: &[Pair], name: &str) -> bool {
    headers.iter().any(|h| h.key.eq_ignore_ascii_case(name))
}

/// Resolve timeout, headers, auth and body for a rendered request.
///
/// Steps run in a fixed order: the multipart `Content-Type` strip happens
/// before auth so a bearer header is never affected by it.
pub fn prepare_request(request: &RequestSpec, default_timeout_ms: u64) -> PreparedRequest {
    let timeout_ms = if request.timeout_ms > 0 {
        request.timeout_ms as u64
    } else {
        default_timeout_ms
    };

    let mut headers = normalize_pairs(&request.headers);
    let params = normalize_pairs(&request.params);

    if !has_header(&headers, "user-agent") {
        headers.push(Pair::new("User-Agent", DEFAULT_USER_AGENT));
    }

    if request.body_type == BodyType::Multipart {
        let before = headers.len();
        headers.retain(|h| !h.key.eq_ignore_ascii_case("content-type"));
        if headers.len() < before {
            tracing::debug!("Removed explicit Content-Type header for multipart request");
        }
    }

    let mut basic_auth = None;
    match &request.auth {
        AuthConfig::None => {}
        AuthConfig::Basic { username, password } => {
            basic_auth = Some((username.clone(), password.clone()));
        }
        AuthConfig::Bearer { token } => {
            let token = token.trim();
            if !token.is_empty() {
                headers.push(Pair::new("Authorization", format!("Bearer {}", token)));
            }
        }
    }

    let body = match request.body_type {
        BodyType::Multipart => PreparedBody::Multipart {
            fields: request.form_fields.clone(),
            files: request.files.clone(),
        },
        BodyType::Raw if request.body.trim().is_empty() => PreparedBody::Empty,
        BodyType::Raw => PreparedBody::Raw(request.body.clone()),
    };

    PreparedRequest {
        method: request.method.clone(),
        url: request.url.clone(),
        timeout_ms,
        headers,
        params,
        basic_auth,
        body,
        network: request.network.clone(),
    }
}

/// Create an HTTP client honoring the request's network options
pub fn create_client(network: &NetworkOptions) -> Result<reqwest::Client, ExecError> {
    let redirect = if network.follow_redirects {
        Policy::limited(MAX_REDIRECTS)
    } else {
        Policy::none()
    };

    let mut builder = reqwest::Client::builder()
        .redirect(redirect)
        .danger_accept_invalid_certs(!network.verify_ssl);

    let proxy_url = network.proxy_url.trim();
    if !proxy_url.is_empty() {
        let proxy = Proxy::all(proxy_url).map_err(|source| ExecError::InvalidProxy {
            url: proxy_url.to_string(),
            source,
        })?;
        builder = builder.proxy(proxy);
    } else if !network.trust_env {
        builder = builder.no_proxy();
    }

    builder.build().map_err(ExecError::ClientBuild)
}

/// Build the multipart form; unreadable files are logged and skipped
async fn build_form(fields: &[Pair], files: &[Pair]) -> Form {
    let mut form = Form::new();

    for file in files {
        let path_str = file.value.trim();
        if path_str.is_empty() {
            continue;
        }

        match tokio::fs::read(path_str).await {
            Ok(content) => {
                let file_name = Path::new(path_str)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path_str.to_string());
                form = form.part(file.key.clone(), Part::bytes(content).file_name(file_name));
            }
            Err(e) => {
                tracing::warn!(field = %file.key, path = %path_str, error = %e, "Failed to open file, skipping part");
            }
        }
    }

    for field in fields {
        form = form.text(field.key.clone(), field.value.clone());
    }

    form
}

/// Build a request from the prepared parameters
async fn build_request(
    client: &reqwest::Client,
    prepared: &PreparedRequest,
) -> Result<reqwest::RequestBuilder, ExecError> {
    let method_name = prepared.method.trim().to_ascii_uppercase();
    let method = Method::from_bytes(method_name.as_bytes())
        .map_err(|_| ExecError::InvalidMethod(prepared.method.clone()))?;

    let mut req_builder = client
        .request(method, &prepared.url)
        .timeout(Duration::from_millis(prepared.timeout_ms));

    if !prepared.params.is_empty() {
        let params: Vec<(&str, &str)> = prepared
            .params
            .iter()
            .map(|p| (p.key.as_str(), p.value.as_str()))
            .collect();
        req_builder = req_builder.query(&params);
    }

    for header in &prepared.headers {
        req_builder = req_builder.header(header.key.as_str(), header.value.as_str());
    }

    if let Some((username, password)) = &prepared.basic_auth {
        req_builder = req_builder.basic_auth(username, Some(password));
    }

    match &prepared.body {
        PreparedBody::Empty => {}
        PreparedBody::Raw(body) => {
            req_builder = req_builder.body(body.clone());
        }
        PreparedBody::Multipart { fields, files } => {
            req_builder = req_builder.multipart(build_form(fields, files).await);
        }
    }

    Ok(req_builder)
}

/// Execute a prepared request and collect the full response
pub async fn execute_request(prepared: PreparedRequest) -> Result<ResponseData, ExecError> {
    let client = create_client(&prepared.network)?;
    let req_builder = build_request(&client, &prepared).await?;

    tracing::debug!(
        method = %prepared.method,
        url = %prepared.url,
        params = ?prepared.params,
        headers = prepared.headers.len(),
        timeout_ms = prepared.timeout_ms,
        "Request details"
    );

    let start = Instant::now();
    let resp = req_builder
        .send()
        .await
        .map_err(|e| ExecError::from_send(e, prepared.timeout_ms))?;

    let status_code = resp.status().as_u16();
    let headers = resp
        .headers()
        .iter()
        .map(|(name, value)| {
            Pair::new(name.as_str(), String::from_utf8_lossy(value.as_bytes()))
        })
        .collect();

    let body = resp.text().await.map_err(|e| {
        if e.is_timeout() {
            ExecError::Timeout(prepared.timeout_ms)
        } else {
            ExecError::Body(e)
        }
    })?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    Ok(ResponseData {
        status_code,
        headers,
        body,
        elapsed_ms,
    })
}
