//! `{{variable}}` substitution over request fields.
//!
//! Rendering is single-pass: substituted values are never scanned again, and
//! placeholders without a matching variable are left exactly as written.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::models::{AuthConfig, NetworkOptions, Pair, RequestSpec};

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Substitutes `{{key}}` patterns in text
pub fn render_text(text: &str, variables: &HashMap<String, String>) -> String {
    if text.is_empty() || variables.is_empty() {
        return text.to_string();
    }

    placeholder_pattern()
        .replace_all(text, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

pub fn render_pairs(pairs: &[Pair], variables: &HashMap<String, String>) -> Vec<Pair> {
    pairs
        .iter()
        .map(|pair| Pair::new(render_text(&pair.key, variables), render_text(&pair.value, variables)))
        .collect()
}

fn render_auth(auth: &AuthConfig, variables: &HashMap<String, String>) -> AuthConfig {
    match auth {
        AuthConfig::None => AuthConfig::None,
        AuthConfig::Basic { username, password } => {
            AuthConfig::basic(render_text(username, variables), render_text(password, variables))
        }
        AuthConfig::Bearer { token } => AuthConfig::bearer(render_text(token, variables)),
    }
}

fn render_network(network: &NetworkOptions, variables: &HashMap<String, String>) -> NetworkOptions {
    NetworkOptions {
        proxy_url: render_text(&network.proxy_url, variables),
        ..network.clone()
    }
}

/// Render every templated field of `request`.
///
/// Name, method, body type, timeout and the boolean network flags are copied
/// through untouched.
pub fn render_request(request: &RequestSpec, variables: &HashMap<String, String>) -> RequestSpec {
    if variables.is_empty() {
        return request.clone();
    }

    RequestSpec {
        name: request.name.clone(),
        method: request.method.clone(),
        url: render_text(&request.url, variables),
        headers: render_pairs(&request.headers, variables),
        params: render_pairs(&request.params, variables),
        body: render_text(&request.body, variables),
        body_type: request.body_type,
        form_fields: render_pairs(&request.form_fields, variables),
        files: render_pairs(&request.files, variables),
        auth: render_auth(&request.auth, variables),
        timeout_ms: request.timeout_ms,
        network: render_network(&request.network, variables),
    }
}
