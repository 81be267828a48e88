use crate::config::{AiFunctionConfig, ApiKey};
use crate::endpoint::{is_endpoint_supported, is_endpoint_valid};
use crate::error::{GenerateError, Result};
use crate::secrets::SecretResolver;
use serde_json::{Map, Value, json};
use std::fmt;

const CONTENT_TYPE_JSON: &str = "application/json";
const MESSAGES_FIELD: &str = "messages";
const MODEL_FIELD: &str = "model";

/// Per-call arguments of `ai_generate_text`. `None` and empty strings both
/// mean "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateTextParams {
    pub endpoint: Option<String>,
    pub prompt: Option<String>,
    pub model: Option<String>,
    /// Keystore name of the API key to use instead of the default key.
    pub api_key_secret: Option<String>,
    /// JSON object text merged into the request payload.
    pub params: Option<String>,
}

impl GenerateTextParams {
    pub fn prompt_only(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// A fully assembled POST, ready for the transport or a dry-run rendering.
#[derive(Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub endpoint: String,
    pub headers: Vec<Header>,
    pub payload: String,
}

impl PreparedRequest {
    /// Endpoint line, one line per header, then the payload.
    pub fn render(&self) -> String {
        let mut out = self.endpoint.clone();
        for header in &self.headers {
            out.push('\n');
            out.push_str(&header.to_string());
        }
        out.push('\n');
        out.push_str(&self.payload);
        out
    }
}

// Headers carry the bearer token.
impl fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("endpoint", &self.endpoint)
            .field("headers", &self.headers.len())
            .field("payload", &self.payload)
            .finish()
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

pub(crate) async fn build_request(
    cfg: &AiFunctionConfig,
    default_api_key: &ApiKey,
    secrets: &dyn SecretResolver,
    params: &GenerateTextParams,
) -> Result<PreparedRequest> {
    let endpoint = resolve_endpoint(cfg, non_empty(&params.endpoint))?;

    let api_key = match non_empty(&params.api_key_secret) {
        Some(name) => secrets.resolve(name).await?,
        None => default_api_key.expose().to_string(),
    };
    let headers = vec![
        Header::new("Content-Type", CONTENT_TYPE_JSON),
        Header::new("Authorization", format!("Bearer {api_key}")),
    ];

    let Some(prompt) = non_empty(&params.prompt) else {
        return Err(GenerateError::InvalidPrompt);
    };
    let model = non_empty(&params.model).unwrap_or(cfg.model.as_str());
    let mut payload = base_payload(model, prompt);

    if let Some(overrides) = non_empty(&params.params) {
        merge_overrides(&mut payload, overrides)?;
    }

    let payload = serde_json::to_string(&Value::Object(payload))?;
    tracing::debug!(endpoint = %endpoint, payload = %payload, "ai_generate_text request built");

    Ok(PreparedRequest {
        endpoint,
        headers,
        payload,
    })
}

/// A supplied endpoint must pass the scheme check and then the host check;
/// the configured default is trusted as-is.
fn resolve_endpoint(cfg: &AiFunctionConfig, supplied: Option<&str>) -> Result<String> {
    let Some(endpoint) = supplied else {
        return Ok(cfg.endpoint.clone());
    };
    if !is_endpoint_valid(endpoint) {
        return Err(GenerateError::InvalidProtocol);
    }
    if !is_endpoint_supported(endpoint) {
        return Err(GenerateError::UnsupportedEndpoint);
    }
    Ok(endpoint.to_string())
}

fn base_payload(model: &str, prompt: &str) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(MODEL_FIELD.to_string(), Value::String(model.to_string()));
    payload.insert(
        MESSAGES_FIELD.to_string(),
        json!([{ "role": "user", "content": prompt }]),
    );
    payload
}

/// Merges the top-level members of `overrides` into `payload` in document
/// order. Existing members are replaced in place, new ones appended. Members
/// merged before a `messages` key is seen stay merged; the caller drops the
/// payload on error.
fn merge_overrides(payload: &mut Map<String, Value>, overrides: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(overrides).map_err(|e| {
        tracing::debug!(
            line = e.line(),
            column = e.column(),
            error = %e,
            "{}",
            GenerateError::InvalidJson
        );
        GenerateError::InvalidJson
    })?;
    let Value::Object(members) = parsed else {
        tracing::debug!("{}: overrides must be a JSON object", GenerateError::InvalidJson);
        return Err(GenerateError::InvalidJson);
    };

    for (name, value) in members {
        if name == MESSAGES_FIELD {
            tracing::debug!("'messages' is constructed from 'prompt', cannot be overridden");
            return Err(GenerateError::MessagesOverrideForbidden);
        }
        payload.insert(name, value);
    }
    Ok(())
}
