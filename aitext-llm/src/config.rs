use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_CONNECTION_TIMEOUT_S: u64 = 10;

/// Process-wide defaults for `ai_generate_text`.
///
/// Read-only once the generator is built; per-call parameters override the
/// endpoint and model, never this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiFunctionConfig {
    /// Default API endpoint. Not re-validated at call time.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub model: String,
    /// Keystore name of the default API key, resolved once at startup.
    #[serde(default)]
    pub api_key_secret: Option<String>,
    #[serde(default = "default_connection_timeout_s")]
    pub connection_timeout_s: u64,
}

fn default_connection_timeout_s() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_S
}

impl Default for AiFunctionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            model: String::new(),
            api_key_secret: None,
            connection_timeout_s: default_connection_timeout_s(),
        }
    }
}

impl AiFunctionConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_s)
    }
}

/// Bearer token for the external API. `Debug` never prints the value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("ApiKey(<unset>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}
