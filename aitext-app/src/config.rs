//! aitext configuration loader.

use aitext_llm::{AiFunctionConfig, is_endpoint_supported, is_endpoint_valid};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ai: AiFunctionConfig,
    #[serde(default)]
    pub keystore: KeystoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeystoreConfig {
    /// Secret name -> value.
    #[serde(default)]
    pub secrets: HashMap<String, String>,
    /// Environment variables with this prefix are consulted when a name is
    /// missing from `secrets`. Empty disables the fallback.
    #[serde(default = "default_keystore_env_prefix")]
    pub env_prefix: String,
}

fn default_keystore_env_prefix() -> String {
    "AITEXT_SECRET_".to_string()
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            secrets: HashMap::new(),
            env_prefix: default_keystore_env_prefix(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, or `~/.aitext/config.toml` when no path is given. A
    /// missing default file yields the built-in defaults; a missing explicit
    /// file is an error.
    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let explicit = path.is_some();
        let path = path.unwrap_or_else(default_config_path);

        let mut cfg = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Self::parse(&contents)
                .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                Self::default()
            }
            Err(e) => return Err(anyhow::anyhow!("read config {}: {e}", path.display())),
        };

        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `AITEXT_*` overrides; blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AITEXT_ENDPOINT") {
            self.ai.endpoint = v;
        }
        if let Some(v) = get("AITEXT_MODEL") {
            self.ai.model = v;
        }
        if let Some(v) = get("AITEXT_API_KEY_SECRET") {
            self.ai.api_key_secret = Some(v);
        }
        if let Some(v) = get("AITEXT_CONNECTION_TIMEOUT_S") {
            self.ai.connection_timeout_s = v.trim().parse().map_err(|e| {
                anyhow::anyhow!("AITEXT_CONNECTION_TIMEOUT_S={v:?} is not a number of seconds: {e}")
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ai.connection_timeout_s == 0 {
            return Err(anyhow::anyhow!("ai.connection_timeout_s must be > 0"));
        }
        if let Some(warning) = self.endpoint_warning() {
            tracing::warn!(endpoint = %self.ai.endpoint, "{warning}");
        }
        if self
            .ai
            .api_key_secret
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(anyhow::anyhow!("ai.api_key_secret must not be blank"));
        }
        Ok(())
    }

    /// Describes why the configured default endpoint would be refused if a
    /// caller passed it explicitly. The default itself is used as-is.
    pub fn endpoint_warning(&self) -> Option<String> {
        let endpoint = self.ai.endpoint.trim();
        if endpoint.is_empty() {
            None
        } else if !is_endpoint_valid(endpoint) {
            Some(format!("ai.endpoint {endpoint:?} does not use https://"))
        } else if !is_endpoint_supported(endpoint) {
            Some(format!("ai.endpoint {endpoint:?} is not a known OpenAI endpoint"))
        } else {
            None
        }
    }
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".aitext").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_config(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("aitext-config-{name}-{}.toml", Uuid::new_v4()))
    }

    const FULL_CONFIG: &str = r#"
[ai]
endpoint = "https://api.openai.com/v1/chat/completions"
model = "gpt-4o-mini"
api_key_secret = "openai-key"
connection_timeout_s = 30

[keystore]
env_prefix = "MY_SECRETS_"

[keystore.secrets]
openai-key = "sk-abc"
"#;

    #[test]
    fn parses_full_config() {
        let cfg = AppConfig::parse(FULL_CONFIG).expect("config parses");
        assert_eq!(cfg.ai.endpoint, "https://api.openai.com/v1/chat/completions");
        assert_eq!(cfg.ai.model, "gpt-4o-mini");
        assert_eq!(cfg.ai.api_key_secret.as_deref(), Some("openai-key"));
        assert_eq!(cfg.ai.connection_timeout_s, 30);
        assert_eq!(cfg.keystore.env_prefix, "MY_SECRETS_");
        assert_eq!(
            cfg.keystore.secrets.get("openai-key").map(String::as_str),
            Some("sk-abc")
        );
        cfg.validate().expect("full config is valid");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = AppConfig::parse("").expect("empty config parses");
        assert_eq!(cfg.ai.connection_timeout_s, 10);
        assert!(cfg.ai.endpoint.is_empty());
        assert_eq!(cfg.keystore.env_prefix, "AITEXT_SECRET_");
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn env_overrides_win_and_blank_values_are_ignored() {
        let mut cfg = AppConfig::parse(FULL_CONFIG).expect("config parses");
        let env = HashMap::from([
            ("AITEXT_MODEL", "gpt-4o"),
            ("AITEXT_ENDPOINT", "   "),
            ("AITEXT_CONNECTION_TIMEOUT_S", " 5 "),
        ]);
        cfg.apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .expect("overrides apply");

        assert_eq!(cfg.ai.model, "gpt-4o");
        assert_eq!(cfg.ai.endpoint, "https://api.openai.com/v1/chat/completions");
        assert_eq!(cfg.ai.connection_timeout_s, 5);
    }

    #[test]
    fn non_numeric_timeout_override_is_rejected() {
        let mut cfg = AppConfig::default();
        let err = cfg
            .apply_overrides(|key| {
                (key == "AITEXT_CONNECTION_TIMEOUT_S").then(|| "soon".to_string())
            })
            .expect_err("timeout must be numeric");
        assert!(err.to_string().contains("AITEXT_CONNECTION_TIMEOUT_S"));
    }

    #[test]
    fn validate_accepts_any_default_endpoint_but_not_zero_timeout() {
        let mut cfg = AppConfig::default();
        cfg.ai.endpoint = "http://localhost:8080/v1/chat/completions".to_string();
        cfg.validate().expect("plain http default is accepted");
        assert_eq!(
            cfg.endpoint_warning().as_deref(),
            Some(r#"ai.endpoint "http://localhost:8080/v1/chat/completions" does not use https://"#)
        );

        cfg.ai.endpoint = "https://llm.example.com/v1/chat/completions".to_string();
        cfg.validate().expect("unknown host default is accepted");
        assert!(
            cfg.endpoint_warning()
                .is_some_and(|w| w.ends_with("is not a known OpenAI endpoint"))
        );

        cfg.ai.endpoint = "https://acme.openai.azure.com/openai".to_string();
        cfg.validate().expect("azure endpoint is valid");
        assert_eq!(cfg.endpoint_warning(), None);

        cfg.ai.connection_timeout_s = 0;
        assert!(cfg.validate().is_err());
    }

    #[tokio::test]
    async fn load_reads_explicit_path() {
        let path = temp_config("explicit");
        tokio::fs::write(&path, FULL_CONFIG)
            .await
            .expect("write config");

        let cfg = AppConfig::load(Some(path.clone()))
            .await
            .expect("config loads");
        assert_eq!(cfg.ai.api_key_secret.as_deref(), Some("openai-key"));

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn load_fails_for_missing_explicit_path() {
        let path = temp_config("missing");
        let err = AppConfig::load(Some(path))
            .await
            .expect_err("missing explicit config is an error");
        assert!(err.to_string().starts_with("read config"));
    }
}
