//! Administrative startup step: install the default API key before the
//! generator starts serving calls.

use aitext_llm::{AiTextGenerator, ApiKey, SecretResolver};

pub const OPERATOR_API_KEY_ENV: &str = "AITEXT_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultKeySource {
    Operator,
    Keystore(String),
    Unset,
}

/// Installs the default key from, in order: the operator override, the
/// keystore secret named by `ai.api_key_secret`. A named secret that cannot
/// be resolved is a startup error.
pub async fn install_default_api_key(
    generator: &mut AiTextGenerator,
    resolver: &dyn SecretResolver,
    operator_key: Option<String>,
) -> anyhow::Result<DefaultKeySource> {
    if let Some(key) = operator_key.filter(|k| !k.trim().is_empty()) {
        generator.set_api_key(ApiKey::new(key));
        tracing::info!(source = "operator", "default api key installed");
        return Ok(DefaultKeySource::Operator);
    }

    let Some(name) = generator.config().api_key_secret.clone() else {
        tracing::warn!("no default api key configured; calls without api_key_secret will send an empty bearer token");
        return Ok(DefaultKeySource::Unset);
    };

    let key = resolver
        .resolve(&name)
        .await
        .map_err(|e| anyhow::anyhow!("resolve ai.api_key_secret {name:?}: {e}"))?;
    generator.set_api_key(ApiKey::new(key));
    tracing::info!(source = "keystore", secret = %name, "default api key installed");
    Ok(DefaultKeySource::Keystore(name))
}
