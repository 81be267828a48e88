use crate::config::{AiFunctionConfig, ApiKey};
use crate::error::Result;
use crate::request::{GenerateTextParams, build_request};
use crate::response::extract_content;
use crate::secrets::SecretResolver;
use crate::transport::Transport;
use std::sync::Arc;

/// The `ai_generate_text` function.
///
/// Built once at startup, given its default API key, then shared immutably
/// (e.g. behind an `Arc`) by every worker that evaluates the function.
#[derive(Clone)]
pub struct AiTextGenerator {
    config: AiFunctionConfig,
    api_key: ApiKey,
    secrets: Arc<dyn SecretResolver>,
    transport: Arc<dyn Transport>,
}

impl AiTextGenerator {
    pub fn new(
        config: AiFunctionConfig,
        secrets: Arc<dyn SecretResolver>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            api_key: ApiKey::default(),
            secrets,
            transport,
        }
    }

    pub fn config(&self) -> &AiFunctionConfig {
        &self.config
    }

    /// Installs the API key used when a call names no keystore secret.
    pub fn set_api_key(&mut self, api_key: ApiKey) {
        self.api_key = api_key;
    }

    pub fn api_key_is_set(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Full-argument form. Always returns text: the generated content or an
    /// error string.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn generate_text(&self, params: &GenerateTextParams) -> String {
        outcome(self.generate_text_internal(params, false).await)
    }

    /// Prompt-only form; endpoint, model and key come from the defaults.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn generate_text_default(&self, prompt: Option<&str>) -> String {
        let params = GenerateTextParams {
            prompt: prompt.map(str::to_string),
            ..GenerateTextParams::default()
        };
        outcome(self.generate_text_internal(&params, false).await)
    }

    /// Same behaviour as [`Self::generate_text_default`], registered under a
    /// separate name for isolated testing.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn generate_text_dummy(&self, prompt: Option<&str>) -> String {
        self.generate_text_default(prompt).await
    }

    /// Renders the request `generate_text` would send, or the error string.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn generate_text_dry_run(&self, params: &GenerateTextParams) -> String {
        outcome(self.generate_text_internal(params, true).await)
    }

    /// Builds the request and, unless `dry_run` is set, performs it.
    ///
    /// With `dry_run` the rendered request (endpoint, headers, payload) is
    /// returned instead and no network call is made.
    pub async fn generate_text_internal(
        &self,
        params: &GenerateTextParams,
        dry_run: bool,
    ) -> Result<String> {
        let request =
            build_request(&self.config, &self.api_key, self.secrets.as_ref(), params).await?;
        if dry_run {
            return Ok(request.render());
        }

        let body = self
            .transport
            .post(
                &request.endpoint,
                request.payload,
                &request.headers,
                self.config.connection_timeout(),
            )
            .await?;
        tracing::debug!(
            response = %String::from_utf8_lossy(&body),
            "ai_generate_text raw response"
        );

        let content = extract_content(&body)?;
        tracing::debug!(response = %content, "ai_generate_text response");
        Ok(content)
    }
}

fn outcome(result: Result<String>) -> String {
    match result {
        Ok(content) => content,
        Err(e) => {
            if e.is_caller_error() {
                tracing::warn!(error = %e, "ai_generate_text failed");
            } else {
                tracing::error!(error = %e, "ai_generate_text failed");
            }
            e.to_string()
        }
    }
}

impl std::fmt::Debug for AiTextGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiTextGenerator")
            .field("config", &self.config)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}
