use crate::error::SecretError;
use async_trait::async_trait;

/// Resolves a named secret to its value, e.g. an API key held in a keystore.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<String, SecretError>;
}
