//! File/env backed keystore used to resolve API key secrets by name.

use crate::config::KeystoreConfig;
use aitext_llm::{SecretError, SecretResolver};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Clone)]
pub struct KeystoreSecretResolver {
    secrets: HashMap<String, String>,
    env_prefix: String,
    env: HashMap<String, String>,
}

impl KeystoreSecretResolver {
    /// Snapshots the prefixed environment variables at construction; the
    /// keystore is not reloaded afterwards.
    pub fn from_config(cfg: &KeystoreConfig) -> Self {
        Self::with_env(cfg, std::env::vars())
    }

    pub fn with_env<I>(cfg: &KeystoreConfig, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env = if cfg.env_prefix.is_empty() {
            HashMap::new()
        } else {
            vars.into_iter()
                .filter(|(key, _)| key.starts_with(&cfg.env_prefix))
                .collect()
        };
        Self {
            secrets: cfg.secrets.clone(),
            env_prefix: cfg.env_prefix.clone(),
            env,
        }
    }

    fn env_key(&self, name: &str) -> String {
        let mut key = self.env_prefix.clone();
        for ch in name.chars() {
            match ch {
                '-' | '.' => key.push('_'),
                c => key.push(c.to_ascii_uppercase()),
            }
        }
        key
    }
}

#[async_trait]
impl SecretResolver for KeystoreSecretResolver {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn resolve(&self, name: &str) -> Result<String, SecretError> {
        if name.trim().is_empty() {
            return Err(SecretError::InvalidName(name.to_string()));
        }
        let from_file = self.secrets.get(name);
        let from_env = || {
            if self.env_prefix.is_empty() {
                None
            } else {
                self.env.get(&self.env_key(name))
            }
        };
        match from_file.or_else(from_env) {
            Some(value) if !value.trim().is_empty() => Ok(value.clone()),
            _ => Err(SecretError::NotFound(name.to_string())),
        }
    }
}

impl std::fmt::Debug for KeystoreSecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.secrets.keys().collect();
        names.sort();
        f.debug_struct("KeystoreSecretResolver")
            .field("secrets", &names)
            .field("env_prefix", &self.env_prefix)
            .field("env_entries", &self.env.len())
            .finish()
    }
}
