//! Process environment backed secret store.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::base::types::Res;

use super::{GenericSecretStore, SecretStore};

impl SecretStore {
    /// Creates a secret store that reads secrets from environment variables.
    pub fn env() -> Self {
        Self::new(Arc::new(EnvSecretStore))
    }
}

/// Resolves a secret reference as the name of an environment variable.
struct EnvSecretStore;

#[async_trait]
impl GenericSecretStore for EnvSecretStore {
    async fn resolve(&self, reference: &str) -> Res<SecretString> {
        let value = std::env::var(reference).map_err(|e| anyhow::anyhow!("Secret `{}` is unavailable: {}", reference, e))?;

        if value.is_empty() {
            return Err(anyhow::anyhow!("Secret `{}` is empty.", reference));
        }

        Ok(SecretString::from(value))
    }
}

// Tests.
