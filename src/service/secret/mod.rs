//! Secret resolution for outbound credentials.
//!
//! Secrets are looked up by reference every time they are needed, so a rotated
//! token is picked up without a restart.

pub mod env;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use secrecy::SecretString;

use crate::base::types::Res;

// Traits.

/// Generic secret store trait that clients must implement.
#[async_trait]
pub trait GenericSecretStore: Send + Sync + 'static {
    /// Resolve the secret named by `reference`.
    ///
    /// Fails if the secret is unavailable or empty.
    async fn resolve(&self, reference: &str) -> Res<SecretString>;
}

// Structs.

/// Secret store for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct SecretStore {
    inner: Arc<dyn GenericSecretStore>,
}

impl Deref for SecretStore {
    type Target = dyn GenericSecretStore;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl SecretStore {
    pub fn new(inner: Arc<dyn GenericSecretStore>) -> Self {
        Self { inner }
    }
}
