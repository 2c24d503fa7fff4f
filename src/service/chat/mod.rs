//! Chat service integration for release-relay.
//!
//! It defines the `GenericChatClient` trait that can be implemented for different
//! chat services, with a default implementation for Slack.

pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{ChatMessage, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the core functionality for posting to chat platforms
/// like Slack. Implementing this trait allows different chat services to be used
/// with release-relay.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Post a message to the channel it is addressed to.
    ///
    /// Implementations resolve credentials for every call, and report any
    /// delivery failure (transport or API level) as an error.
    async fn post_message(&self, message: &ChatMessage) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
