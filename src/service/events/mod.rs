//! Release event fan-out between the webhook ingress and publishers.
//!
//! Publishing is fire-and-forget: `publish` returns as soon as the event is
//! queued, and each subscriber is invoked once per delivery. Delivery is
//! at-least-once in spirit, so subscribers must tolerate seeing the same
//! release twice. No ordering between events is guaranteed.

pub mod in_process;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{ReleaseEvent, Void};

// Traits.

/// Handles one delivered release event.
///
/// Any number of handlers can subscribe to the same channel without the
/// channel knowing their concrete type.
#[async_trait]
pub trait ReleaseHandler: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Process a single release.
    async fn handle(&self, release: &ReleaseEvent) -> Void;
}

/// Generic event channel trait that implementations must provide.
pub trait GenericEventChannel: Send + Sync + 'static {
    /// Queue a serialized webhook payload for delivery to every subscriber.
    ///
    /// Returns without waiting for any subscriber to run.
    fn publish(&self, payload: String) -> Void;

    /// Register a handler for all subsequently published events.
    fn subscribe(&self, handler: Arc<dyn ReleaseHandler>);
}

// Structs.

/// Event channel for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct EventChannel {
    inner: Arc<dyn GenericEventChannel>,
}

impl Deref for EventChannel {
    type Target = dyn GenericEventChannel;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl EventChannel {
    pub fn new(inner: Arc<dyn GenericEventChannel>) -> Self {
        Self { inner }
    }
}
