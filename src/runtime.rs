//! Runtime services and shared state for release-relay.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::{
    base::{config::Config, types::{Res, Void}},
    interaction::{
        ingress::{self, IngressState},
        release::SlackReleasePublisher,
    },
    service::{chat::ChatClient, events::EventChannel, forward::WebhookForwarder, secret::SecretStore},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the chat client, event channel, and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The chat client instance.
    pub chat: ChatClient,
    /// The release event channel.
    pub events: EventChannel,
}

impl Runtime {
    /// Create a new runtime instance backed by Slack and an in-process event channel.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<Self> {
        // Initialize the chat client.
        let chat = ChatClient::slack(SecretStore::env(), &config.slack_token_secret)?;

        // Initialize the event channel.
        let events = EventChannel::in_process();

        Ok(Self::with_services(config, chat, events))
    }

    /// Assemble a runtime from existing services and subscribe the Slack publisher.
    pub fn with_services(config: Config, chat: ChatClient, events: EventChannel) -> Self {
        events.subscribe(Arc::new(SlackReleasePublisher::from_config(&config, chat.clone())));

        Self { config, chat, events }
    }

    /// The HTTP routes served by this runtime.
    pub fn router(&self) -> axum::Router {
        ingress::router(IngressState::new(self.config.repo_filter(), self.events.clone()))
    }

    /// Serve webhooks until Ctrl-C.
    pub async fn start(&self) -> Void {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;

        info!("Listening for GitHub webhooks on {} ...", listener.local_addr()?);

        // Keep the forwarder alive for as long as the server runs.
        let _forwarder = if self.config.forward_webhooks {
            Some(WebhookForwarder::new(self.config.repo_filter(), addr.port()).spawn()?)
        } else {
            None
        };

        axum::serve(listener, self.router()).with_graceful_shutdown(shutdown_signal()).await?;

        info!("Server stopped.");

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }

    info!("Shutting down ...");
}
