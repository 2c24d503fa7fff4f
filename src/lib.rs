//! Library root for `release-relay`.
//!
//! Release-relay announces GitHub releases in Slack:
//! - Receives GitHub `release` webhooks and filters them to one repository
//! - Converts the release notes to Slack `mrkdwn`
//! - Posts every release to one channel, and breaking releases to a second
//!
//! The ingress hands payloads to an event channel, so the webhook response never
//! waits on Slack. The architecture is built around extensible traits that allow
//! for different implementations of each service.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the release-relay runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with the chat client and event channel
/// - Serves the webhook endpoint until shutdown
pub async fn start(config: Config) -> Void {
    info!("Starting release-relay ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("A crypto provider was already installed."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config)?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
