//! Load configuration via `config` crate with env-override support.

use std::{net::SocketAddr, ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::{RepoFilter, Res, Void};

/// Default channel that receives every release.
fn default_all_releases_channel() -> String {
    "releases".to_string()
}

/// Default channel that additionally receives breaking releases.
fn default_breaking_changes_channel() -> String {
    "breaking-changes".to_string()
}

/// Default secret reference for the Slack bot token.
fn default_slack_token_secret() -> String {
    "SLACK_BOT_TOKEN".to_string()
}

/// Default address for the webhook listener.
fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

/// Configuration for the release-relay application.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Owner of the watched GitHub repository (`GITHUB_OWNER`).
    pub github_owner: String,
    /// Name of the watched GitHub repository (`GITHUB_REPO`).
    pub github_repo: String,
    /// Slack channel that receives every release (`ALL_RELEASES_CHANNEL`).
    #[serde(default = "default_all_releases_channel")]
    pub all_releases_channel: String,
    /// Slack channel that also receives breaking releases (`BREAKING_CHANGES_CHANNEL`).
    #[serde(default = "default_breaking_changes_channel")]
    pub breaking_changes_channel: String,
    /// Name of the secret holding the Slack bot token (`SLACK_TOKEN_SECRET`).
    ///
    /// The token itself is resolved from the secret store every time a message is sent.
    #[serde(default = "default_slack_token_secret")]
    pub slack_token_secret: String,
    /// Socket address the webhook listener binds to (`BIND_ADDRESS`).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Spawn `gh webhook forward` alongside the server for local development (`FORWARD_WEBHOOKS`).
    #[serde(default)]
    pub forward_webhooks: bool,
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("RELEASE_RELAY"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Checks the loaded values for consistency.
    pub fn validate(&self) -> Void {
        if self.github_owner.is_empty() || self.github_repo.is_empty() {
            return Err(anyhow::anyhow!("GitHub owner and repo must both be set."));
        }

        if self.github_owner.contains('/') || self.github_repo.contains('/') {
            return Err(anyhow::anyhow!("GitHub owner and repo must not contain '/'."));
        }

        if self.all_releases_channel.is_empty() || self.breaking_changes_channel.is_empty() {
            return Err(anyhow::anyhow!("Slack channel names must not be empty."));
        }

        if self.slack_token_secret.is_empty() {
            return Err(anyhow::anyhow!("Slack token secret reference must not be empty."));
        }

        self.socket_addr()?;

        Ok(())
    }

    /// Applies command-line settings on top of the loaded values and re-validates.
    ///
    /// `forward` can only switch forwarding on; leaving the flag off keeps the configured value.
    pub fn with_overrides(self, bind_address: Option<String>, forward: bool) -> Res<Self> {
        let mut inner = ConfigInner::clone(&self.inner);

        if let Some(bind_address) = bind_address {
            inner.bind_address = bind_address;
        }

        inner.forward_webhooks |= forward;

        let result = Config::from(inner);

        result.validate()?;

        Ok(result)
    }

    /// The repository whose releases are relayed.
    pub fn repo_filter(&self) -> RepoFilter {
        RepoFilter::new(&self.github_owner, &self.github_repo)
    }

    /// The parsed listener address.
    pub fn socket_addr(&self) -> Res<SocketAddr> {
        self.bind_address
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address `{}`: {}", self.bind_address, e))
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

// Tests.
