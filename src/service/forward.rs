//! Local webhook forwarding for development.
//!
//! Runs `gh webhook forward` so that release deliveries for the watched repository
//! reach a locally running relay without exposing it publicly. Requires the GitHub
//! CLI with the `cli/gh-webhook` extension installed.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{info, instrument};

use crate::base::types::{RepoFilter, Res};

/// Spawns and owns the forwarding process.
#[derive(Debug, Clone)]
pub struct WebhookForwarder {
    repo: RepoFilter,
    url: String,
}

impl WebhookForwarder {
    /// Forward release deliveries for `repo` to the relay listening on `port`.
    pub fn new(repo: RepoFilter, port: u16) -> Self {
        Self {
            repo,
            url: format!("http://localhost:{port}/payload"),
        }
    }

    /// The command that performs the forwarding.
    pub fn command(&self) -> Command {
        let mut command = Command::new("gh");

        command
            .arg("webhook")
            .arg("forward")
            .arg(format!("--repo={}", self.repo.full_name()))
            .arg("--events=release")
            .arg(format!("--url={}", self.url))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        command
    }

    /// Starts forwarding; the process is killed when the returned handle is dropped.
    #[instrument(skip_all)]
    pub fn spawn(&self) -> Res<Child> {
        info!("Forwarding `{}` release webhooks to {} ...", self.repo.full_name(), self.url);

        self.command().spawn().map_err(|e| anyhow::anyhow!("Failed to start `gh webhook forward`: {}", e))
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_gh_forward_command() {
        let forwarder = WebhookForwarder::new(RepoFilter::new("acme", "widget"), 3000);
        let command = forwarder.command();
        let command = command.as_std();

        let args = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect::<Vec<_>>();

        assert_eq!(command.get_program(), "gh");
        assert_eq!(
            args,
            vec!["webhook", "forward", "--repo=acme/widget", "--events=release", "--url=http://localhost:3000/payload"]
        );
    }
}
