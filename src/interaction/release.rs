//! Publishes release events to Slack.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, instrument};

use crate::{
    base::{
        config::Config,
        markdown,
        types::{ChatBlock, ChatMessage, ReleaseEvent, Void},
    },
    service::{chat::ChatClient, events::ReleaseHandler},
};

/// Everything from this heading on is the checksum table GitHub release tooling appends.
const CHECKSUMS_MARKER: &str = "### SHA-1 Checksums";

/// Slack rejects header blocks with longer text.
const HEADER_TEXT_LIMIT: usize = 150;
/// Slack rejects section blocks with longer text.
const SECTION_TEXT_LIMIT: usize = 3000;

/// `vMAJOR.0.0` or `v0.MINOR.0`.
static BREAKING_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^v[0-9]+\.0\.0$|^v0\.[0-9]+\.0$").expect("valid breaking tag pattern"));

/// Whether a release tag signals a breaking change.
///
/// Only the exact shapes `vN.0.0` and `v0.N.0` qualify; tags without the leading `v`
/// or with a pre-release suffix do not.
pub fn is_breaking_change(tag: &str) -> bool {
    BREAKING_TAG.is_match(tag)
}

/// Drops the checksum section (and anything after it) from release notes.
pub fn strip_checksums(body: &str) -> &str {
    body.split_once(CHECKSUMS_MARKER).map_or(body, |(notes, _)| notes)
}

/// Cuts `text` to at most `limit` characters, marking the cut with an ellipsis.
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    match limit {
        0 => String::new(),
        _ => text.chars().take(limit - 1).chain(['…']).collect(),
    }
}

/// Builds the header and section blocks announcing a release.
///
/// The title and the notes are shortened so both blocks stay within Slack's text limits;
/// the rocket and the release link always survive.
pub fn release_blocks(release: &ReleaseEvent) -> Vec<ChatBlock> {
    let notes = markdown::to_mrkdwn(strip_checksums(&release.body));

    let header_suffix = " has been released! :rocket:";
    let title = truncate(&release.title, HEADER_TEXT_LIMIT.saturating_sub(header_suffix.chars().count()));

    let section_suffix = format!("\n\nLearn more: {}", release.url);
    let notes = truncate(&notes, SECTION_TEXT_LIMIT.saturating_sub(section_suffix.chars().count()));

    vec![ChatBlock::Header(format!("{title}{header_suffix}")), ChatBlock::Section(format!("{notes}{section_suffix}"))]
}

/// Announces every release in one channel, and breaking releases in a second.
pub struct SlackReleasePublisher {
    chat: ChatClient,
    all_releases_channel: String,
    breaking_changes_channel: String,
}

impl SlackReleasePublisher {
    pub fn new(chat: ChatClient, all_releases_channel: impl Into<String>, breaking_changes_channel: impl Into<String>) -> Self {
        Self {
            chat,
            all_releases_channel: all_releases_channel.into(),
            breaking_changes_channel: breaking_changes_channel.into(),
        }
    }

    pub fn from_config(config: &Config, chat: ChatClient) -> Self {
        Self::new(chat, &config.all_releases_channel, &config.breaking_changes_channel)
    }
}

#[async_trait]
impl ReleaseHandler for SlackReleasePublisher {
    fn name(&self) -> &str {
        "slack-release-publisher"
    }

    #[instrument(skip_all, fields(tag = %release.tag))]
    async fn handle(&self, release: &ReleaseEvent) -> Void {
        let message = ChatMessage::new(&self.all_releases_channel, release_blocks(release));

        self.chat.post_message(&message).await?;
        info!("Announced `{}` by {} in `{}`.", release.title, release.author, self.all_releases_channel);

        if is_breaking_change(&release.tag) {
            let breaking = message.to_channel(&self.breaking_changes_channel);

            self.chat.post_message(&breaking).await?;
            info!("Announced breaking release `{}` in `{}`.", release.title, self.breaking_changes_channel);
        }

        Ok(())
    }
}

// Tests.
