use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

// Repositories.

/// Identifies the repository whose releases an ingress accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFilter {
    owner: String,
    repo: String,
}

impl RepoFilter {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// The `owner/repo` form GitHub reports in `repository.full_name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Exact comparison against a payload's `repository.full_name`.
    pub fn matches(&self, full_name: &str) -> bool {
        full_name.split_once('/').is_some_and(|(owner, repo)| owner == self.owner && repo == self.repo)
    }
}

// Webhook payloads.

/// The slice of a webhook delivery needed to decide whether to relay it.
///
/// Read leniently: a missing, `null`, or mistyped `action` or `repository.full_name`
/// is treated as empty, so any valid JSON can be filtered.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WebhookEnvelope {
    pub action: String,
    pub full_name: String,
}

impl WebhookEnvelope {
    /// Parses a delivery body; only invalid JSON is an error.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(body)?;

        let action = match value.get("action") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(action)) => action.clone(),
            Some(other) => other.to_string(),
        };

        let full_name = value.pointer("/repository/full_name").and_then(Value::as_str).unwrap_or_default().to_string();

        Ok(Self { action, full_name })
    }
}

#[derive(Debug, Deserialize)]
struct ReleasePayload {
    release: ReleasePayloadRelease,
}

#[derive(Debug, Deserialize)]
struct ReleasePayloadRelease {
    name: Option<String>,
    author: ReleasePayloadAuthor,
    tag_name: String,
    body: Option<String>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ReleasePayloadAuthor {
    login: String,
}

// Releases.

/// A normalized GitHub release notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEvent {
    pub title: String,
    pub author: String,
    pub tag: String,
    pub body: String,
    pub url: String,
}

impl ReleaseEvent {
    /// Decodes a serialized `release` webhook delivery.
    ///
    /// Any missing field fails the decode with the field's name. A `null` body decodes as
    /// empty, and a `null` or empty name falls back to the tag.
    pub fn from_payload(payload: &str) -> Res<Self> {
        let payload: ReleasePayload = serde_json::from_str(payload).context("Failed to decode release payload")?;
        let release = payload.release;

        let title = match release.name {
            Some(name) if !name.is_empty() => name,
            _ => release.tag_name.clone(),
        };

        Ok(Self {
            title,
            author: release.author.login,
            tag: release.tag_name,
            body: release.body.unwrap_or_default(),
            url: release.html_url,
        })
    }
}

// Chat messages.

/// A single Slack block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatBlock {
    /// Large plain text heading; emoji shortcodes are rendered.
    Header(String),
    /// Body text in `mrkdwn`.
    Section(String),
}

/// A message bound for one chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub channel: String,
    pub text: Option<String>,
    pub blocks: Vec<ChatBlock>,
}

impl ChatMessage {
    pub fn new(channel: impl Into<String>, blocks: Vec<ChatBlock>) -> Self {
        Self {
            channel: channel.into(),
            text: None,
            blocks,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// A copy of this message addressed to another channel.
    pub fn to_channel(&self, channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ..self.clone()
        }
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(release: serde_json::Value) -> String {
        serde_json::json!({
            "action": "released",
            "repository": { "full_name": "acme/widget" },
            "release": release,
        })
        .to_string()
    }

    #[test]
    fn repo_filter_matches_exact_full_name() {
        let filter = RepoFilter::new("acme", "widget");

        assert!(filter.matches("acme/widget"));
        assert!(!filter.matches("acme/widgets"));
        assert!(!filter.matches("Acme/widget"));
        assert!(!filter.matches("acme"));
        assert!(!filter.matches(""));
    }

    #[test]
    fn envelope_tolerates_missing_fields() {
        let envelope = WebhookEnvelope::from_json("{}").unwrap();

        assert_eq!(envelope, WebhookEnvelope::default());
    }

    #[test]
    fn envelope_tolerates_odd_shapes() {
        for body in ["[]", "null", "42", r#"{"action":null}"#, r#"{"action":"created","repository":{}}"#, r#"{"repository":"acme/widget"}"#] {
            let envelope = WebhookEnvelope::from_json(body).unwrap();
            assert_eq!(envelope.full_name, "", "{body}");
        }

        assert_eq!(WebhookEnvelope::from_json(r#"{"action":7}"#).unwrap().action, "7");
        assert_eq!(WebhookEnvelope::from_json(r#"{"action":"created","repository":{}}"#).unwrap().action, "created");
    }

    #[test]
    fn envelope_reads_action_and_repository() {
        let envelope = WebhookEnvelope::from_json(r#"{"action":"released","repository":{"full_name":"acme/widget"}}"#).unwrap();

        assert_eq!(envelope.action, "released");
        assert_eq!(envelope.full_name, "acme/widget");
    }

    #[test]
    fn envelope_rejects_invalid_json() {
        assert!(WebhookEnvelope::from_json("{not json").is_err());
        assert!(WebhookEnvelope::from_json("").is_err());
    }

    #[test]
    fn decodes_release_event() {
        let payload = payload(serde_json::json!({
            "name": "Widget 2.0.0",
            "author": { "login": "alice" },
            "tag_name": "v2.0.0",
            "body": "Notes",
            "html_url": "https://x/y",
        }));

        let release = ReleaseEvent::from_payload(&payload).unwrap();

        assert_eq!(
            release,
            ReleaseEvent {
                title: "Widget 2.0.0".to_string(),
                author: "alice".to_string(),
                tag: "v2.0.0".to_string(),
                body: "Notes".to_string(),
                url: "https://x/y".to_string(),
            }
        );
    }

    #[test]
    fn null_body_and_name_fall_back() {
        let payload = payload(serde_json::json!({
            "name": null,
            "author": { "login": "alice" },
            "tag_name": "v1.2.3",
            "body": null,
            "html_url": "https://x/y",
        }));

        let release = ReleaseEvent::from_payload(&payload).unwrap();

        assert_eq!(release.title, "v1.2.3");
        assert_eq!(release.body, "");
    }

    #[test]
    fn missing_field_names_the_field() {
        let payload = payload(serde_json::json!({
            "name": "Widget",
            "tag_name": "v1.0.0",
            "body": "",
            "html_url": "https://x/y",
        }));

        let err = ReleaseEvent::from_payload(&payload).unwrap_err();

        assert!(format!("{err:#}").contains("author"));
    }

    #[test]
    fn message_copies_are_independent() {
        let original = ChatMessage::new("releases", vec![ChatBlock::Header("h".to_string())]);
        let mut copy = original.to_channel("breaking-changes");
        copy.blocks.push(ChatBlock::Section("s".to_string()));

        assert_eq!(original.channel, "releases");
        assert_eq!(original.blocks.len(), 1);
        assert_eq!(copy.channel, "breaking-changes");
    }
}
