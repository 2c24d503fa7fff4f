//! Slack implementation of the chat client, built on `slack-morphism`.

use crate::{
    base::types::{ChatBlock, ChatMessage, Res, Void},
    service::secret::SecretStore,
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use secrecy::ExposeSecret;
use slack_morphism::prelude::*;
use tracing::{debug, error, instrument};

use std::sync::Arc;

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    ///
    /// `token_secret` names the secret holding the bot token.
    pub fn slack(secrets: SecretStore, token_secret: &str) -> Res<Self> {
        let client = SlackChatClient::new(secrets, token_secret)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Structs.

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    client: Arc<FullClient>,
    secrets: SecretStore,
    token_secret: String,
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    fn new(secrets: SecretStore, token_secret: &str) -> Res<Self> {
        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        Ok(Self {
            client,
            secrets,
            token_secret: token_secret.to_string(),
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    #[instrument(skip_all, fields(channel = %message.channel))]
    async fn post_message(&self, message: &ChatMessage) -> Void {
        let token = self.secrets.resolve(&self.token_secret).await?;
        let token = SlackApiToken::new(SlackApiTokenValue(token.expose_secret().to_string()));

        let request = post_message_request(message);
        let session = self.client.open_session(&token);

        match session.chat_post_message(&request).await {
            Ok(response) => {
                debug!("Posted message {} to `{}`.", response.ts.0, message.channel);
                Ok(())
            }
            Err(e) => {
                let payload = serde_json::to_string(&request).unwrap_or_default();
                error!(payload = %payload, "Failed to post message to `{}`: {}", message.channel, e);
                Err(anyhow::anyhow!("Failed to post message to `{}`: {}", message.channel, e))
            }
        }
    }
}

// Helpers.

/// Builds the `chat.postMessage` request for a message.
fn post_message_request(message: &ChatMessage) -> SlackApiChatPostMessageRequest {
    let blocks = message.blocks.iter().map(slack_block).collect();

    let content = SlackMessageContent::new().with_text(message.text.clone().unwrap_or_default()).with_blocks(blocks);

    SlackApiChatPostMessageRequest::new(SlackChannelId(message.channel.clone()), content)
}

fn slack_block(block: &ChatBlock) -> SlackBlock {
    match block {
        ChatBlock::Header(text) => SlackBlock::Header(SlackHeaderBlock::new(SlackBlockPlainText::new(text.clone()).with_emoji(true).into())),
        ChatBlock::Section(text) => SlackBlock::Section(SlackSectionBlock::new().with_text(SlackBlockText::MarkDown(SlackBlockMarkDownText::new(text.clone())))),
    }
}

// Tests.
