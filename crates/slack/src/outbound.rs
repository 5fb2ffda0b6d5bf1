//! Outbound adapter: core relay calls onto the Slack Web API.

use std::sync::Arc;

use {async_trait::async_trait, slack_morphism::prelude::*};

use crosspost_core::{Error, OutboundRelay, Result};

/// Posts and updates messages through the Web API. The message id handed
/// back to the core is the Slack ts token, kept as an opaque string.
pub struct SlackRelay {
    client: Arc<SlackHyperClient>,
    token: SlackApiToken,
}

impl SlackRelay {
    #[must_use]
    pub fn new(client: Arc<SlackHyperClient>, token: SlackApiToken) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl OutboundRelay for SlackRelay {
    async fn send(&self, channel_id: &str, text: &str, reply_to: Option<&str>) -> Result<String> {
        let session = self.client.open_session(&self.token);
        let mut request = SlackApiChatPostMessageRequest::new(
            channel_id.to_string().into(),
            SlackMessageContent::new().with_text(text.to_string()),
        );
        if let Some(thread_ts) = reply_to {
            request = request.with_thread_ts(thread_ts.to_string().into());
        }
        let response = session
            .chat_post_message(&request)
            .await
            .map_err(|e| Error::transport("slack chat.postMessage", e))?;
        Ok(response.ts.to_string())
    }

    async fn update(&self, channel_id: &str, message_id: &str, text: &str) -> Result<()> {
        let session = self.client.open_session(&self.token);
        let request = SlackApiChatUpdateRequest::new(
            channel_id.to_string().into(),
            SlackMessageContent::new().with_text(text.to_string()),
            message_id.to_string().into(),
        );
        session
            .chat_update(&request)
            .await
            .map_err(|e| Error::transport("slack chat.update", e))?;
        Ok(())
    }
}
