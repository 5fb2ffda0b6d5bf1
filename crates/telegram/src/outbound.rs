//! Outbound adapter: core relay calls onto the Telegram Bot API.

use {
    async_trait::async_trait,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{ChatId, MessageId, ParseMode, Recipient, ReplyParameters},
    },
};

use crosspost_core::{Error, OutboundRelay, Result};

/// Sends and edits messages through a single bot connection.
pub struct TelegramRelay {
    bot: Bot,
}

impl TelegramRelay {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Convert an opaque channel id into a teloxide recipient.
///
/// `@username` channels pass through as-is; anything else must be a
/// numeric chat id. This is the only place Telegram channel ids are ever
/// parsed — inside the core they stay opaque strings.
fn parse_recipient(channel_id: &str) -> Result<Recipient> {
    if channel_id.starts_with('@') {
        return Ok(Recipient::ChannelUsername(channel_id.to_string()));
    }
    channel_id
        .parse::<i64>()
        .map(|id| Recipient::Id(ChatId(id)))
        .map_err(|_| Error::invalid_id(channel_id))
}

fn parse_message_id(message_id: &str) -> Result<MessageId> {
    message_id
        .parse::<i32>()
        .map(MessageId)
        .map_err(|_| Error::invalid_id(message_id))
}

fn is_message_not_modified(err: &RequestError) -> bool {
    matches!(err, RequestError::Api(ApiError::MessageNotModified))
}

#[async_trait]
impl OutboundRelay for TelegramRelay {
    async fn send(&self, channel_id: &str, text: &str, reply_to: Option<&str>) -> Result<String> {
        let recipient = parse_recipient(channel_id)?;
        let mut request = self
            .bot
            .send_message(recipient, text)
            .parse_mode(ParseMode::Markdown);
        if let Some(parent) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(parse_message_id(parent)?));
        }
        let message = request
            .await
            .map_err(|e| Error::transport("telegram send_message", e))?;
        Ok(message.id.0.to_string())
    }

    async fn update(&self, channel_id: &str, message_id: &str, text: &str) -> Result<()> {
        let recipient = parse_recipient(channel_id)?;
        let id = parse_message_id(message_id)?;
        match self
            .bot
            .edit_message_text(recipient, id, text)
            .parse_mode(ParseMode::Markdown)
            .await
        {
            Ok(_) => Ok(()),
            // Re-editing to identical text is not a failure of the relay.
            Err(e) if is_message_not_modified(&e) => Ok(()),
            Err(e) => Err(Error::transport("telegram edit_message_text", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_channel_id_parses_to_chat_id() {
        assert_eq!(
            parse_recipient("-1001234567890").unwrap(),
            Recipient::Id(ChatId(-1001234567890))
        );
    }

    #[test]
    fn username_channel_id_passes_through() {
        assert_eq!(
            parse_recipient("@newsfeed").unwrap(),
            Recipient::ChannelUsername("@newsfeed".into())
        );
    }

    #[test]
    fn garbage_channel_id_is_rejected() {
        assert!(matches!(
            parse_recipient("1714.0023").unwrap_err(),
            Error::InvalidId { .. }
        ));
    }

    #[test]
    fn message_id_must_be_numeric() {
        assert_eq!(parse_message_id("42").unwrap(), MessageId(42));
        assert!(parse_message_id("1714.0023").is_err());
    }
}
