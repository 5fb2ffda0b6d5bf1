//! Long-polling inbound loop for the Telegram side of the bridge.
//!
//! Listens for channel posts and channel-post edits, normalizes them and
//! hands them to the relay orchestrator. Updates are processed strictly in
//! arrival order; reply-parent resolution depends on it.

use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, Message, UpdateKind, UserId},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {
    crosspost_config::TelegramConfig,
    crosspost_core::{InboundEvent, Platform, Relay},
};

/// Build the bot and verify credentials.
///
/// The HTTP client timeout stays above the long-polling timeout (30s) so
/// the client doesn't abort the request before Telegram responds. Any
/// existing webhook is deleted so long polling works.
pub async fn connect(config: &TelegramConfig) -> anyhow::Result<(Bot, UserId)> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    let me = bot.get_me().await?;
    bot.delete_webhook().send().await?;

    info!(
        username = ?me.user.username,
        "telegram bot connected (webhook cleared)"
    );
    Ok((bot, me.user.id))
}

/// Start the polling loop in a background task.
///
/// Runs until the returned `CancellationToken` is cancelled. A failure
/// relaying one message is logged and never stops the loop.
pub fn start_polling(bot: Bot, self_id: UserId, relay: Arc<Relay>) -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            if cancel_clone.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![
                    AllowedUpdate::ChannelPost,
                    AllowedUpdate::EditedChannelPost,
                ])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        let event = match update.kind {
                            UpdateKind::ChannelPost(msg) => inbound_event(&msg, self_id, false),
                            UpdateKind::EditedChannelPost(msg) => {
                                inbound_event(&msg, self_id, true)
                            },
                            other => {
                                debug!("ignoring non-channel update: {other:?}");
                                continue;
                            },
                        };
                        if let Err(e) = relay.handle_event(Platform::Telegram, event).await {
                            error!(error = %e, "failed to relay telegram channel post");
                        }
                    }
                },
                Err(e) => {
                    // Another instance polling with the same token makes
                    // every getUpdates call fail; stop instead of spinning.
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        error!(
                            "telegram polling stopped: another instance is already running with this token"
                        );
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                },
            }
        }
    });

    cancel
}

/// Normalize a channel post into the core event shape.
///
/// Media subtype is collapsed into a single flag; captions stand in for
/// text on media messages. All ids are stringified once here and stay
/// opaque from this point on.
fn inbound_event(msg: &Message, self_id: UserId, is_edit: bool) -> InboundEvent {
    let has_media = msg.photo().is_some()
        || msg.video().is_some()
        || msg.document().is_some()
        || msg.voice().is_some()
        || msg.animation().is_some();

    InboundEvent {
        channel_id: msg.chat.id.0.to_string(),
        message_id: msg.id.0.to_string(),
        text: msg.text().or_else(|| msg.caption()).map(str::to_string),
        has_media,
        sender_label: None,
        channel_label: msg
            .chat
            .title()
            .map(|title| format!("Telegram channel \"{title}\"")),
        reply_parent_message_id: msg.reply_to_message().map(|parent| parent.id.0.to_string()),
        is_edit,
        is_from_self: msg.from().is_some_and(|user| user.id == self_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_post(extra: serde_json::Value) -> Message {
        let mut base = serde_json::json!({
            "message_id": 7,
            "date": 1714000000,
            "chat": {
                "id": -1001234567890_i64,
                "type": "channel",
                "title": "News"
            }
        });
        base.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn text_post_normalizes_ids_and_label() {
        let msg = channel_post(serde_json::json!({ "text": "hello" }));
        let event = inbound_event(&msg, UserId(42), false);
        assert_eq!(event.channel_id, "-1001234567890");
        assert_eq!(event.message_id, "7");
        assert_eq!(event.text.as_deref(), Some("hello"));
        assert_eq!(
            event.channel_label.as_deref(),
            Some("Telegram channel \"News\"")
        );
        assert!(!event.has_media);
        assert!(!event.is_edit);
        assert!(!event.is_from_self);
    }

    #[test]
    fn photo_post_sets_media_flag_and_uses_caption() {
        let msg = channel_post(serde_json::json!({
            "caption": "look",
            "photo": [{
                "file_id": "f1",
                "file_unique_id": "u1",
                "width": 100,
                "height": 100
            }]
        }));
        let event = inbound_event(&msg, UserId(42), false);
        assert!(event.has_media);
        assert_eq!(event.text.as_deref(), Some("look"));
    }

    #[test]
    fn reply_parent_id_is_carried_over() {
        let msg = channel_post(serde_json::json!({
            "text": "child",
            "reply_to_message": {
                "message_id": 3,
                "date": 1713990000,
                "chat": {
                    "id": -1001234567890_i64,
                    "type": "channel",
                    "title": "News"
                },
                "text": "parent"
            }
        }));
        let event = inbound_event(&msg, UserId(42), false);
        assert_eq!(event.reply_parent_message_id.as_deref(), Some("3"));
    }

    #[test]
    fn own_posts_are_flagged() {
        let msg = channel_post(serde_json::json!({
            "text": "from the bot",
            "from": {
                "id": 42,
                "is_bot": true,
                "first_name": "bridge"
            }
        }));
        let event = inbound_event(&msg, UserId(42), false);
        assert!(event.is_from_self);
    }

    #[test]
    fn edited_post_is_marked_as_edit() {
        let msg = channel_post(serde_json::json!({ "text": "v2" }));
        let event = inbound_event(&msg, UserId(42), true);
        assert!(event.is_edit);
    }
}
