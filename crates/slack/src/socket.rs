//! Socket Mode connection handler for Slack.
//!
//! Uses slack-morphism's socket mode listener to receive events via
//! WebSocket without requiring a public HTTP endpoint. Message events are
//! normalized and handed to the relay orchestrator; slash commands are
//! answered from the mapping store.

use std::sync::Arc;

use {
    anyhow::Result,
    secrecy::ExposeSecret,
    slack_morphism::prelude::*,
    tracing::{debug, error, info, warn},
};

use {
    crosspost_config::SlackConfig,
    crosspost_core::{InboundEvent, Platform, Relay},
};

use crate::commands;

/// Shared state for socket mode callbacks.
#[derive(Clone)]
struct SocketModeState {
    relay: Arc<Relay>,
    admin_users: Vec<String>,
    bot_user_id: Option<SlackUserId>,
    client: Arc<SlackHyperClient>,
    token: SlackApiToken,
}

/// Start the Socket Mode listener in a background task.
///
/// Runs until the returned `CancellationToken` is cancelled.
pub async fn start_socket_mode(
    config: &SlackConfig,
    client: Arc<SlackHyperClient>,
    token: SlackApiToken,
    bot_user_id: Option<SlackUserId>,
    relay: Arc<Relay>,
) -> Result<tokio_util::sync::CancellationToken> {
    let app_token = SlackApiToken::new(config.app_token.expose_secret().into());
    let cancel = tokio_util::sync::CancellationToken::new();

    let state = SocketModeState {
        relay,
        admin_users: config.admin_users.clone(),
        bot_user_id,
        client: Arc::clone(&client),
        token,
    };

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let callbacks = SlackSocketModeListenerCallbacks::new()
            .with_push_events(handle_push_events)
            .with_command_events(handle_command_events);

        let listener_env =
            Arc::new(SlackClientEventsListenerEnvironment::new(client).with_user_state(state));

        let socket_listener = SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_env,
            callbacks,
        );

        tokio::select! {
            result = socket_listener.listen_for(&app_token) => {
                if let Err(e) = result {
                    error!(error = %e, "socket mode error");
                }
            }
            _ = cancel_clone.cancelled() => {
                info!("socket mode cancelled");
            }
        }
    });

    Ok(cancel)
}

async fn handle_push_events(
    event: SlackPushEventCallback,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = {
        let guard = states.read().await;
        guard
            .get_user_state::<SocketModeState>()
            .ok_or("missing socket mode state")?
            .clone()
    };

    if let Err(e) = handle_push_event_inner(&state, event).await {
        warn!(error = %e, "failed to handle push event");
    }

    Ok(())
}

async fn handle_command_events(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> Result<SlackCommandEventResponse, Box<dyn std::error::Error + Send + Sync>> {
    let state = {
        let guard = states.read().await;
        guard
            .get_user_state::<SocketModeState>()
            .ok_or("missing socket mode state")?
            .clone()
    };

    debug!(command = ?event.command, "received slash command");

    let command = event.command.to_string();
    let user_id = event.user_id.to_string();
    let response = commands::handle_command(
        state.relay.store(),
        &state.admin_users,
        &user_id,
        &command,
        event.text.as_deref().unwrap_or_default(),
    )
    .await
    .unwrap_or_else(|| "Unknown command".to_string());

    Ok(SlackCommandEventResponse::new(
        SlackMessageContent::new().with_text(response),
    ))
}

async fn handle_push_event_inner(
    state: &SocketModeState,
    event: SlackPushEventCallback,
) -> Result<()> {
    match &event.event {
        SlackEventCallbackBody::Message(msg) => handle_message_event(state, msg).await,
        _ => {
            debug!("ignoring event callback type");
            Ok(())
        },
    }
}

async fn handle_message_event(state: &SocketModeState, event: &SlackMessageEvent) -> Result<()> {
    let Some(mut inbound) = inbound_event(event, state.bot_user_id.as_ref()) else {
        return Ok(());
    };

    // Name lookups are skipped for own messages; the relay discards them
    // unlabeled.
    if !inbound.is_from_self {
        inbound.sender_label = sender_label(state, sender_user(event)).await;
        inbound.channel_label = channel_label(state, &inbound.channel_id).await;
    }

    let channel_id = inbound.channel_id.clone();
    if let Err(e) = state.relay.handle_event(Platform::Slack, inbound).await {
        error!(channel = %channel_id, error = %e, "failed to relay slack message");
    }
    Ok(())
}

/// Normalize a message event into the core event shape, labels left for
/// the caller. Returns `None` for events that are never relayed: joins,
/// deletes, bot_message and other subtypes, and events with no channel.
fn inbound_event(
    event: &SlackMessageEvent,
    bot_user_id: Option<&SlackUserId>,
) -> Option<InboundEvent> {
    let channel_id = event.origin.channel.as_ref()?.to_string();

    // An edit arrives as `message_changed`, with the edited message (and
    // its original ts) nested under the change envelope.
    let (ts, content, sender, is_edit) = match &event.subtype {
        None => (&event.origin.ts, event.content.as_ref(), &event.sender, false),
        Some(SlackMessageEventType::MessageChanged) => {
            let edited = event.message.as_ref()?;
            (&edited.ts, edited.content.as_ref(), &edited.sender, true)
        },
        Some(_) => return None,
    };

    let message_ts = ts.to_string();

    let has_media = content.is_some_and(|c| {
        c.attachments.as_ref().is_some_and(|a| !a.is_empty())
            || c.files.as_ref().is_some_and(|f| !f.is_empty())
    });

    // A thread child carries its parent's ts; the root message has
    // thread_ts == ts and is not a reply.
    let reply_parent = event
        .origin
        .thread_ts
        .as_ref()
        .map(ToString::to_string)
        .filter(|parent| *parent != message_ts);

    // Covers our own chat.update calls too: those come back as
    // `message_changed` with the bot as the nested sender.
    let is_from_self = sender.bot_id.is_some()
        || match (&sender.user, bot_user_id) {
            (Some(user), Some(bot)) => user == bot,
            _ => false,
        };

    Some(InboundEvent {
        channel_id,
        message_id: message_ts,
        text: content.and_then(|c| c.text.clone()),
        has_media,
        sender_label: None,
        channel_label: None,
        reply_parent_message_id: reply_parent,
        is_edit,
        is_from_self,
    })
}

fn sender_user(event: &SlackMessageEvent) -> Option<&SlackUserId> {
    match event.subtype {
        Some(SlackMessageEventType::MessageChanged) => {
            event.message.as_ref().and_then(|m| m.sender.user.as_ref())
        },
        _ => event.sender.user.as_ref(),
    }
}

/// Best-effort channel name lookup; falls back to the raw id.
async fn channel_label(state: &SocketModeState, channel_id: &str) -> Option<String> {
    let session = state.client.open_session(&state.token);
    let request = SlackApiConversationsInfoRequest::new(channel_id.to_string().into());
    match session.conversations_info(&request).await {
        Ok(response) => {
            let name = response.channel.name.unwrap_or_else(|| channel_id.to_string());
            Some(format!("Slack #{name}"))
        },
        Err(e) => {
            debug!(channel = channel_id, error = %e, "conversations.info failed");
            Some(format!("Slack {channel_id}"))
        },
    }
}

/// Best-effort sender name lookup; omitted when unavailable.
async fn sender_label(state: &SocketModeState, user_id: Option<&SlackUserId>) -> Option<String> {
    let user_id = user_id?;
    let session = state.client.open_session(&state.token);
    let request = SlackApiUsersInfoRequest::new(user_id.clone());
    match session.users_info(&request).await {
        Ok(response) => response.user.real_name.clone(),
        Err(e) => {
            debug!(user = %user_id, error = %e, "users.info failed");
            None
        },
    }
}
