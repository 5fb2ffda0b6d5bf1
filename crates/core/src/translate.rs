//! Pure translation of a normalized inbound message into the outbound
//! payload for the opposite platform.
//!
//! Both directions share one formatting policy: a `*From <channel>*`
//! context line (with an `(edited)` marker for edits), the sender on its
//! own line, the original text verbatim, and a fixed placeholder when the
//! source message carried media of any kind — the media itself is never
//! forwarded.

use crate::event::InboundEvent;

/// Appended when the source message carries media. Subtype is deliberately
/// collapsed; the destination only learns that something was attached.
pub const MEDIA_PLACEHOLDER: &str = "[Media content is present but cannot be directly embedded]";

/// Payload ready for the destination platform's outbound relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    /// Destination-platform id of the message to reply to / thread under.
    /// Only set when the caller resolved a correlation for the source-side
    /// parent; an unresolved parent degrades silently to a top-level post.
    pub reply_to_id: Option<String>,
}

/// Translate `event` for the opposite platform.
///
/// `reply_to_id` is the already-resolved destination-side parent id, if
/// any; resolution is the orchestrator's job, keeping this function pure.
#[must_use]
pub fn translate(event: &InboundEvent, reply_to_id: Option<&str>) -> OutboundMessage {
    let mut text = String::new();

    if let Some(channel) = &event.channel_label {
        text.push_str("*From ");
        text.push_str(channel);
        text.push('*');
        if event.is_edit {
            text.push_str(" (edited)");
        }
        text.push('\n');
    } else if event.is_edit {
        text.push_str("*(edited)*\n");
    }
    if let Some(sender) = &event.sender_label {
        text.push('*');
        text.push_str(sender);
        text.push_str("*\n");
    }
    if !text.is_empty() {
        text.push('\n');
    }

    if let Some(body) = &event.text {
        text.push_str(body);
    }

    if event.has_media {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(MEDIA_PLACEHOLDER);
    }

    OutboundMessage {
        text,
        reply_to_id: reply_to_id.map(str::to_string),
    }
}
