/// A normalized inbound event from either platform transport.
///
/// Transports convert their SDK message shapes into this form before
/// handing them to the orchestrator; nothing platform-specific survives
/// past this boundary. All identifiers are opaque strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundEvent {
    /// Source-platform channel id.
    pub channel_id: String,
    /// Source-platform message id (Slack: message ts).
    pub message_id: String,
    pub text: Option<String>,
    /// Set when the message carries any media, regardless of subtype.
    pub has_media: bool,
    /// Display label for the sender, e.g. `Jane Doe`.
    pub sender_label: Option<String>,
    /// Display label for the source channel, e.g. `Telegram channel "News"`.
    pub channel_label: Option<String>,
    /// Source-platform id of the message this one replies to or is
    /// threaded under, when declared.
    pub reply_parent_message_id: Option<String>,
    /// True for an edit of an earlier message rather than a new one.
    pub is_edit: bool,
    /// True when the event originates from the bot's own identity.
    /// Discarded by the orchestrator to prevent relay loops.
    pub is_from_self: bool,
}
