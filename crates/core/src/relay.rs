//! Relay orchestration: routing, parent resolution, translation, outbound
//! dispatch and correlation recording.
//!
//! Transports call [`Relay::handle_event`] for every inbound event and log
//! whatever it returns; a failed relay attempt is abandoned after the
//! single outbound call, never retried, and never affects later events.

use std::sync::Arc;

use {
    async_trait::async_trait,
    tracing::{debug, trace},
};

use crate::{
    error::Result,
    event::InboundEvent,
    platform::Platform,
    store::{MappingStore, MessageCorrelation},
    translate,
};

/// Outbound capability of one platform transport.
///
/// Transport-level failures surface as
/// [`Error::Transport`](crate::Error::Transport).
#[async_trait]
pub trait OutboundRelay: Send + Sync {
    /// Post a new message, optionally as a reply/thread child of
    /// `reply_to`. Returns the destination-platform id of the new message.
    async fn send(&self, channel_id: &str, text: &str, reply_to: Option<&str>) -> Result<String>;

    /// Update the text of a previously posted message in place.
    async fn update(&self, channel_id: &str, message_id: &str, text: &str) -> Result<()>;
}

/// Bridges inbound events from either platform to the other.
pub struct Relay {
    store: Arc<MappingStore>,
    telegram: Arc<dyn OutboundRelay>,
    slack: Arc<dyn OutboundRelay>,
}

impl Relay {
    #[must_use]
    pub fn new(
        store: Arc<MappingStore>,
        telegram: Arc<dyn OutboundRelay>,
        slack: Arc<dyn OutboundRelay>,
    ) -> Self {
        Self {
            store,
            telegram,
            slack,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<MappingStore> {
        &self.store
    }

    fn outbound(&self, platform: Platform) -> &dyn OutboundRelay {
        match platform {
            Platform::Telegram => self.telegram.as_ref(),
            Platform::Slack => self.slack.as_ref(),
        }
    }

    /// Relay one inbound event from `source` to its mapped destination.
    ///
    /// Unmapped channels, self-originated events and edits of never-relayed
    /// messages are silent no-ops. Only transport and storage failures
    /// return an error.
    pub async fn handle_event(&self, source: Platform, event: InboundEvent) -> Result<()> {
        if event.is_from_self {
            trace!(platform = %source, channel = %event.channel_id, "ignoring own message");
            return Ok(());
        }

        let Some(dest_channel) = self.store.resolve_channel(source, &event.channel_id).await
        else {
            trace!(platform = %source, channel = %event.channel_id, "channel not mapped");
            return Ok(());
        };

        if event.is_edit {
            self.relay_edit(source, &event).await
        } else {
            self.relay_new(source, &dest_channel, event).await
        }
    }

    async fn relay_new(
        &self,
        source: Platform,
        dest_channel: &str,
        event: InboundEvent,
    ) -> Result<()> {
        let dest = source.other();

        // A reply is threaded on the destination only when its parent was
        // itself relayed; otherwise it degrades to a top-level message.
        let parent = match &event.reply_parent_message_id {
            Some(parent_id) => {
                self.store
                    .correlation_on(source, &event.channel_id, parent_id)
                    .await
            },
            None => None,
        };
        let reply_to = parent
            .as_ref()
            .and_then(|c| c.message_id_on(dest))
            .map(str::to_string);

        let outbound = translate::translate(&event, reply_to.as_deref());
        let dest_message_id = self
            .outbound(dest)
            .send(dest_channel, &outbound.text, outbound.reply_to_id.as_deref())
            .await?;

        debug!(
            source = %source,
            source_channel = %event.channel_id,
            source_message = %event.message_id,
            dest_channel,
            dest_message = %dest_message_id,
            threaded = reply_to.is_some(),
            "relayed message"
        );

        let correlation =
            self.correlation_for(source, &event, dest_channel, dest_message_id, reply_to);
        self.store.put_correlation(correlation).await;
        Ok(())
    }

    async fn relay_edit(&self, source: Platform, event: &InboundEvent) -> Result<()> {
        let dest = source.other();

        // Editing a message that was never relayed has no destination-side
        // effect.
        let Some(correlation) = self
            .store
            .correlation_on(source, &event.channel_id, &event.message_id)
            .await
        else {
            trace!(
                source = %source,
                channel = %event.channel_id,
                message = %event.message_id,
                "edit of uncorrelated message dropped"
            );
            return Ok(());
        };
        let (Some(dest_channel), Some(dest_message_id)) =
            (correlation.channel_on(dest), correlation.message_id_on(dest))
        else {
            return Ok(());
        };

        let outbound = translate::translate(event, None);
        self.outbound(dest)
            .update(dest_channel, dest_message_id, &outbound.text)
            .await?;

        debug!(
            source = %source,
            source_message = %event.message_id,
            dest_channel,
            dest_message = %dest_message_id,
            "relayed edit"
        );
        Ok(())
    }

    fn correlation_for(
        &self,
        source: Platform,
        event: &InboundEvent,
        dest_channel: &str,
        dest_message_id: String,
        dest_parent_id: Option<String>,
    ) -> MessageCorrelation {
        match source {
            Platform::Telegram => MessageCorrelation {
                telegram_channel_id: Some(event.channel_id.clone()),
                telegram_message_id: Some(event.message_id.clone()),
                slack_channel_id: Some(dest_channel.to_string()),
                slack_message_ts: Some(dest_message_id),
                parent_telegram_message_id: event.reply_parent_message_id.clone(),
                parent_slack_message_ts: dest_parent_id,
            },
            Platform::Slack => MessageCorrelation {
                telegram_channel_id: Some(dest_channel.to_string()),
                telegram_message_id: Some(dest_message_id),
                slack_channel_id: Some(event.channel_id.clone()),
                slack_message_ts: Some(event.message_id.clone()),
                parent_telegram_message_id: dest_parent_id,
                parent_slack_message_ts: event.reply_parent_message_id.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{Error, storage::MemoryStorage};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum RelayCall {
        Send {
            channel: String,
            text: String,
            reply_to: Option<String>,
        },
        Update {
            channel: String,
            message_id: String,
            text: String,
        },
    }

    /// Records calls and hands out sequential message ids ("ts1", "ts2", …).
    #[derive(Default)]
    struct MockOutbound {
        calls: Mutex<Vec<RelayCall>>,
        fail: bool,
    }

    impl MockOutbound {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<RelayCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OutboundRelay for MockOutbound {
        async fn send(
            &self,
            channel_id: &str,
            text: &str,
            reply_to: Option<&str>,
        ) -> Result<String> {
            if self.fail {
                return Err(Error::transport(
                    "mock send",
                    std::io::Error::other("wire down"),
                ));
            }
            let mut calls = self.calls.lock().unwrap();
            calls.push(RelayCall::Send {
                channel: channel_id.into(),
                text: text.into(),
                reply_to: reply_to.map(str::to_string),
            });
            Ok(format!("ts{}", calls.len()))
        }

        async fn update(&self, channel_id: &str, message_id: &str, text: &str) -> Result<()> {
            if self.fail {
                return Err(Error::transport(
                    "mock update",
                    std::io::Error::other("wire down"),
                ));
            }
            self.calls.lock().unwrap().push(RelayCall::Update {
                channel: channel_id.into(),
                message_id: message_id.into(),
                text: text.into(),
            });
            Ok(())
        }
    }

    struct Fixture {
        relay: Relay,
        telegram: Arc<MockOutbound>,
        slack: Arc<MockOutbound>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MappingStore::load(Arc::new(MemoryStorage::default())).await);
        let telegram = Arc::new(MockOutbound::default());
        let slack = Arc::new(MockOutbound::default());
        let relay = Relay::new(
            store,
            Arc::clone(&telegram) as Arc<dyn OutboundRelay>,
            Arc::clone(&slack) as Arc<dyn OutboundRelay>,
        );
        Fixture {
            relay,
            telegram,
            slack,
        }
    }

    fn telegram_event(channel: &str, message: &str, text: &str) -> InboundEvent {
        InboundEvent {
            channel_id: channel.into(),
            message_id: message.into(),
            text: Some(text.into()),
            ..InboundEvent::default()
        }
    }

    #[tokio::test]
    async fn unmapped_channel_produces_no_outbound_calls() {
        let f = fixture().await;
        f.relay
            .handle_event(Platform::Telegram, telegram_event("-100", "1", "hello"))
            .await
            .unwrap();
        assert!(f.slack.calls().is_empty());
        assert!(f.telegram.calls().is_empty());
    }

    #[tokio::test]
    async fn own_messages_are_discarded_before_routing() {
        let f = fixture().await;
        f.relay.store().add_mapping("-100", "C1").await.unwrap();
        let mut ev = telegram_event("-100", "1", "hello");
        ev.is_from_self = true;
        f.relay.handle_event(Platform::Telegram, ev).await.unwrap();
        assert!(f.slack.calls().is_empty());
    }

    #[tokio::test]
    async fn end_to_end_relay_stores_correlation_on_both_indexes() {
        let f = fixture().await;
        f.relay.store().add_mapping("100", "C1").await.unwrap();

        f.relay
            .handle_event(Platform::Telegram, telegram_event("100", "1", "hello"))
            .await
            .unwrap();

        assert_eq!(f.slack.calls(), vec![RelayCall::Send {
            channel: "C1".into(),
            text: "hello".into(),
            reply_to: None,
        }]);

        let store = f.relay.store();
        let by_telegram = store.correlation_by_telegram("100", "1").await.unwrap();
        let by_slack = store.correlation_by_slack("C1", "ts1").await.unwrap();
        assert_eq!(by_telegram, by_slack);
        assert_eq!(by_telegram.telegram_message_id.as_deref(), Some("1"));
        assert_eq!(by_telegram.slack_message_ts.as_deref(), Some("ts1"));
    }

    #[tokio::test]
    async fn slack_to_telegram_direction_is_symmetric() {
        let f = fixture().await;
        f.relay.store().add_mapping("100", "C1").await.unwrap();

        let ev = InboundEvent {
            channel_id: "C1".into(),
            message_id: "1714.0023".into(),
            text: Some("hi from slack".into()),
            ..InboundEvent::default()
        };
        f.relay.handle_event(Platform::Slack, ev).await.unwrap();

        assert_eq!(f.telegram.calls(), vec![RelayCall::Send {
            channel: "100".into(),
            text: "hi from slack".into(),
            reply_to: None,
        }]);
        let record = f
            .relay
            .store()
            .correlation_by_slack("C1", "1714.0023")
            .await
            .unwrap();
        assert_eq!(record.telegram_message_id.as_deref(), Some("ts1"));
    }

    #[tokio::test]
    async fn reply_with_correlated_parent_is_threaded() {
        let f = fixture().await;
        f.relay.store().add_mapping("100", "C1").await.unwrap();

        f.relay
            .handle_event(Platform::Telegram, telegram_event("100", "1", "parent"))
            .await
            .unwrap();

        let mut child = telegram_event("100", "2", "child");
        child.reply_parent_message_id = Some("1".into());
        f.relay.handle_event(Platform::Telegram, child).await.unwrap();

        let calls = f.slack.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], RelayCall::Send {
            channel: "C1".into(),
            text: "child".into(),
            reply_to: Some("ts1".into()),
        });

        // Both parent ids are recorded on the child's correlation.
        let record = f
            .relay
            .store()
            .correlation_by_telegram("100", "2")
            .await
            .unwrap();
        assert_eq!(record.parent_telegram_message_id.as_deref(), Some("1"));
        assert_eq!(record.parent_slack_message_ts.as_deref(), Some("ts1"));
    }

    #[tokio::test]
    async fn reply_with_uncorrelated_parent_degrades_to_top_level() {
        let f = fixture().await;
        f.relay.store().add_mapping("100", "C1").await.unwrap();

        let mut child = telegram_event("100", "2", "orphan reply");
        child.reply_parent_message_id = Some("99".into());
        f.relay.handle_event(Platform::Telegram, child).await.unwrap();

        assert_eq!(f.slack.calls(), vec![RelayCall::Send {
            channel: "C1".into(),
            text: "orphan reply".into(),
            reply_to: None,
        }]);
    }

    #[tokio::test]
    async fn edit_with_correlation_issues_exactly_one_update() {
        let f = fixture().await;
        f.relay.store().add_mapping("100", "C1").await.unwrap();

        f.relay
            .handle_event(Platform::Telegram, telegram_event("100", "1", "hello"))
            .await
            .unwrap();

        let mut edit = telegram_event("100", "1", "hello, edited");
        edit.is_edit = true;
        f.relay.handle_event(Platform::Telegram, edit).await.unwrap();

        let calls = f.slack.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], RelayCall::Update {
            channel: "C1".into(),
            message_id: "ts1".into(),
            text: "*(edited)*\n\nhello, edited".into(),
        });
    }

    #[tokio::test]
    async fn slack_edit_updates_the_telegram_message() {
        let f = fixture().await;
        f.relay.store().add_mapping("100", "C1").await.unwrap();

        let ev = InboundEvent {
            channel_id: "C1".into(),
            message_id: "1714.0023".into(),
            text: Some("hi".into()),
            ..InboundEvent::default()
        };
        f.relay.handle_event(Platform::Slack, ev).await.unwrap();

        let edit = InboundEvent {
            channel_id: "C1".into(),
            message_id: "1714.0023".into(),
            text: Some("hi, edited".into()),
            is_edit: true,
            ..InboundEvent::default()
        };
        f.relay.handle_event(Platform::Slack, edit).await.unwrap();

        let calls = f.telegram.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], RelayCall::Update {
            channel: "100".into(),
            message_id: "ts1".into(),
            text: "*(edited)*\n\nhi, edited".into(),
        });
    }

    #[tokio::test]
    async fn edit_without_correlation_is_a_no_op() {
        let f = fixture().await;
        f.relay.store().add_mapping("100", "C1").await.unwrap();

        let mut edit = telegram_event("100", "42", "never relayed");
        edit.is_edit = true;
        f.relay.handle_event(Platform::Telegram, edit).await.unwrap();

        assert!(f.slack.calls().is_empty());
    }

    #[tokio::test]
    async fn edit_never_creates_a_new_correlation() {
        let f = fixture().await;
        f.relay.store().add_mapping("100", "C1").await.unwrap();

        f.relay
            .handle_event(Platform::Telegram, telegram_event("100", "1", "hello"))
            .await
            .unwrap();
        let before = f
            .relay
            .store()
            .correlation_by_telegram("100", "1")
            .await
            .unwrap();

        let mut edit = telegram_event("100", "1", "hello again");
        edit.is_edit = true;
        f.relay.handle_event(Platform::Telegram, edit).await.unwrap();

        let after = f
            .relay
            .store()
            .correlation_by_telegram("100", "1")
            .await
            .unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_and_stores_nothing() {
        let store = Arc::new(MappingStore::load(Arc::new(MemoryStorage::default())).await);
        store.add_mapping("100", "C1").await.unwrap();
        let relay = Relay::new(
            store,
            Arc::new(MockOutbound::default()),
            Arc::new(MockOutbound::failing()),
        );

        let err = relay
            .handle_event(Platform::Telegram, telegram_event("100", "1", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert!(
            relay
                .store()
                .correlation_by_telegram("100", "1")
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn failed_relay_does_not_block_later_messages() {
        let store = Arc::new(MappingStore::load(Arc::new(MemoryStorage::default())).await);
        store.add_mapping("100", "C1").await.unwrap();
        let telegram = Arc::new(MockOutbound::default());
        let flaky = Arc::new(MockOutbound::failing());
        let relay = Relay::new(Arc::clone(&store), telegram, flaky);

        let _ = relay
            .handle_event(Platform::Telegram, telegram_event("100", "1", "lost"))
            .await;

        // The same relay keeps serving the other direction.
        let ev = InboundEvent {
            channel_id: "C1".into(),
            message_id: "1714.0023".into(),
            text: Some("still flowing".into()),
            ..InboundEvent::default()
        };
        relay.handle_event(Platform::Slack, ev).await.unwrap();
        assert!(store.correlation_by_slack("C1", "1714.0023").await.is_some());
    }
}
