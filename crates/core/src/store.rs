//! Channel-pair mappings and cross-platform message correlations.
//!
//! The store owns both collections exclusively. Channel mappings are durably
//! committed through [`MappingStorage`](crate::storage::MappingStorage) on
//! every mutation; message correlations live in memory only and are lost on
//! restart (accepted limitation — they also grow without bound, there is no
//! eviction).

use std::{collections::HashMap, sync::Arc};

use {
    serde::{Deserialize, Serialize},
    tokio::sync::RwLock,
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    platform::Platform,
    storage::MappingStorage,
};

/// A durable pairing of one Telegram channel with one Slack channel, the
/// unit of routing. The pair is unique across the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMapping {
    pub telegram_channel: String,
    pub slack_channel: String,
}

impl ChannelMapping {
    fn channel_on(&self, platform: Platform) -> &str {
        match platform {
            Platform::Telegram => &self.telegram_channel,
            Platform::Slack => &self.slack_channel,
        }
    }
}

/// One cross-posted message instance, linking its identities on both
/// platforms plus the reply parents on each side when the message was a
/// reply/thread child.
///
/// Created once when a message is first relayed and never mutated; edits
/// look the record up but do not alter it. The primary id fields are
/// optional so the store tolerates partial records defensively — a side
/// missing either id is simply not indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageCorrelation {
    pub telegram_channel_id: Option<String>,
    pub telegram_message_id: Option<String>,
    pub slack_channel_id: Option<String>,
    pub slack_message_ts: Option<String>,
    pub parent_telegram_message_id: Option<String>,
    pub parent_slack_message_ts: Option<String>,
}

impl MessageCorrelation {
    /// The message's channel id on the given platform, when known.
    #[must_use]
    pub fn channel_on(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Telegram => self.telegram_channel_id.as_deref(),
            Platform::Slack => self.slack_channel_id.as_deref(),
        }
    }

    /// The message's own id on the given platform, when known.
    #[must_use]
    pub fn message_id_on(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Telegram => self.telegram_message_id.as_deref(),
            Platform::Slack => self.slack_message_ts.as_deref(),
        }
    }

    fn key_on(&self, platform: Platform) -> Option<(String, String)> {
        let channel = self.channel_on(platform)?;
        let message = self.message_id_on(platform)?;
        Some((channel.to_string(), message.to_string()))
    }
}

/// (channel id, message id) on one platform.
type CorrelationKey = (String, String);

#[derive(Default)]
struct StoreInner {
    mappings: Vec<ChannelMapping>,
    /// Both indexes hold the same `Arc` for a given logical record, so
    /// either platform resolves to identical cross-platform id pairs.
    by_telegram: HashMap<CorrelationKey, Arc<MessageCorrelation>>,
    by_slack: HashMap<CorrelationKey, Arc<MessageCorrelation>>,
}

impl StoreInner {
    fn index_on(&self, platform: Platform) -> &HashMap<CorrelationKey, Arc<MessageCorrelation>> {
        match platform {
            Platform::Telegram => &self.by_telegram,
            Platform::Slack => &self.by_slack,
        }
    }
}

/// Registry of channel mappings and message correlations.
///
/// Reads are concurrent; every mutating operation holds the write lock
/// across its persistence await, so no caller ever observes a torn state
/// and a successful mutation is durable before control returns.
pub struct MappingStore {
    storage: Arc<dyn MappingStorage>,
    inner: RwLock<StoreInner>,
}

impl MappingStore {
    /// Load the mapping collection from storage.
    ///
    /// Malformed or unreadable persisted data degrades to an empty
    /// collection rather than failing startup.
    pub async fn load(storage: Arc<dyn MappingStorage>) -> Self {
        let mappings = match storage.load().await {
            Ok(mappings) => {
                debug!(count = mappings.len(), "loaded channel mappings");
                mappings
            },
            Err(e) => {
                warn!(error = %e, "failed to load channel mappings, starting empty");
                Vec::new()
            },
        };
        Self {
            storage,
            inner: RwLock::new(StoreInner {
                mappings,
                ..StoreInner::default()
            }),
        }
    }

    /// Snapshot copy of all channel mappings, in insertion order.
    pub async fn list_mappings(&self) -> Vec<ChannelMapping> {
        self.inner.read().await.mappings.clone()
    }

    /// Register a new channel pair and persist the collection.
    ///
    /// Fails with [`Error::DuplicateMapping`] when the exact pair already
    /// exists. A persistence failure rolls the in-memory collection back so
    /// memory never diverges from disk.
    pub async fn add_mapping(
        &self,
        telegram_channel: impl Into<String>,
        slack_channel: impl Into<String>,
    ) -> Result<()> {
        let telegram_channel = telegram_channel.into();
        let slack_channel = slack_channel.into();

        let mut inner = self.inner.write().await;
        let exists = inner.mappings.iter().any(|m| {
            m.telegram_channel == telegram_channel && m.slack_channel == slack_channel
        });
        if exists {
            return Err(Error::duplicate_mapping(telegram_channel, slack_channel));
        }

        inner.mappings.push(ChannelMapping {
            telegram_channel,
            slack_channel,
        });
        if let Err(e) = self.storage.save(&inner.mappings).await {
            inner.mappings.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Remove the channel pair matching both sides exactly and persist.
    ///
    /// Fails with [`Error::MappingNotFound`] when no exact match exists;
    /// the collection is left unchanged in that case. A persistence failure
    /// restores the removed entry at its original position.
    pub async fn remove_mapping(&self, telegram_channel: &str, slack_channel: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let Some(position) = inner.mappings.iter().position(|m| {
            m.telegram_channel == telegram_channel && m.slack_channel == slack_channel
        }) else {
            return Err(Error::mapping_not_found(telegram_channel, slack_channel));
        };

        let removed = inner.mappings.remove(position);
        if let Err(e) = self.storage.save(&inner.mappings).await {
            inner.mappings.insert(position, removed);
            return Err(e);
        }
        Ok(())
    }

    /// Resolve the channel paired with `channel_id` on the given platform.
    ///
    /// Returns the first mapping containing the channel on that side, or
    /// `None` when the channel is unmapped (an expected, silent outcome).
    pub async fn resolve_channel(&self, platform: Platform, channel_id: &str) -> Option<String> {
        let inner = self.inner.read().await;
        inner
            .mappings
            .iter()
            .find(|m| m.channel_on(platform) == channel_id)
            .map(|m| m.channel_on(platform.other()).to_string())
    }

    /// Upsert a correlation into both lookup indexes.
    ///
    /// A side missing either its channel or message id is skipped, never
    /// indexed. Last write wins when the same key is stored twice.
    pub async fn put_correlation(&self, correlation: MessageCorrelation) {
        let telegram_key = correlation.key_on(Platform::Telegram);
        let slack_key = correlation.key_on(Platform::Slack);
        let record = Arc::new(correlation);

        let mut inner = self.inner.write().await;
        if let Some(key) = telegram_key {
            inner.by_telegram.insert(key, Arc::clone(&record));
        }
        if let Some(key) = slack_key {
            inner.by_slack.insert(key, record);
        }
    }

    /// Look up a correlation by its identity on the given source platform.
    pub async fn correlation_on(
        &self,
        platform: Platform,
        channel_id: &str,
        message_id: &str,
    ) -> Option<Arc<MessageCorrelation>> {
        let inner = self.inner.read().await;
        inner
            .index_on(platform)
            .get(&(channel_id.to_string(), message_id.to_string()))
            .cloned()
    }

    /// Look up by (Telegram channel, Telegram message id).
    pub async fn correlation_by_telegram(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Option<Arc<MessageCorrelation>> {
        self.correlation_on(Platform::Telegram, channel_id, message_id)
            .await
    }

    /// Look up by (Slack channel, Slack message ts).
    pub async fn correlation_by_slack(
        &self,
        channel_id: &str,
        message_ts: &str,
    ) -> Option<Arc<MessageCorrelation>> {
        self.correlation_on(Platform::Slack, channel_id, message_ts)
            .await
    }
}
