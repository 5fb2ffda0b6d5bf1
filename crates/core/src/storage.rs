//! Durable storage contract for the channel-mapping collection.
//!
//! The store only requires load/save of the full collection; any backend
//! satisfying that contract can sit behind it. The shipped backend is a
//! whole-file JSON rewrite, matching the persisted format: an ordered
//! sequence of `{telegram_channel, slack_channel}` records.

use std::path::PathBuf;

use {async_trait::async_trait, tokio::sync::Mutex};

use crate::{
    error::{Error, Result},
    store::ChannelMapping,
};

/// Persistent backend for the channel-mapping collection.
///
/// `save` must durably commit the full collection before returning; the
/// store calls it while holding its write lock so a successful mutating
/// operation is never observable without its persisted state.
#[async_trait]
pub trait MappingStorage: Send + Sync {
    async fn load(&self) -> Result<Vec<ChannelMapping>>;
    async fn save(&self, mappings: &[ChannelMapping]) -> Result<()>;
}

/// JSON file backend. Every save rewrites the whole file.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl MappingStorage for JsonFileStorage {
    async fn load(&self) -> Result<Vec<ChannelMapping>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::storage(
                    format!("read {}", self.path.display()),
                    e,
                ));
            },
        };
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save(&self, mappings: &[ChannelMapping]) -> Result<()> {
        let json = serde_json::to_vec_pretty(mappings)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| Error::storage(format!("write {}", self.path.display()), e))
    }
}

/// In-memory backend with no durability, for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStorage {
    mappings: Mutex<Vec<ChannelMapping>>,
}

#[async_trait]
impl MappingStorage for MemoryStorage {
    async fn load(&self) -> Result<Vec<ChannelMapping>> {
        Ok(self.mappings.lock().await.clone())
    }

    async fn save(&self, mappings: &[ChannelMapping]) -> Result<()> {
        *self.mappings.lock().await = mappings.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(telegram: &str, slack: &str) -> ChannelMapping {
        ChannelMapping {
            telegram_channel: telegram.into(),
            slack_channel: slack.into(),
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("mappings.json"));
        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_roundtrips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("mappings.json"));
        let mappings = vec![mapping("-100", "C1"), mapping("-200", "C2")];
        storage.save(&mappings).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), mappings);
    }

    #[tokio::test]
    async fn save_rewrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("mappings.json"));
        storage
            .save(&[mapping("-100", "C1"), mapping("-200", "C2")])
            .await
            .unwrap();
        storage.save(&[mapping("-300", "C3")]).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), vec![mapping("-300", "C3")]);
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        tokio::fs::write(&path, "not json").await.unwrap();
        let storage = JsonFileStorage::new(path);
        assert!(storage.load().await.is_err());
    }
}
