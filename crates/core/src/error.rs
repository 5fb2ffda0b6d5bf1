use std::error::Error as StdError;

/// Crate-wide result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors shared across the store, translator and orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The exact channel pair is already registered.
    #[error("mapping already exists: telegram {telegram} <-> slack {slack}")]
    DuplicateMapping { telegram: String, slack: String },

    /// No registered channel pair matches both sides.
    #[error("mapping not found: telegram {telegram} <-> slack {slack}")]
    MappingNotFound { telegram: String, slack: String },

    /// A platform transport call failed. The relay attempt is abandoned,
    /// never retried.
    #[error("relay transport failed: {context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Persisting or loading the mapping collection failed.
    #[error("mapping storage failed: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// An identifier could not be converted at a platform boundary.
    /// Never produced inside the core, where all ids stay opaque strings.
    #[error("invalid platform identifier: {id}")]
    InvalidId { id: String },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn duplicate_mapping(telegram: impl Into<String>, slack: impl Into<String>) -> Self {
        Self::DuplicateMapping {
            telegram: telegram.into(),
            slack: slack.into(),
        }
    }

    #[must_use]
    pub fn mapping_not_found(telegram: impl Into<String>, slack: impl Into<String>) -> Self {
        Self::MappingNotFound {
            telegram: telegram.into(),
            slack: slack.into(),
        }
    }

    #[must_use]
    pub fn transport(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn storage(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId { id: id.into() }
    }
}
