//! Core of the crosspost bridge: channel-pair mappings, cross-platform
//! message correlation, message translation and relay orchestration.
//!
//! Platform transports (Telegram, Slack) sit outside this crate behind the
//! [`OutboundRelay`] trait and the normalized [`InboundEvent`] shape; the
//! mapping persistence backend sits behind
//! [`storage::MappingStorage`].

mod error;

pub mod event;
pub mod platform;
pub mod relay;
pub mod storage;
pub mod store;
pub mod translate;

pub use {
    error::{Error, Result},
    event::InboundEvent,
    platform::Platform,
    relay::{OutboundRelay, Relay},
    store::{ChannelMapping, MappingStore, MessageCorrelation},
};
