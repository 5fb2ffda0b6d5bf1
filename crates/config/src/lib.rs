//! Configuration schema and file loader for the crosspost bridge.
//!
//! Config is discovered as `crosspost.{toml,json}` (project-local, then
//! user config dir), with `${ENV_VAR}` substitution applied to the raw
//! file before parsing so tokens can stay out of it.

mod loader;
mod schema;

pub use {
    loader::{discover_and_load, load_config},
    schema::{CrosspostConfig, SlackConfig, TelegramConfig},
};
