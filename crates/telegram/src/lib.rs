//! Telegram transport for the crosspost bridge.
//!
//! Receives channel posts and edits via long polling with the teloxide
//! library and implements the core's outbound relay contract on top of the
//! Bot API.

pub mod bot;
pub mod outbound;

pub use {
    bot::{connect, start_polling},
    outbound::TelegramRelay,
};
