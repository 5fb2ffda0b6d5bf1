//! Slack transport for the crosspost bridge.
//!
//! Receives channel messages over a Socket Mode WebSocket with
//! slack-morphism, serves the mapping administration slash commands, and
//! implements the core's outbound relay contract on top of the Web API.

pub mod client;
pub mod commands;
pub mod outbound;
pub mod socket;

pub use {
    client::{SlackConnection, connect},
    outbound::SlackRelay,
    socket::start_socket_mode,
};
