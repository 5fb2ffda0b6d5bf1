//! Mapping administration over Slack slash commands.
//!
//! `/list-mappings` is open to everyone; `/add-mapping` and
//! `/remove-mapping` require the caller to be on the admin list. Store
//! errors are surfaced verbatim in the command response and are never
//! fatal.

use {
    crosspost_core::{ChannelMapping, MappingStore},
    tracing::info,
};

const USAGE_ADD: &str = "Usage: /add-mapping [Telegram Channel ID] [Slack Channel ID]";
const USAGE_REMOVE: &str = "Usage: /remove-mapping [Telegram Channel ID] [Slack Channel ID]";
const NOT_ADMIN: &str =
    "You do not have permission to manage channel mappings. This action requires admin privileges.";

/// Handle one slash command. Returns `None` for commands that are not ours.
pub async fn handle_command(
    store: &MappingStore,
    admin_users: &[String],
    user_id: &str,
    command: &str,
    text: &str,
) -> Option<String> {
    let command = command.trim_start_matches('/');
    match command {
        "list-mappings" => Some(list_mappings(store).await),
        "add-mapping" => Some(add_mapping(store, admin_users, user_id, text).await),
        "remove-mapping" => Some(remove_mapping(store, admin_users, user_id, text).await),
        _ => None,
    }
}

async fn list_mappings(store: &MappingStore) -> String {
    let mappings = store.list_mappings().await;
    if mappings.is_empty() {
        return "No channel mappings configured.".to_string();
    }
    format_mappings(&mappings)
}

async fn add_mapping(
    store: &MappingStore,
    admin_users: &[String],
    user_id: &str,
    text: &str,
) -> String {
    if !is_admin(admin_users, user_id) {
        return NOT_ADMIN.to_string();
    }
    let Some((telegram, slack)) = parse_pair(text) else {
        return USAGE_ADD.to_string();
    };
    match store.add_mapping(telegram, slack).await {
        Ok(()) => {
            info!(user_id, "mapping added via slash command");
            format!("Mapping added: Telegram `{telegram}` ↔ Slack `{slack}`")
        },
        Err(e) => format!("Error adding mapping: {e}"),
    }
}

async fn remove_mapping(
    store: &MappingStore,
    admin_users: &[String],
    user_id: &str,
    text: &str,
) -> String {
    if !is_admin(admin_users, user_id) {
        return NOT_ADMIN.to_string();
    }
    let Some((telegram, slack)) = parse_pair(text) else {
        return USAGE_REMOVE.to_string();
    };
    match store.remove_mapping(telegram, slack).await {
        Ok(()) => {
            info!(user_id, "mapping removed via slash command");
            format!("Mapping removed: Telegram `{telegram}` ↔ Slack `{slack}`")
        },
        Err(e) => format!("Error removing mapping: {e}"),
    }
}

fn is_admin(admin_users: &[String], user_id: &str) -> bool {
    admin_users.iter().any(|u| u == user_id)
}

/// Split command text into exactly two ids.
fn parse_pair(text: &str) -> Option<(&str, &str)> {
    let mut parts = text.split_whitespace();
    let first = parts.next()?;
    let second = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((first, second))
}

/// Render the mapping collection for a command response.
pub fn format_mappings(mappings: &[ChannelMapping]) -> String {
    let mut out = String::from("*Current Channel Mappings:*\n\n");
    for mapping in mappings {
        out.push_str(&format!(
            "• Telegram: `{}` ↔ Slack: `{}`\n",
            mapping.telegram_channel, mapping.slack_channel
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crosspost_core::storage::MemoryStorage;

    use super::*;

    async fn store() -> MappingStore {
        MappingStore::load(Arc::new(MemoryStorage::default())).await
    }

    fn admins() -> Vec<String> {
        vec!["U_ADMIN".to_string()]
    }

    #[tokio::test]
    async fn unknown_command_is_not_ours() {
        let store = store().await;
        assert!(
            handle_command(&store, &admins(), "U_ADMIN", "/weather", "")
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn list_is_open_to_everyone() {
        let store = store().await;
        let reply = handle_command(&store, &admins(), "U_RANDOM", "/list-mappings", "")
            .await
            .unwrap();
        assert_eq!(reply, "No channel mappings configured.");
    }

    #[tokio::test]
    async fn add_requires_admin() {
        let store = store().await;
        let reply = handle_command(&store, &admins(), "U_RANDOM", "/add-mapping", "-100 C1")
            .await
            .unwrap();
        assert_eq!(reply, NOT_ADMIN);
        assert!(store.list_mappings().await.is_empty());
    }

    #[tokio::test]
    async fn add_then_list_shows_the_pair() {
        let store = store().await;
        let reply = handle_command(&store, &admins(), "U_ADMIN", "/add-mapping", "-100 C1")
            .await
            .unwrap();
        assert_eq!(reply, "Mapping added: Telegram `-100` ↔ Slack `C1`");

        let listing = handle_command(&store, &admins(), "U_ADMIN", "/list-mappings", "")
            .await
            .unwrap();
        assert!(listing.contains("Telegram: `-100` ↔ Slack: `C1`"));
    }

    #[tokio::test]
    async fn duplicate_add_surfaces_store_error_verbatim() {
        let store = store().await;
        store.add_mapping("-100", "C1").await.unwrap();
        let reply = handle_command(&store, &admins(), "U_ADMIN", "/add-mapping", "-100 C1")
            .await
            .unwrap();
        assert_eq!(
            reply,
            "Error adding mapping: mapping already exists: telegram -100 <-> slack C1"
        );
    }

    #[tokio::test]
    async fn remove_unknown_surfaces_store_error_verbatim() {
        let store = store().await;
        let reply = handle_command(&store, &admins(), "U_ADMIN", "/remove-mapping", "-100 C1")
            .await
            .unwrap();
        assert_eq!(
            reply,
            "Error removing mapping: mapping not found: telegram -100 <-> slack C1"
        );
    }

    #[tokio::test]
    async fn malformed_arguments_return_usage() {
        let store = store().await;
        let reply = handle_command(&store, &admins(), "U_ADMIN", "/add-mapping", "-100")
            .await
            .unwrap();
        assert_eq!(reply, USAGE_ADD);

        let reply = handle_command(&store, &admins(), "U_ADMIN", "/add-mapping", "a b c")
            .await
            .unwrap();
        assert_eq!(reply, USAGE_ADD);
    }
}
