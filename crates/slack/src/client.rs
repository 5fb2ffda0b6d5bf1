use std::sync::Arc;

use {secrecy::ExposeSecret, slack_morphism::prelude::*, tracing::info};

use crosspost_config::SlackConfig;

/// An authenticated Web API client plus the bot's own identity.
pub struct SlackConnection {
    pub client: Arc<SlackHyperClient>,
    pub token: SlackApiToken,
    pub bot_user_id: Option<SlackUserId>,
}

/// Build the client and verify the bot token.
pub async fn connect(config: &SlackConfig) -> anyhow::Result<SlackConnection> {
    let client = Arc::new(SlackClient::new(SlackClientHyperConnector::new()?));

    let token = SlackApiToken::new(config.bot_token.expose_secret().into());
    let session = client.open_session(&token);
    let auth_test = session.auth_test().await?;
    let bot_user_id = Some(auth_test.user_id.clone());

    info!(
        bot_user = ?auth_test.user,
        "slack bot authenticated"
    );

    Ok(SlackConnection {
        client,
        token,
        bot_user_id,
    })
}
