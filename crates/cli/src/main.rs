use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    crosspost_core::{
        MappingStore, OutboundRelay, Relay,
        storage::JsonFileStorage,
    },
    crosspost_slack::commands::format_mappings,
};

#[derive(Parser)]
#[command(name = "crosspost", about = "Crosspost — Telegram/Slack channel bridge")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides discovery).
    #[arg(long, global = true, env = "CROSSPOST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge (default when no subcommand is provided).
    Run,
    /// Channel mapping administration against the local mapping file.
    Mappings {
        #[command(subcommand)]
        action: MappingAction,
    },
}

#[derive(Subcommand)]
enum MappingAction {
    /// List all channel mappings.
    List,
    /// Add a mapping between a Telegram channel and a Slack channel.
    Add {
        telegram_channel: String,
        slack_channel: String,
    },
    /// Remove an existing mapping (both sides must match exactly).
    Remove {
        telegram_channel: String,
        slack_channel: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json_logs);

    let config = match &cli.config {
        Some(path) => crosspost_config::load_config(path)?,
        None => crosspost_config::discover_and_load(),
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Mappings { action } => manage_mappings(config, action).await,
    }
}

fn init_logging(log_level: &str, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

async fn run(config: crosspost_config::CrosspostConfig) -> anyhow::Result<()> {
    let storage = Arc::new(JsonFileStorage::new(&config.mappings_file));
    let store = Arc::new(MappingStore::load(storage).await);

    let (bot, self_id) = crosspost_telegram::connect(&config.telegram).await?;
    let slack = crosspost_slack::connect(&config.slack).await?;

    let relay = Arc::new(Relay::new(
        Arc::clone(&store),
        Arc::new(crosspost_telegram::TelegramRelay::new(bot.clone())) as Arc<dyn OutboundRelay>,
        Arc::new(crosspost_slack::SlackRelay::new(
            Arc::clone(&slack.client),
            slack.token.clone(),
        )) as Arc<dyn OutboundRelay>,
    ));

    let telegram_cancel = crosspost_telegram::start_polling(bot, self_id, Arc::clone(&relay));
    let slack_cancel = crosspost_slack::start_socket_mode(
        &config.slack,
        Arc::clone(&slack.client),
        slack.token.clone(),
        slack.bot_user_id.clone(),
        Arc::clone(&relay),
    )
    .await?;

    info!(
        mappings = store.list_mappings().await.len(),
        "crosspost bridge is running"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    telegram_cancel.cancel();
    slack_cancel.cancel();
    Ok(())
}

async fn manage_mappings(
    config: crosspost_config::CrosspostConfig,
    action: MappingAction,
) -> anyhow::Result<()> {
    let storage = Arc::new(JsonFileStorage::new(&config.mappings_file));
    let store = MappingStore::load(storage).await;

    match action {
        MappingAction::List => {
            let mappings = store.list_mappings().await;
            if mappings.is_empty() {
                println!("No channel mappings configured.");
            } else {
                println!("{}", format_mappings(&mappings));
            }
        },
        MappingAction::Add {
            telegram_channel,
            slack_channel,
        } => {
            store.add_mapping(&telegram_channel, &slack_channel).await?;
            println!("Mapping added: Telegram {telegram_channel} <-> Slack {slack_channel}");
        },
        MappingAction::Remove {
            telegram_channel,
            slack_channel,
        } => {
            store
                .remove_mapping(&telegram_channel, &slack_channel)
                .await?;
            println!("Mapping removed: Telegram {telegram_channel} <-> Slack {slack_channel}");
        },
    }
    Ok(())
}
