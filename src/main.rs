// ABOUTME: Main entry point for the tagall Telegram bot
// ABOUTME: Parses the CLI, sets up logging and config, wires the core, and runs the update source

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tagall::logging;
use tagall_core::{config::Config, paths};

/// Mention every member of a Telegram group in staggered batches
#[derive(Parser, Debug)]
#[command(name = "tagall")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config.toml (otherwise TAGALL_CONFIG_PATH, ./config.toml, then the XDG config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log to the console as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the bot (default)
    Run,
    /// Load and validate the configuration, then print a summary
    CheckConfig,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(Some(path)),
        None => Config::load(),
    }
}

fn check_config(config: &Config) {
    println!("Configuration OK");
    println!("  telegram:        {:?}", config.telegram);
    println!(
        "  directory:       {} (timeout {}s)",
        config.directory.api_url, config.directory.timeout_secs
    );
    println!("  owners:          {}", config.roles.owners.len());
    println!("  dnd users:       {}", config.roles.dnd_users.len());
    println!(
        "  broadcast:       {} per chunk every {}s, at most {} pending",
        config.broadcast.chunk_size,
        config.broadcast.interval_secs,
        config.broadcast.max_pending_sends
    );
    println!("  role database:   {}", config.roles_db_path().display());
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up panic hook to log panics before they crash the process
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("\nPANIC! tagall crashed with the following error:\n");
        eprintln!("{}", panic_info);
        eprintln!("\nBacktrace:");
        eprintln!("{:?}", std::backtrace::Backtrace::force_capture());
    }));

    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    if cli.command == Some(Command::CheckConfig) {
        let config = load_config(cli.config.as_deref())?;
        check_config(&config);
        return Ok(());
    }

    let _log_guard = logging::setup_logging(&paths::log_dir(), cli.json_logs)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting tagall");

    let config = load_config(cli.config.as_deref())?;
    tracing::info!(
        directory = %config.directory.api_url,
        owners = config.roles.owners.len(),
        dnd_users = config.roles.dnd_users.len(),
        chunk_size = config.broadcast.chunk_size,
        interval_secs = config.broadcast.interval_secs,
        workspace = %config.workspace.path,
        webhook = config.telegram.webhook.is_some(),
        "Configuration loaded"
    );

    run(config).await
}

#[cfg(feature = "telegram")]
async fn run(config: Config) -> Result<()> {
    use anyhow::Context;
    use std::sync::Arc;
    use tagall::platform::TelegramPlatform;
    use tagall_core::{
        directory::DirectoryClient, roles::SqliteRoleStore, AuthorizationGate,
        BroadcastScheduler, Dispatcher, MessageHandler, TokioTimer,
    };

    std::fs::create_dir_all(&config.workspace.path)
        .with_context(|| format!("Failed to create workspace {}", config.workspace.path))?;
    let store = Arc::new(SqliteRoleStore::open(config.roles_db_path())?);
    let gate = Arc::new(AuthorizationGate::load(config.owner_ids(), store)?);

    let directory = Arc::new(DirectoryClient::new(
        &config.directory.api_url,
        config.directory_timeout(),
    )?);

    let platform = TelegramPlatform::connect(&config.telegram).await?;
    let sender = Arc::new(platform.sender());

    let timer = Arc::new(TokioTimer::new(config.broadcast.max_pending_sends));
    let scheduler = BroadcastScheduler::new(
        sender.clone(),
        timer,
        config.chunk_size(),
        config.broadcast_interval(),
    );
    let dispatcher = Arc::new(Dispatcher::new(gate, directory, scheduler, config.dnd_ids()));
    let handler = Arc::new(MessageHandler::new(
        dispatcher,
        sender,
        Some(platform.bot_username().to_string()),
    ));

    tracing::info!("Bot ready - reply to a group message with !tag to mention everyone");

    let router = platform.router(handler);
    tokio::select! {
        result = platform.run(router, config.telegram.webhook.as_ref()) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down");
            Ok(())
        }
    }
}

#[cfg(not(feature = "telegram"))]
async fn run(_config: Config) -> Result<()> {
    anyhow::bail!("tagall was built without a chat platform; enable the `telegram` feature")
}
