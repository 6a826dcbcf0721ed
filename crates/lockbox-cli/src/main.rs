use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use lockbox_db::{SqliteEngine, TransactionManager};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli_args;
mod cli_command;
mod modules;

use crate::cli_args::*;
use crate::cli_command::handle_command;
use crate::modules::system::{
    handle_config_command, load_config, resolve_database, resolve_endpoint, save_config,
    CommandContext,
};

pub(crate) const DEFAULT_ENDPOINT: &str = "https://127.0.0.1:8080";
pub(crate) const DATABASE_FILE: &str = "lockbox.sqlite";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let mut config = load_config()?;

    let command = cli.command;
    if let Command::Config(args) = command {
        handle_config_command(args, &mut config)?;
        save_config(&config)?;
        return Ok(());
    }

    let endpoint = resolve_endpoint(cli.endpoint, &config);
    let database = resolve_database(cli.db, &config)?;
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(cli.insecure)
        .build()?;
    let manager = open_store(&database).await?;

    let ctx = CommandContext {
        client: &client,
        endpoint: &endpoint,
        allow_insecure: cli.insecure,
        manager,
    };
    handle_command(command, &ctx).await
}

async fn open_store(path: &Path) -> anyhow::Result<Arc<TransactionManager>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let url = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("database path is not valid UTF-8: {}", path.display()))?;
    debug!(database = %url, "opening local store");
    let engine = SqliteEngine::open(url).await?;
    Ok(Arc::new(TransactionManager::new(Arc::new(engine))))
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
