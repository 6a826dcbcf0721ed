use clap::{ArgAction, Parser, Subcommand};

pub use crate::modules::groups::args::*;
pub use crate::modules::secrets::args::*;
pub use crate::modules::sync::args::*;
pub use crate::modules::system::args::*;

#[derive(Parser)]
#[command(name = "lockbox")]
#[command(about = "Local-first secret manager")]
pub struct Cli {
    #[arg(long, env = "LOCKBOX_ENDPOINT", help = "Vault server base URL")]
    pub endpoint: Option<String>,
    #[arg(long, env = "LOCKBOX_DB", help = "Path of the local SQLite store")]
    pub db: Option<String>,
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    #[arg(long, help = "Allow http:// and invalid TLS certificates")]
    pub insecure: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "List vaults available on the server")]
    Vaults,
    #[command(about = "Bind the local store to a vault and run a first sync")]
    Setup(SetupArgs),
    #[command(about = "Fetch, apply and push changes")]
    Sync,
    #[command(about = "Show the sync status of the local store")]
    Status,
    #[command(about = "Show local changes not yet pushed")]
    Changes,
    #[command(about = "Wipe the local store")]
    Clear,
    Secret(SecretArgs),
    Group(GroupArgs),
    Config(ConfigArgs),
}
