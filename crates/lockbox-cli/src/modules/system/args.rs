use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Set the default vault server URL")]
    SetEndpoint(SetEndpointArgs),
    #[command(about = "Set the default local store path")]
    SetDatabase(SetDatabaseArgs),
    #[command(about = "Print the stored configuration")]
    Show,
}

#[derive(Args)]
pub struct SetEndpointArgs {
    #[arg(help = "Server base URL")]
    pub endpoint: String,
}

#[derive(Args)]
pub struct SetDatabaseArgs {
    #[arg(help = "Path of the SQLite file")]
    pub path: String,
}
