use clap::{Args, Subcommand};

#[derive(Args)]
pub struct SecretArgs {
    #[command(subcommand)]
    pub command: SecretCommand,
}

#[derive(Subcommand)]
pub enum SecretCommand {
    #[command(about = "List secrets, optionally filtered")]
    List(SecretListArgs),
    Get(SecretGetArgs),
    #[command(about = "Create a secret (recorded for the next sync)")]
    Add(SecretAddArgs),
    #[command(about = "Change fields of an existing secret")]
    Update(SecretUpdateArgs),
    Remove(SecretRemoveArgs),
}

#[derive(Args)]
pub struct SecretListArgs {
    #[arg(long, help = "Only secrets of this group")]
    pub group: Option<i64>,
    #[arg(long, help = "Case-insensitive match on resource, principal and note")]
    pub keyword: Option<String>,
}

#[derive(Args)]
pub struct SecretGetArgs {
    pub id: i64,
}

#[derive(Args)]
pub struct SecretAddArgs {
    #[arg(long)]
    pub group: i64,
    #[arg(long)]
    pub resource: String,
    #[arg(long, default_value = "")]
    pub principal: String,
    #[arg(long, env = "LOCKBOX_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long, default_value = "")]
    pub note: String,
}

#[derive(Args)]
pub struct SecretUpdateArgs {
    pub id: i64,
    #[arg(long)]
    pub group: Option<i64>,
    #[arg(long)]
    pub resource: Option<String>,
    #[arg(long)]
    pub principal: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args)]
pub struct SecretRemoveArgs {
    pub id: i64,
}
