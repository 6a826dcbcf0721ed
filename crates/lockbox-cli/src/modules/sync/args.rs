use clap::Args;

#[derive(Args)]
pub struct SetupArgs {
    #[arg(help = "Vault ID as listed by `lockbox vaults`")]
    pub vault_id: String,
}
