use lockbox_core::RemoteId;
use lockbox_db::services::LocalServices;
use serde_json::json;
use tracing::info;

use crate::cli_args::SetupArgs;
use crate::modules::system::{print_json, print_message, CommandContext};

pub(crate) async fn handle_vaults(ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let vaults = ctx.sync_engine()?.list_vaults().await?;
    print_json(&vaults)
}

pub(crate) async fn handle_setup(args: SetupArgs, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let vault_id = args.vault_id.trim();
    if vault_id.is_empty() {
        anyhow::bail!("vault id must not be empty");
    }
    let status = ctx
        .sync_engine()?
        .setup(RemoteId::from(vault_id))
        .await?;
    info!(vault_id = %status.vault.id, "setup complete");
    print_json(&status)
}

pub(crate) async fn handle_sync(ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let status = ctx.sync_engine()?.sync().await?;
    print_json(&status)
}

pub(crate) async fn handle_status(ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let services = LocalServices::new(&ctx.manager);
    let status = services.get_sync_status().await?;
    let changes = services.get_unsynced_changes().await?;
    print_json(&json!({
        "status": status,
        "dirty": changes.is_dirty(),
        "pending": changes.len(),
    }))
}

pub(crate) async fn handle_changes(ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let changes = LocalServices::new(&ctx.manager)
        .get_unsynced_changes()
        .await?;
    print_json(&changes)
}

pub(crate) async fn handle_clear(ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    LocalServices::new(&ctx.manager).clear().await?;
    print_message("Local store cleared");
    Ok(())
}
