use crate::cli_args::*;
use crate::modules::groups::handle_group;
use crate::modules::secrets::handle_secret;
use crate::modules::sync::{
    handle_changes, handle_clear, handle_setup, handle_status, handle_sync, handle_vaults,
};
use crate::modules::system::CommandContext;

pub(crate) async fn handle_command(command: Command, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    match command {
        Command::Vaults => handle_vaults(ctx).await?,
        Command::Setup(args) => handle_setup(args, ctx).await?,
        Command::Sync => handle_sync(ctx).await?,
        Command::Status => handle_status(ctx).await?,
        Command::Changes => handle_changes(ctx).await?,
        Command::Clear => handle_clear(ctx).await?,
        Command::Secret(args) => handle_secret(args, ctx).await?,
        Command::Group(args) => handle_group(args, ctx).await?,
        Command::Config(_) => unreachable!(),
    }

    Ok(())
}
