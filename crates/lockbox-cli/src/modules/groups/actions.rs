use lockbox_db::services::LocalServices;

use crate::cli_args::*;
use crate::modules::system::{print_json, CommandContext};

pub(crate) async fn handle_group(args: GroupArgs, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let services = LocalServices::new(&ctx.manager);
    match args.command {
        GroupCommand::List => {
            let groups = services.find_groups().await?;
            print_json(&groups)?;
        }
        GroupCommand::Get(args) => {
            let group = services
                .get_group(args.id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("group not found: {}", args.id))?;
            print_json(&group)?;
        }
    }
    Ok(())
}
