use lockbox_core::{Secret, SecretQuery};
use lockbox_db::services::LocalServices;

use crate::cli_args::*;
use crate::modules::system::{print_json, print_message, CommandContext};

pub(crate) async fn handle_secret(args: SecretArgs, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let services = LocalServices::new(&ctx.manager);
    match args.command {
        SecretCommand::List(args) => {
            let query = SecretQuery {
                group: args.group,
                keyword: args.keyword.filter(|keyword| !keyword.trim().is_empty()),
            };
            let secrets = services.find_secrets(&query).await?;
            print_json(&secrets)?;
        }
        SecretCommand::Get(args) => {
            let secret = services
                .get_secret(args.id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("secret not found: {}", args.id))?;
            print_json(&secret)?;
        }
        SecretCommand::Add(args) => {
            let secret = Secret {
                id: None,
                group_id: args.group,
                resource: args.resource,
                principal: args.principal,
                password: args.password,
                note: args.note,
            };
            let saved = services.save_secret(secret).await?;
            print_json(&saved)?;
        }
        SecretCommand::Update(args) => {
            let mut secret = services
                .get_secret(args.id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("secret not found: {}", args.id))?;
            apply_update(&mut secret, args);
            let saved = services.save_secret(secret).await?;
            print_json(&saved)?;
        }
        SecretCommand::Remove(args) => {
            services.remove_secret(args.id).await?;
            print_message("Secret removed");
        }
    }
    Ok(())
}

fn apply_update(secret: &mut Secret, args: SecretUpdateArgs) {
    if let Some(group) = args.group {
        secret.group_id = group;
    }
    if let Some(resource) = args.resource {
        secret.resource = resource;
    }
    if let Some(principal) = args.principal {
        secret.principal = principal;
    }
    if let Some(password) = args.password {
        secret.password = password;
    }
    if let Some(note) = args.note {
        secret.note = note;
    }
}
