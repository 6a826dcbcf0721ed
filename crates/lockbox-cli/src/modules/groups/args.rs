use clap::{Args, Subcommand};

#[derive(Args)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub command: GroupCommand,
}

#[derive(Subcommand)]
pub enum GroupCommand {
    List,
    Get(GroupGetArgs),
}

#[derive(Args)]
pub struct GroupGetArgs {
    pub id: i64,
}
