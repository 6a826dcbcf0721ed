pub(crate) mod args;
pub(crate) mod config;
pub(crate) mod output;
pub(crate) mod types;

pub(crate) use config::{
    ensure_secure_endpoint, handle_config_command, load_config, resolve_database,
    resolve_endpoint, save_config,
};
pub(crate) use output::{print_json, print_message};
pub(crate) use types::{CliConfig, CommandContext};
