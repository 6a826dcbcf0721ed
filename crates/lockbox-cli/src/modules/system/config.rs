use std::fs;
use std::path::{Path, PathBuf};

use super::output::print_json;
use super::types::CliConfig;
use crate::cli_args::{ConfigArgs, ConfigCommand};
use crate::{DATABASE_FILE, DEFAULT_ENDPOINT};

pub(crate) fn handle_config_command(
    args: ConfigArgs,
    config: &mut CliConfig,
) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::SetEndpoint(args) => {
            let endpoint = args.endpoint.trim().trim_end_matches('/').to_string();
            if endpoint.is_empty() {
                anyhow::bail!("endpoint must not be empty");
            }
            config.endpoint = Some(endpoint);
        }
        ConfigCommand::SetDatabase(args) => {
            let path = args.path.trim().to_string();
            if path.is_empty() {
                anyhow::bail!("database path must not be empty");
            }
            config.database = Some(path);
        }
        ConfigCommand::Show => {
            print_json(config)?;
        }
    }
    Ok(())
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("HOME is not set"))?;
    Ok(Path::new(&home).join(".lockbox"))
}

fn config_path() -> anyhow::Result<PathBuf> {
    Ok(home_dir()?.join("config.json"))
}

pub(crate) fn load_config() -> anyhow::Result<CliConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    let config = serde_json::from_str(&contents)?;
    Ok(config)
}

pub(crate) fn save_config(config: &CliConfig) -> anyhow::Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub(crate) fn resolve_endpoint(arg: Option<String>, config: &CliConfig) -> String {
    arg.or_else(|| config.endpoint.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

pub(crate) fn resolve_database(arg: Option<String>, config: &CliConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = arg.or_else(|| config.database.clone()) {
        return Ok(PathBuf::from(path));
    }
    Ok(home_dir()?.join(DATABASE_FILE))
}

pub(crate) fn ensure_secure_endpoint(endpoint: &str, allow_insecure: bool) -> anyhow::Result<()> {
    if endpoint.starts_with("http://") && !allow_insecure {
        anyhow::bail!("refusing to use http:// without --insecure");
    }
    Ok(())
}
