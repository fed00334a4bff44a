//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{LedgerError, LedgerResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "storage.ledger_dir",
    "storage.header_version",
    "storage.lock_stripes",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> LedgerResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> LedgerResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> LedgerResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> LedgerResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();
    apply_value(&mut config, key, value)?;

    config.validate().map_err(LedgerError::User)?;
    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));

    Ok(())
}

/// Apply a dot-separated key to the config
fn apply_value(config: &mut Config, key: &str, value: &str) -> LedgerResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => config.general.log_format = value.to_string(),
        ["storage", "ledger_dir"] => config.storage.ledger_dir = PathBuf::from(value),
        ["storage", "header_version"] => config.storage.header_version = parse_number(value)?,
        ["storage", "lock_stripes"] => config.storage.lock_stripes = parse_number(value)?,
        _ => {
            return Err(LedgerError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(value: &str) -> LedgerResult<T> {
    value
        .parse()
        .map_err(|_| LedgerError::User(format!("Invalid number: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_known_keys() {
        let mut config = Config::default();
        apply_value(&mut config, "storage.lock_stripes", "16").unwrap();
        apply_value(&mut config, "storage.ledger_dir", "/data/ledgers").unwrap();
        apply_value(&mut config, "general.log_format", "json").unwrap();

        assert_eq!(config.storage.lock_stripes, 16);
        assert_eq!(config.storage.ledger_dir, PathBuf::from("/data/ledgers"));
        assert_eq!(config.general.log_format, "json");
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut config = Config::default();
        let err = apply_value(&mut config, "storage.nope", "1").unwrap_err();
        assert!(err.to_string().contains("Unknown config key"));
    }

    #[test]
    fn apply_rejects_bad_number() {
        let mut config = Config::default();
        assert!(apply_value(&mut config, "storage.header_version", "one").is_err());
    }
}
