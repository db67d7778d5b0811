//! CLI Check-Config Command
//!
//! Prints the effective configuration with secrets masked.

use anyhow::{Context, Result};
use kunstbot_config::{redact, Settings};

pub fn render(settings: &Settings) -> Result<String> {
    let value = serde_json::to_value(settings).context("Failed to serialize settings")?;
    serde_yaml::to_string(&redact(&value)).context("Failed to render settings as YAML")
}

pub fn run(settings: &Settings) -> Result<()> {
    println!("Configuration is valid.\n");
    println!("{}", render(settings)?);
    println!("Webhook route: {}", settings.webhook_path());
    Ok(())
}
