//! `kunstbot-config` — runtime configuration for the kunstbot relay.
//!
//! Provides:
//! - Typed config schema and the resolved `Settings`
//! - YAML loading with `${ENV_VAR}` substitution
//! - Environment overrides for credentials and server options
//! - Default value application
//! - Validation and redaction for safe logging

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides, apply_env_overrides_with, resolve_env_vars,
    resolve_env_vars_with, MissingEnvVarError,
};
pub use io::{config_file_path, load_config, load_config_value};
pub use redact::redact;
pub use schema::{KunstbotConfig, LoggingConfig, Settings};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use std::path::Path;

/// Configuration that failed validation.
#[derive(Debug, thiserror::Error)]
#[error("invalid configuration: {}", .errors.join("; "))]
pub struct ConfigError {
    pub errors: Vec<String>,
}

/// Load the config file, substitute env vars, apply overrides and defaults, and validate.
///
/// This is the main entry point for loading a config at startup.
pub async fn load_and_prepare(path: &Path) -> Result<Settings> {
    let value = load_config_value(path).await?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: KunstbotConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_env_overrides(config)?;
    Ok(resolve(config)?)
}

/// Apply defaults and validate an already-merged config.
pub fn resolve(config: KunstbotConfig) -> Result<Settings, ConfigError> {
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        return Err(ConfigError {
            errors: report.errors.iter().map(ToString::to_string).collect(),
        });
    }

    let logging = config.logging.unwrap_or_default();
    Ok(Settings {
        app_secret: config.app_secret.unwrap_or_default(),
        page_access_token: config.page_access_token.unwrap_or_default(),
        validation_token: config.validation_token.unwrap_or_default(),
        server_url: config.server_url.unwrap_or_default(),
        path_prefix: config.path_prefix.unwrap_or_default(),
        bind_address: config
            .bind_address
            .unwrap_or_else(|| defaults::DEFAULT_BIND_ADDRESS.to_string()),
        port: config.port.unwrap_or(defaults::DEFAULT_PORT),
        mock_mode: config.mock_mode.unwrap_or(false),
        graph_api_url: config
            .graph_api_url
            .unwrap_or_else(|| defaults::DEFAULT_GRAPH_API_URL.to_string()),
        search_url: config
            .search_url
            .unwrap_or_else(|| defaults::DEFAULT_SEARCH_URL.to_string()),
        reference_url: config
            .reference_url
            .unwrap_or_else(|| defaults::DEFAULT_REFERENCE_URL.to_string()),
        log_level: logging
            .level
            .unwrap_or_else(|| defaults::DEFAULT_LOG_LEVEL.to_string()),
        log_dir: logging.dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_complete_config() {
        let settings = resolve(KunstbotConfig {
            app_secret: Some("secret".into()),
            page_access_token: Some("token".into()),
            validation_token: Some("verify".into()),
            server_url: Some("https://bot.example".into()),
            path_prefix: Some("/bot".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(settings.webhook_path(), "/bot/webhook");
        assert_eq!(settings.port, defaults::DEFAULT_PORT);
        assert!(!settings.mock_mode);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn missing_values_fail_with_all_errors() {
        let err = resolve(KunstbotConfig::default()).unwrap_err();
        assert_eq!(err.errors.len(), 4);
        assert!(err.to_string().contains("appSecret"));
    }
}
