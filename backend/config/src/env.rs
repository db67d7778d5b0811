//! Environment handling for config values.
//!
//! Two mechanisms:
//! - `${VAR_NAME}` substitution inside YAML string values, resolved at load time.
//!   Only uppercase `[A-Z_][A-Z0-9_]*` names are matched; `$${VAR}` escapes to a literal `${VAR}`.
//! - Well-known environment variables that override file values outright.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{KunstbotConfig, LoggingConfig};

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

static ESCAPED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

pub const APP_SECRET_VAR: &str = "MESSENGER_APP_SECRET";
pub const PAGE_ACCESS_TOKEN_VAR: &str = "MESSENGER_PAGE_ACCESS_TOKEN";
pub const VALIDATION_TOKEN_VAR: &str = "MESSENGER_VALIDATION_TOKEN";
pub const SERVER_URL_VAR: &str = "SERVER_URL";
pub const PATH_PREFIX_VAR: &str = "KUNSTBOT_PATH_PREFIX";
pub const BIND_VAR: &str = "KUNSTBOT_BIND";
pub const PORT_VAR: &str = "KUNSTBOT_PORT";
pub const MOCK_VAR: &str = "KUNSTBOT_MOCK";
pub const SEARCH_URL_VAR: &str = "KUNSTBOT_SEARCH_URL";
pub const REFERENCE_URL_VAR: &str = "KUNSTBOT_REFERENCE_URL";
pub const LOG_DIR_VAR: &str = "KUNSTBOT_LOG_DIR";
pub const LOG_LEVEL_VAR: &str = "RUST_LOG";

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config JSON value tree using the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    substitute_value(value, &std::env::vars().collect(), "")
}

/// Substitute env vars using a provided map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let result: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(result?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let bytes = s.as_bytes();
    let mut error: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        if error.is_some() {
            return String::new();
        }
        // `$${VAR}` is an escape; leave it for the restore pass.
        if let Some(m) = caps.get(0) {
            if m.start() > 0 && bytes[m.start() - 1] == b'$' {
                return caps[0].to_string();
            }
        }
        let var_name = &caps[1];
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                error = Some(MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = error {
        bail!(err);
    }

    Ok(ESCAPED_PATTERN
        .replace_all(&substituted, |caps: &regex::Captures| format!("${{{}}}", &caps[1]))
        .to_string())
}

/// Apply the well-known override variables from the process environment.
pub fn apply_env_overrides(config: KunstbotConfig) -> Result<KunstbotConfig> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply override variables from a provided map. Non-empty values win over file values.
pub fn apply_env_overrides_with(
    mut config: KunstbotConfig,
    env: &HashMap<String, String>,
) -> Result<KunstbotConfig> {
    let get = |name: &str| env.get(name).filter(|v| !v.is_empty()).cloned();

    if let Some(v) = get(APP_SECRET_VAR) {
        config.app_secret = Some(v);
    }
    if let Some(v) = get(PAGE_ACCESS_TOKEN_VAR) {
        config.page_access_token = Some(v);
    }
    if let Some(v) = get(VALIDATION_TOKEN_VAR) {
        config.validation_token = Some(v);
    }
    if let Some(v) = get(SERVER_URL_VAR) {
        config.server_url = Some(v);
    }
    if let Some(v) = get(PATH_PREFIX_VAR) {
        config.path_prefix = Some(v);
    }
    if let Some(v) = get(BIND_VAR) {
        config.bind_address = Some(v);
    }
    if let Some(v) = get(PORT_VAR) {
        match v.parse::<u16>() {
            Ok(port) => config.port = Some(port),
            Err(_) => bail!("{PORT_VAR} is not a valid port: {v}"),
        }
    }
    if let Some(v) = get(MOCK_VAR) {
        config.mock_mode = Some(parse_flag(&v));
    }
    if let Some(v) = get(SEARCH_URL_VAR) {
        config.search_url = Some(v);
    }
    if let Some(v) = get(REFERENCE_URL_VAR) {
        config.reference_url = Some(v);
    }
    if let Some(v) = get(LOG_DIR_VAR) {
        config.logging.get_or_insert_with(LoggingConfig::default).dir = Some(v);
    }
    if let Some(v) = get(LOG_LEVEL_VAR) {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(v);
    }
    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
