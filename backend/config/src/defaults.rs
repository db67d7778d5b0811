//! Config defaults: fills in optional values left unset by file and environment.

use crate::schema::{KunstbotConfig, LoggingConfig};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/v2.6";
pub const DEFAULT_SEARCH_URL: &str = "http://localhost:8081";
pub const DEFAULT_REFERENCE_URL: &str = "https://www.rijksmuseum.nl";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: KunstbotConfig) -> KunstbotConfig {
    let config = apply_server_defaults(config);
    let config = apply_endpoint_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: KunstbotConfig) -> KunstbotConfig {
    config
        .bind_address
        .get_or_insert_with(|| DEFAULT_BIND_ADDRESS.to_string());
    config.port.get_or_insert(DEFAULT_PORT);
    config.mock_mode.get_or_insert(false);
    config.path_prefix.get_or_insert_with(String::new);
    config
}

fn apply_endpoint_defaults(mut config: KunstbotConfig) -> KunstbotConfig {
    config
        .graph_api_url
        .get_or_insert_with(|| DEFAULT_GRAPH_API_URL.to_string());
    config
        .search_url
        .get_or_insert_with(|| DEFAULT_SEARCH_URL.to_string());
    config
        .reference_url
        .get_or_insert_with(|| DEFAULT_REFERENCE_URL.to_string());
    config
}

fn apply_logging_defaults(mut config: KunstbotConfig) -> KunstbotConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config
}
