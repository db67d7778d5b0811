//! Kunstbot configuration schema.
//!
//! `KunstbotConfig` is the file/environment layer where every field is
//! optional. `Settings` is the resolved, validated form handed to the server.

use serde::{Deserialize, Serialize};

/// Raw configuration as read from YAML and environment overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KunstbotConfig {
    /// HMAC key for `x-hub-signature` verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_secret: Option<String>,

    /// Page access token for the send API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_access_token: Option<String>,

    /// Token expected in `hub.verify_token` during subscription setup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_token: Option<String>,

    /// Public base URL of this server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    /// Optional prefix for the webhook route, e.g. `/bot`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Log outbound payloads instead of posting them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_mode: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_api_url: Option<String>,

    /// Base URL of the external search service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_url: Option<String>,

    /// Fallback target for link messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the rolling NDJSON log file; console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Resolved runtime settings. Built once at startup and shared by reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub app_secret: String,
    pub page_access_token: String,
    pub validation_token: String,
    pub server_url: String,
    pub path_prefix: String,
    pub bind_address: String,
    pub port: u16,
    pub mock_mode: bool,
    pub graph_api_url: String,
    pub search_url: String,
    pub reference_url: String,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Settings {
    /// Route of the webhook endpoint, including the optional prefix.
    pub fn webhook_path(&self) -> String {
        format!("{}/webhook", self.path_prefix)
    }

    /// `host:port` the HTTP server binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
