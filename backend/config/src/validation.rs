//! Config validation with field-path error messages.

use crate::schema::KunstbotConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &KunstbotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_credentials(config, &mut report);
    validate_urls(config, &mut report);
    validate_path_prefix(config, &mut report);
    if config.mock_mode == Some(true) {
        report.warn("mockMode", "Mock mode is on; no messages will reach the send API");
    }
    report
}

fn validate_credentials(config: &KunstbotConfig, report: &mut ValidationReport) {
    let required = [
        ("appSecret", &config.app_secret),
        ("pageAccessToken", &config.page_access_token),
        ("validationToken", &config.validation_token),
        ("serverUrl", &config.server_url),
    ];
    for (path, value) in required {
        if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
            report.error(path, "Missing required value");
        }
    }
}

fn validate_urls(config: &KunstbotConfig, report: &mut ValidationReport) {
    let urls = [
        ("serverUrl", &config.server_url),
        ("graphApiUrl", &config.graph_api_url),
        ("searchUrl", &config.search_url),
        ("referenceUrl", &config.reference_url),
    ];
    for (path, value) in urls {
        let Some(url) = value.as_deref().filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error(path, format!("Expected an http(s) URL, got '{url}'"));
        }
    }
    if let Some(url) = &config.server_url {
        if url.starts_with("http://") {
            report.warn("serverUrl", "Server URL is not https; the platform only calls https webhooks");
        }
    }
}

fn validate_path_prefix(config: &KunstbotConfig, report: &mut ValidationReport) {
    let Some(prefix) = config.path_prefix.as_deref().filter(|p| !p.is_empty()) else {
        return;
    };
    if !prefix.starts_with('/') {
        report.error("pathPrefix", "Path prefix must start with '/'");
    }
    if prefix.ends_with('/') {
        report.error("pathPrefix", "Path prefix must not end with '/'");
    }
}
