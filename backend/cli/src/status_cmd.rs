//! CLI Status Command
//!
//! Queries the health endpoint of a running server.

use anyhow::{Context, Result};
use kunstbot_config::Settings;

pub fn health_url(settings: &Settings) -> String {
    format!("{}/api/health", settings.server_url.trim_end_matches('/'))
}

pub async fn run(settings: &Settings) -> Result<()> {
    let url = health_url(settings);
    println!("kunstbot status: checking {url}...");

    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) => {
            let body: serde_json::Value = resp
                .json()
                .await
                .context("Health endpoint returned invalid JSON")?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Err(_) => {
            println!("kunstbot is not reachable at {}", settings.server_url);
        }
    }
    Ok(())
}
