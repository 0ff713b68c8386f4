mod availability;
mod booking;
mod config;
mod seed;

pub use availability::*;
pub use booking::*;
pub use config::*;
pub use seed::*;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::LocalConfig;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn print<T: Serialize + std::fmt::Display>(&self, value: &T) {
        match self {
            OutputFormat::Human => println!("{}", value),
            OutputFormat::Json => match serde_json::to_string_pretty(value) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to encode output: {}", e),
            },
        }
    }
}

/// Error body returned by the server
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.error, code),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

impl std::fmt::Display for SuccessResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Get the API client for making requests to the server
pub fn get_api_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")
}

/// Get the server URL from config or default
pub fn get_server_url() -> String {
    LocalConfig::load()
        .ok()
        .and_then(|c| c.server_url)
        .unwrap_or_else(|| crate::DEFAULT_SERVER_URL.to_string())
}

/// Build a versioned API URL
pub fn api_url(path: &str) -> String {
    format!(
        "{}/{}/{}",
        get_server_url().trim_end_matches('/'),
        crate::API_VERSION,
        path.trim_start_matches('/')
    )
}

/// Turn a non-success response into an error carrying the server's message
pub async fn check_response(resp: reqwest::Response, action: &str) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(error) => anyhow::bail!("Failed to {}: {}", action, error),
        Err(_) => anyhow::bail!("Failed to {}: {} {}", action, status, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_display() {
        let error: ErrorResponse = serde_json::from_str(
            r#"{"error": "slot starting at 2026-03-02 10:00:00 UTC is no longer available", "code": "slot_no_longer_available"}"#,
        )
        .unwrap();
        assert!(error.to_string().ends_with("(slot_no_longer_available)"));

        let bare: ErrorResponse = serde_json::from_str(r#"{"error": "boom"}"#).unwrap();
        assert_eq!(bare.to_string(), "boom");
    }
}
