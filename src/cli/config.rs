use anyhow::Result;
use serde::Serialize;

use super::OutputFormat;
use crate::config::LocalConfig;
use crate::time::parse_zone;

/// Config show response
#[derive(Debug, Serialize)]
pub struct ConfigShowResponse {
    pub server_url: String,
    pub timezone: Option<String>,
    pub path: String,
}

impl std::fmt::Display for ConfigShowResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Server: {}", self.server_url)?;
        writeln!(
            f,
            "Timezone: {}",
            self.timezone.as_deref().unwrap_or("business default")
        )?;
        write!(f, "Config file: {}", self.path)
    }
}

/// Show current configuration
pub fn run_config_show(format: OutputFormat) -> Result<()> {
    let config = LocalConfig::load()?;
    let response = ConfigShowResponse {
        server_url: config
            .server_url
            .unwrap_or_else(|| crate::DEFAULT_SERVER_URL.to_string()),
        timezone: config.timezone,
        path: LocalConfig::config_path().display().to_string(),
    };
    format.print(&response);
    Ok(())
}

/// Set server URL (local only)
pub fn run_config_server(url: &str, format: OutputFormat) -> Result<()> {
    let mut config = LocalConfig::load().unwrap_or_default();
    config.server_url = Some(url.to_string());
    config.save()?;

    let response = super::SuccessResponse {
        message: format!("Server URL set to: {}", url),
    };
    format.print(&response);
    Ok(())
}

/// Set the default display zone for availability results
pub fn run_config_timezone(zone: &str, format: OutputFormat) -> Result<()> {
    let tz = parse_zone(zone)?;

    let mut config = LocalConfig::load().unwrap_or_default();
    config.timezone = Some(tz.name().to_string());
    config.save()?;

    let response = super::SuccessResponse {
        message: format!("Timezone set to: {}", tz.name()),
    };
    format.print(&response);
    Ok(())
}
