use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for availability resolution and store access
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Slot step when a query does not specify one
    pub default_interval_minutes: u32,
    /// Upper bound on candidate slot starts evaluated per query
    pub max_candidates: usize,
    /// How long a store call may wait on a locked database
    pub store_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_interval_minutes: 15,
            max_candidates: 5000,
            store_timeout_secs: 5,
        }
    }
}

impl EngineSettings {
    /// Defaults overridden by `BOOKD_SLOT_INTERVAL`, `BOOKD_MAX_CANDIDATES`
    /// and `BOOKD_STORE_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(v) = env_parse("BOOKD_SLOT_INTERVAL") {
            settings.default_interval_minutes = v;
        }
        if let Some(v) = env_parse("BOOKD_MAX_CANDIDATES") {
            settings.max_candidates = v;
        }
        if let Some(v) = env_parse("BOOKD_STORE_TIMEOUT_SECS") {
            settings.store_timeout_secs = v;
        }
        settings
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Configuration stored locally on the CLI
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocalConfig {
    pub server_url: Option<String>,
    /// Display zone for availability results
    pub timezone: Option<String>,
}

impl LocalConfig {
    pub fn config_path() -> std::path::PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        std::path::PathBuf::from(home)
            .join(".config")
            .join(crate::APP_NAME)
            .join("config.json")
    }

    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}
