//! Remote service configuration loaded from TOML

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::tracker::TrackOptions;

/// Where the video service lives and how patiently to poll it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up on a job after this long; unset waits until the job ends
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_ms: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: ServiceConfig = toml::from_str(s).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.base_url.trim().is_empty(), "base_url must not be empty");
        anyhow::ensure!(self.poll_interval_ms > 0, "poll_interval_ms must be positive");
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn track_options(&self) -> TrackOptions {
        TrackOptions {
            poll_interval: self.poll_interval(),
            timeout: self.timeout(),
            ..TrackOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ServiceConfig::from_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            base_url = "https://video.example.com/"
            poll_interval_ms = 500
            timeout_ms = 60000
            request_timeout_ms = 5000
        "#;
        let config = ServiceConfig::from_str(toml).unwrap();
        assert_eq!(config.base_url, "https://video.example.com/");
        assert_eq!(config.track_options().poll_interval, Duration::from_millis(500));
        assert_eq!(config.track_options().timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(ServiceConfig::from_str("poll_interval_ms = 0").is_err());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(ServiceConfig::from_str("base_url = ").is_err());
    }
}
