///! CLI configuration management

use crate::api::DEFAULT_ENDPOINT;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_project: Option<String>,
    pub default_zone: Option<String>,
    pub default_output: String,
    pub api_endpoint: String,
    /// Service account key file, ADC is used when unset
    pub credentials: Option<PathBuf>,
    pub poll_interval_secs: u64,
    pub wait_timeout_secs: Option<u64>,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_project: None,
            default_zone: None,
            default_output: "table".to_string(),
            api_endpoint: DEFAULT_ENDPOINT.to_string(),
            credentials: None,
            poll_interval_secs: 5,
            wait_timeout_secs: None,
            request_timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        // Zero would poll the API in a tight loop
        config.poll_interval_secs = config.poll_interval_secs.max(1);
        config.request_timeout_secs = config.request_timeout_secs.max(1);
        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")?;
        Ok(PathBuf::from(home).join(".config/gkectl/config.toml"))
    }
}
