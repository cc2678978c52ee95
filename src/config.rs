// src/config.rs
//! Client configuration loaded from environment variables.

use reqwest::Url;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::SmartDeckError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL
    pub api_url: Url,
    /// Where downloaded presentations are written
    pub output_dir: PathBuf,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            output_dir: PathBuf::from("."),
            timeout: None,
        }
    }
}

impl Config {
    /// Load configuration from `SMARTDECK_*` environment variables.
    pub fn from_env() -> Result<Self, SmartDeckError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SmartDeckError> {
        let mut config = Self::default();

        if let Some(url) = lookup("SMARTDECK_API_URL") {
            config = config.with_api_url(&url)?;
        }
        if let Some(dir) = lookup("SMARTDECK_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("SMARTDECK_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                SmartDeckError::Config(format!("SMARTDECK_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: &str) -> Result<Self, SmartDeckError> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| SmartDeckError::Config(format!("Invalid API URL {url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(SmartDeckError::Config(format!(
                "API URL must be an http(s) address: {url}"
            )));
        }
        self.api_url = parsed;
        Ok(self)
    }
}
