//! Service endpoints and client settings.
//!
//! Layered: built-in defaults, then an optional JSON file, then `DENGUE_*`
//! environment variables. Command-line flags are applied last by the binary.
//!
//! ```json
//! {
//!   "nominatim_url": "https://nominatim.openstreetmap.org",
//!   "locate_timeout_secs": 5
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IP geolocation service. Empty disables automatic location.
    pub ip_locate_url: String,
    pub nominatim_url: String,
    pub cep_url: String,
    pub surveillance_url: String,
    /// Sent to Nominatim, which refuses anonymous clients.
    pub user_agent: String,
    pub locate_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ip_locate_url: "http://ip-api.com".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            cep_url: "https://cep.awesomeapi.com.br".to_string(),
            surveillance_url: "https://precospublicosonline.com.br".to_string(),
            user_agent: concat!("dengue_dashboard/", env!("CARGO_PKG_VERSION")).to_string(),
            locate_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Loads a config from a JSON file at `path`; missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Applies `DENGUE_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `DENGUE_*` overrides from `lookup`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup("DENGUE_IP_LOCATE_URL") {
            self.ip_locate_url = v;
        }
        if let Some(v) = lookup("DENGUE_NOMINATIM_URL") {
            self.nominatim_url = v;
        }
        if let Some(v) = lookup("DENGUE_CEP_URL") {
            self.cep_url = v;
        }
        if let Some(v) = lookup("DENGUE_SURVEILLANCE_URL") {
            self.surveillance_url = v;
        }
        if let Some(v) = lookup("DENGUE_USER_AGENT") {
            self.user_agent = v;
        }
        if let Some(v) = lookup("DENGUE_LOCATE_TIMEOUT_SECS") {
            self.locate_timeout_secs = v.trim().parse().map_err(|_| {
                ConfigError::invalid("locate_timeout_secs", format!("not a number: {v}"))
            })?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.ip_locate_url.is_empty() {
            check_url("ip_locate_url", &self.ip_locate_url)?;
        }
        check_url("nominatim_url", &self.nominatim_url)?;
        check_url("cep_url", &self.cep_url)?;
        check_url("surveillance_url", &self.surveillance_url)?;

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::invalid("user_agent", "must not be empty"));
        }
        if self.locate_timeout_secs == 0 {
            return Err(ConfigError::invalid("locate_timeout_secs", "must be positive"));
        }
        Ok(())
    }

    pub fn locate_timeout(&self) -> Duration {
        Duration::from_secs(self.locate_timeout_secs)
    }
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(value).map_err(|e| ConfigError::invalid(field, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::invalid(field, format!("unsupported scheme {other}"))),
    }
}
