// src/config.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),

    #[error("max concurrency must be at most {max}, got {0}", max = Semaphore::MAX_PERMITS)]
    InvalidConcurrency(usize),

    #[error("buffer days must be between 0 and 36500, got {0}")]
    InvalidBufferDays(i64),

    #[error("email section needs at least one recipient")]
    NoRecipients,
}

/// Top-level configuration, loaded once at startup and passed down by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub alert: AlertConfig,
    /// Mail relay settings. Without them the alert batch is only logged.
    pub email: Option<EmailConfig>,
}

/// Probe and alerting thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub timeout_seconds: f64,
    pub buffer_days: i64,
    /// In-flight probe ceiling; 0 means unbounded.
    pub max_concurrency: usize,
    pub port: u16,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { timeout_seconds: 3.0, buffer_days: 30, max_concurrency: 64, port: 443 }
    }
}

impl AlertConfig {
    /// Per-probe deadline. Values `validate` would reject saturate instead of panicking.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds).unwrap_or(Duration::MAX)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub from_addr: String,
    pub to_addrs: Vec<String>,
    pub subject: String,
    pub username: String,
    pub password: String,
}

fn default_smtp_port() -> u16 {
    587
}

impl Config {
    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config: Config = toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        Ok(config)
    }

    /// Checks the values the run depends on. Called after CLI overrides are applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.alert.timeout_seconds;
        if timeout <= 0.0 || Duration::try_from_secs_f64(timeout).is_err() {
            return Err(ConfigError::InvalidTimeout(timeout));
        }
        if self.alert.max_concurrency > Semaphore::MAX_PERMITS {
            return Err(ConfigError::InvalidConcurrency(self.alert.max_concurrency));
        }
        if !(0..=36_500).contains(&self.alert.buffer_days) {
            return Err(ConfigError::InvalidBufferDays(self.alert.buffer_days));
        }
        if let Some(email) = &self.email
            && email.to_addrs.is_empty()
        {
            return Err(ConfigError::NoRecipients);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("certwarden.toml")).unwrap();
        assert_eq!(config.alert.timeout(), Duration::from_secs(3));
        assert_eq!(config.alert.port, 443);
        assert!(config.email.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[alert]
timeout_seconds = 1.5
buffer_days = 14

[email]
server = "smtp.example.com"
from_addr = "certs@example.com"
to_addrs = ["ops@example.com", "sec@example.com"]
subject = "Certificates"
username = "certs"
password = "hunter2"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.alert.timeout(), Duration::from_millis(1500));
        assert_eq!(config.alert.buffer_days, 14);
        assert_eq!(config.alert.max_concurrency, 64);
        let email = config.email.unwrap();
        assert_eq!(email.port, 587);
        assert_eq!(email.to_addrs.len(), 2);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[alert]\nbuffer_days = \"soon\"\n").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn rejects_non_positive_timeout() {
        let mut config = Config::default();
        config.alert.timeout_seconds = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout(_))));
        config.alert.timeout_seconds = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout(_))));
    }

    #[test]
    fn rejects_timeout_too_large_for_a_duration() {
        let mut config = Config::default();
        config.alert.timeout_seconds = 1e20;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout(_))));
        config.alert.timeout_seconds = f64::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout(_))));
        assert_eq!(config.alert.timeout(), Duration::MAX);
    }

    #[test]
    fn concurrency_is_bounded_by_semaphore_capacity() {
        let mut config = Config::default();
        config.alert.max_concurrency = Semaphore::MAX_PERMITS;
        assert!(config.validate().is_ok());
        config.alert.max_concurrency = usize::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidConcurrency(usize::MAX))));
    }

    #[test]
    fn rejects_negative_buffer() {
        let mut config = Config::default();
        config.alert.buffer_days = -1;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBufferDays(-1))));
    }
}
