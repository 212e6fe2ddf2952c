use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Configuration for the CCTV console
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend connection settings
    pub backend: BackendConfig,

    /// Polling cadence for the synchronizer
    pub polling: PollingConfig,

    /// Operator console settings
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the anomaly-detection backend
    pub base_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Interval between status reads (seconds)
    pub status_interval_secs: u64,

    /// Interval between log count checks (seconds)
    pub log_interval_secs: u64,

    /// Capacity of the event channel handed to subscribers
    pub event_buffer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Pre-filled phone number for simulation alerts
    pub default_phone_number: String,

    /// Log level used when RUST_LOG is not set
    pub log_level: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_interval_secs: 20,
            log_interval_secs: 5,
            event_buffer: 64,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            default_phone_number: "+91".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Filter directive: this crate at the configured level, dependencies at warn
    pub fn log_directive(&self) -> String {
        format!("cctv_console={},warn", self.log_level)
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl PollingConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    pub fn log_interval(&self) -> Duration {
        Duration::from_secs(self.log_interval_secs)
    }
}

impl Config {
    /// Load configuration from an explicit file, the first default location
    /// that exists, or built-in defaults; environment overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_paths = ["cctv-console.toml", "config/cctv-console.toml"];

        let path = path.or_else(|| config_paths.iter().map(|p| Path::new(*p)).find(|p| p.exists()));

        match path {
            Some(path) => {
                let mut config = Self::from_file(path)?;
                config.apply_env();
                Ok(config)
            }
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Ok(Self::from_env())
            }
        }
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Defaults with environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(base_url) = std::env::var("CCTV_CONSOLE_BASE_URL") {
            self.backend.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("CCTV_CONSOLE_TIMEOUT") {
            match timeout.parse() {
                Ok(secs) => self.backend.request_timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring CCTV_CONSOLE_TIMEOUT={}", timeout),
            }
        }

        if let Ok(interval) = std::env::var("CCTV_CONSOLE_STATUS_INTERVAL") {
            match interval.parse() {
                Ok(secs) => self.polling.status_interval_secs = secs,
                Err(_) => tracing::warn!("Ignoring CCTV_CONSOLE_STATUS_INTERVAL={}", interval),
            }
        }

        if let Ok(interval) = std::env::var("CCTV_CONSOLE_LOG_INTERVAL") {
            match interval.parse() {
                Ok(secs) => self.polling.log_interval_secs = secs,
                Err(_) => tracing::warn!("Ignoring CCTV_CONSOLE_LOG_INTERVAL={}", interval),
            }
        }

        if let Ok(phone) = std::env::var("CCTV_CONSOLE_PHONE") {
            self.console.default_phone_number = phone;
        }

        if let Ok(log_level) = std::env::var("CCTV_CONSOLE_LOG_LEVEL") {
            self.console.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.backend.base_url)
            .map_err(|e| anyhow!("Invalid backend base_url {}: {}", self.backend.base_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("backend base_url must be http or https"));
        }

        if self.backend.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be greater than 0"));
        }

        if self.polling.status_interval_secs == 0 {
            return Err(anyhow!("status_interval_secs must be greater than 0"));
        }

        if self.polling.log_interval_secs == 0 {
            return Err(anyhow!("log_interval_secs must be greater than 0"));
        }

        if self.polling.event_buffer == 0 {
            return Err(anyhow!("event_buffer must be greater than 0"));
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "CCTV Console Configuration:\n\
            - Backend: {}\n\
            - Request Timeout: {}s\n\
            - Status Poll: every {}s\n\
            - Log Poll: every {}s\n\
            - Default Phone: {}",
            self.backend.base_url,
            self.backend.request_timeout_secs,
            self.polling.status_interval_secs,
            self.polling.log_interval_secs,
            self.console.default_phone_number,
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.backend.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.config.backend.request_timeout_secs = secs;
        self
    }

    pub fn with_status_interval(mut self, secs: u64) -> Self {
        self.config.polling.status_interval_secs = secs;
        self
    }

    pub fn with_log_interval(mut self, secs: u64) -> Self {
        self.config.polling.log_interval_secs = secs;
        self
    }

    pub fn with_phone_number(mut self, phone: impl Into<String>) -> Self {
        self.config.console.default_phone_number = phone.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
