//! Configuration loading and typed config structures for the live monitor.
//!
//! The configuration lives in `livemon-config.yaml` next to the binary.
//! Every field has a default, so an absent file or a partial file is valid.
//! Environment variables are applied on top of the parsed YAML so container
//! deployments can override ports and limits without editing the file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level monitor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MonitorConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Per-channel broadcast intervals.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Bounded event log settings.
    #[serde(default)]
    pub log_buffer: LogBufferConfig,

    /// Per-IP request limits for `/api/*`.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Cross-origin settings.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Process logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MonitorConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    /// Environment overrides and validation apply in both cases.
    ///
    /// # Errors
    ///
    /// See [`MonitorConfig::from_file`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    fn load_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            Self::parse(&std::fs::read_to_string(path)?)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// Recognized variables: `HOST`, `PORT`, `WS_PORT`,
    /// `LOG_BUFFER_CAPACITY`, `RATE_LIMIT_MAX`, `CORS_ORIGINS`
    /// (comma separated) and `LOG_FORMAT` (`json` enables JSON output).
    /// Values that fail to parse are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|v| v.parse().ok()) {
            self.server.http_port = port;
        }
        if let Some(port) = lookup("WS_PORT").and_then(|v| v.parse().ok()) {
            self.server.ws_port = Some(port);
        }
        if let Some(capacity) = lookup("LOG_BUFFER_CAPACITY").and_then(|v| v.parse().ok()) {
            self.log_buffer.capacity = capacity;
        }
        if let Some(max) = lookup("RATE_LIMIT_MAX").and_then(|v| v.parse().ok()) {
            self.rate_limit.max_requests = max;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.cors.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.json = format.eq_ignore_ascii_case("json");
        }
    }

    /// Check value ranges that YAML types cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero buffer capacity, a zero
    /// broadcast interval, a zero rate-limit window or request budget.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_buffer.capacity == 0 {
            return Err(invalid("log_buffer.capacity must be at least 1"));
        }
        for (name, ms) in [
            ("sovereignty_ms", self.broadcast.sovereignty_ms),
            ("wallet_ms", self.broadcast.wallet_ms),
            ("nodes_ms", self.broadcast.nodes_ms),
            ("logs_ms", self.broadcast.logs_ms),
        ] {
            if ms == 0 {
                return Err(invalid(&format!("broadcast.{name} must be at least 1")));
            }
        }
        if self.rate_limit.window_ms == 0 {
            return Err(invalid("rate_limit.window_ms must be at least 1"));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(invalid("rate_limit.max_requests must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Address to bind (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Dedicated `WebSocket` port. When unset or equal to `http_port`
    /// the `WebSocket` endpoint is served on the HTTP listener.
    #[serde(default)]
    pub ws_port: Option<u16>,
}

impl ServerSection {
    /// The separate `WebSocket` port, if one is configured.
    pub fn dedicated_ws_port(&self) -> Option<u16> {
        self.ws_port.filter(|port| *port != self.http_port)
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            ws_port: None,
        }
    }
}

/// Broadcast interval per channel, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastConfig {
    /// Sovereignty channel interval.
    #[serde(default = "default_sovereignty_ms")]
    pub sovereignty_ms: u64,

    /// Wallet channel interval.
    #[serde(default = "default_wallet_ms")]
    pub wallet_ms: u64,

    /// Nodes channel interval.
    #[serde(default = "default_nodes_ms")]
    pub nodes_ms: u64,

    /// Logs channel interval.
    #[serde(default = "default_logs_ms")]
    pub logs_ms: u64,
}

impl BroadcastConfig {
    /// Sovereignty interval as a [`Duration`].
    pub const fn sovereignty(&self) -> Duration {
        Duration::from_millis(self.sovereignty_ms)
    }

    /// Wallet interval as a [`Duration`].
    pub const fn wallet(&self) -> Duration {
        Duration::from_millis(self.wallet_ms)
    }

    /// Nodes interval as a [`Duration`].
    pub const fn nodes(&self) -> Duration {
        Duration::from_millis(self.nodes_ms)
    }

    /// Logs interval as a [`Duration`].
    pub const fn logs(&self) -> Duration {
        Duration::from_millis(self.logs_ms)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            sovereignty_ms: default_sovereignty_ms(),
            wallet_ms: default_wallet_ms(),
            nodes_ms: default_nodes_ms(),
            logs_ms: default_logs_ms(),
        }
    }
}

/// Bounded event log configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogBufferConfig {
    /// Maximum records kept in memory.
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
}

impl Default for LogBufferConfig {
    fn default() -> Self {
        Self {
            capacity: default_log_capacity(),
        }
    }
}

/// Fixed-window rate limit applied per client IP.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in milliseconds.
    #[serde(default = "default_rate_window_ms")]
    pub window_ms: u64,

    /// Requests allowed per IP per window.
    #[serde(default = "default_rate_max_requests")]
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_rate_window_ms(),
            max_requests: default_rate_max_requests(),
        }
    }
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_http_port() -> u16 {
    3001
}

const fn default_sovereignty_ms() -> u64 {
    10_000
}

const fn default_wallet_ms() -> u64 {
    15_000
}

const fn default_nodes_ms() -> u64 {
    12_000
}

const fn default_logs_ms() -> u64 {
    5_000
}

const fn default_log_capacity() -> usize {
    1000
}

const fn default_rate_window_ms() -> u64 {
    900_000
}

const fn default_rate_max_requests() -> u32 {
    100
}

fn default_log_level() -> String {
    String::from("info")
}
