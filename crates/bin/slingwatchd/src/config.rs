//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `slingwatch.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use slingwatch_app::box_settings::{self, BoxSettings};
use slingwatch_app::remote_codes::{CHANNEL_DOWN_KEY, CHANNEL_UP_KEY, LAST_CHANNEL_KEY, RemoteCodes};
use slingwatch_domain::registry::BoxRegistry;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Snapshot file settings.
    pub storage: StorageConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// IR key codes of the named remote buttons (`Ch+`, `Ch-`, `Last`).
    pub remote_codes: HashMap<String, String>,
    /// Server-wide streaming URLs.
    pub streaming: StreamingConfig,
    /// Per-box overrides, applied to restored boxes and to boxes discovered later.
    pub boxes: Vec<BoxConfig>,
    /// Notification bus settings.
    pub events: EventsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Snapshot persistence configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON status file.
    pub status_file: String,
    /// Extra write attempts after a failed save.
    pub retries: u32,
    /// Pause between write attempts, in milliseconds.
    pub retry_delay_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Server-wide URLs stored alongside the boxes. Empty means "keep what the
/// snapshot has".
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    pub url_base: String,
    pub tv_guide_url: String,
    pub remote_control_service_url: String,
}

/// Overrides for one box.
#[derive(Debug, Deserialize)]
pub struct BoxConfig {
    pub name: String,
    /// Whether the box has an analogue tuner.
    pub analogue: Option<bool>,
    /// Guide URL replacing the server-wide one for this box.
    pub tv_guide_url: Option<String>,
}

/// Notification bus configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast channel capacity.
    pub capacity: usize,
}

impl Config {
    /// Load configuration from `slingwatch.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("slingwatch.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SLINGWATCH_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("SLINGWATCH_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("SLINGWATCH_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("SLINGWATCH_STATUS_FILE") {
            self.storage.status_file = val;
        }
        if let Some(val) = var("SLINGWATCH_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.events.capacity == 0 {
            return Err(ConfigError::Validation(
                "events capacity must be non-zero".to_string(),
            ));
        }
        self.remote_codes()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Pause between snapshot write attempts.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.storage.retry_delay_ms)
    }

    /// Validated remote key codes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when a code is missing, not a
    /// number, or shared by two buttons.
    pub fn remote_codes(&self) -> Result<RemoteCodes, ConfigError> {
        RemoteCodes::from_map(&self.remote_codes)
            .map_err(|err| ConfigError::Validation(err.to_string()))
    }

    /// Apply the `[streaming]` URLs and `[[boxes]]` overrides to a restored
    /// registry. Boxes the registry does not know yet are left to the reader,
    /// which applies their settings when the roster line registers them.
    pub fn apply_to(&self, registry: &mut BoxRegistry) {
        let streaming = &self.streaming;
        if !streaming.url_base.is_empty() {
            registry.set_url_base(streaming.url_base.as_str());
        }
        if !streaming.tv_guide_url.is_empty() {
            registry.set_server_tv_guide_url(streaming.tv_guide_url.as_str());
        }
        if !streaming.remote_control_service_url.is_empty() {
            registry.set_remote_control_service_url(streaming.remote_control_service_url.as_str());
        }

        for name in box_settings::apply_all(&self.box_settings(), registry) {
            debug!(box_name = %name, "configured box not registered yet, deferring to discovery");
        }
    }

    /// The `[[boxes]]` entries as reader settings.
    #[must_use]
    pub fn box_settings(&self) -> Vec<BoxSettings> {
        self.boxes.iter().map(BoxConfig::to_settings).collect()
    }
}

impl BoxConfig {
    fn to_settings(&self) -> BoxSettings {
        BoxSettings {
            name: self.name.clone(),
            analogue: self.analogue,
            tv_guide_url: self.tv_guide_url.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            remote_codes: default_remote_codes(),
            streaming: StreamingConfig::default(),
            boxes: Vec::new(),
            events: EventsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            status_file: "SlingBoxStatus.json".to_string(),
            retries: 3,
            retry_delay_ms: 2000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "slingwatchd=info,slingwatch=info,console=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

/// Key codes used when `[remote_codes]` is absent.
fn default_remote_codes() -> HashMap<String, String> {
    let codes = RemoteCodes::default();
    HashMap::from([
        (CHANNEL_UP_KEY.to_string(), codes.channel_up().to_string()),
        (CHANNEL_DOWN_KEY.to_string(), codes.channel_down().to_string()),
        (LAST_CHANNEL_KEY.to_string(), codes.last_channel().to_string()),
    ])
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
