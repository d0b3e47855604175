//! Configuration management for jfsnotify.
//!
//! Uses figment to merge configuration from multiple sources:
//! 1. Default values
//! 2. Config file (TOML)
//! 3. Environment variables (`JFSNOTIFY_CLIENT__TARGET`, ...)
//! 4. Command-line arguments

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Client configuration
    #[serde(default)]
    pub client: ClientConfig,
}

/// Client-side configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Dial target (`host:port`, `unix:/path`, `unix:///path`, `ipc://name`)
    #[serde(default = "default_target")]
    pub target: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_target() -> String {
    jfsnotify_protocol::default_target()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    3000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            log_level: default_log_level(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_file: Option<&PathBuf>) -> Result<Self, figment::Error> {
        Self::figment(config_file).extract()
    }

    fn figment(config_file: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        } else {
            let default_paths = [
                PathBuf::from("/etc/jfsnotify/config.toml"),
                dirs::config_dir()
                    .unwrap_or_default()
                    .join("jfsnotify/config.toml"),
            ];

            for path in &default_paths {
                if path.exists() {
                    figment = figment.merge(Toml::file(path));
                    break;
                }
            }
        }

        // Nested keys use a double underscore: JFSNOTIFY_CLIENT__LOG_LEVEL
        figment.merge(Env::prefixed("JFSNOTIFY_").split("__"))
    }

    /// Override dial target from CLI
    pub fn with_target(mut self, target: Option<String>) -> Self {
        if let Some(t) = target {
            self.client.target = t;
        }
        self
    }

    /// Override log level from CLI
    pub fn with_log_level(mut self, log_level: Option<String>) -> Self {
        if let Some(level) = log_level {
            self.client.log_level = level;
        }
        self
    }

    /// Override connect timeout from CLI
    pub fn with_connect_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        if let Some(ms) = timeout_ms {
            self.client.connect_timeout_ms = ms;
        }
        self
    }
}
