//! Client configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (BANTER_*)
//! - TOML configuration file

use anyhow::{Context, Result};
use banter_client::Endpoint;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chat server host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Chat server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// WebSocket endpoint path.
    #[serde(default = "default_ws_path")]
    pub path: String,

    /// Flush grace before the transport closes on logout, in
    /// milliseconds.
    #[serde(default = "default_logout_grace_ms")]
    pub logout_grace_ms: u64,
}

// Default value functions
fn default_host() -> String {
    std::env::var("BANTER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())
}

fn default_port() -> u16 {
    std::env::var("BANTER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080)
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_logout_grace_ms() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_ws_path(),
            logout_grace_ms: default_logout_grace_ms(),
        }
    }
}

impl Config {
    /// Load configuration from file or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "banter.toml",
            "/etc/banter/banter.toml",
            "~/.config/banter/banter.toml",
        ];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        // Fall back to defaults with environment overrides
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// The endpoint the session connection dials.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: self.host.clone(),
            port: self.port,
            path: self.path.clone(),
        }
    }

    /// Logout flush grace as a duration.
    #[must_use]
    pub fn logout_grace(&self) -> Duration {
        Duration::from_millis(self.logout_grace_ms)
    }
}
