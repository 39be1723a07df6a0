//! Lab Configuration
//!
//! Defines the runtime configuration for the wizard including:
//! - Computation service endpoint and timeouts
//! - Step transition timings
//! - Algorithm defaults applied to unset configuration keys
//!
//! Values come from `Default`, then an optional TOML file, then
//! environment variables.

use crate::error::{LabError, Result};
use crate::selection::AlgorithmDefaults;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding the service base URL
pub const ENV_API_URL: &str = "QLAB_API_URL";
/// Environment variable overriding the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "QLAB_TIMEOUT_SECS";
/// Environment variable overriding both transition delays in milliseconds
pub const ENV_TRANSITION_MS: &str = "QLAB_TRANSITION_MS";

/// Complete lab configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub api: ApiConfig,
    pub wizard: WizardConfig,
    pub defaults: AlgorithmDefaults,
}

/// Computation service endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server root, without the API prefix
    pub base_url: String,
    /// Prefix of every catalog/experiment/result route
    pub api_prefix: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_prefix: "/api/v1".to_string(),
            timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Wizard behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Delay before the target step becomes current
    pub exit_delay_ms: u64,
    /// Delay after that before new navigation is accepted
    pub settle_delay_ms: u64,
    /// Offer the static catalog when a fetch fails
    pub fallback_catalog: bool,
    /// Show placeholder results when a run fails
    pub placeholder_results: bool,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            exit_delay_ms: 300,
            settle_delay_ms: 300,
            fallback_catalog: true,
            placeholder_results: true,
        }
    }
}

impl WizardConfig {
    pub fn exit_delay(&self) -> Duration {
        Duration::from_millis(self.exit_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl LabConfig {
    /// Default config file location (`~/.config/qlab/config.toml` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("qlab").join("config.toml"))
    }

    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path`, or from the default location if it exists, then
    /// apply environment overrides.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(LabError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_toml(&std::fs::read_to_string(path)?)?
            }
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(default) => {
                    debug!("Loading config from {}", default.display());
                    Self::from_toml(&std::fs::read_to_string(default)?)?
                }
                None => Self::default(),
            },
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Override values from environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }

        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            self.api.timeout_secs = raw.trim().parse().map_err(|_| {
                LabError::Config(format!("{} must be a number of seconds, got '{}'", ENV_TIMEOUT_SECS, raw))
            })?;
        }

        if let Ok(raw) = std::env::var(ENV_TRANSITION_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                LabError::Config(format!("{} must be a number of milliseconds, got '{}'", ENV_TRANSITION_MS, raw))
            })?;
            self.wizard.exit_delay_ms = ms;
            self.wizard.settle_delay_ms = ms;
        }

        Ok(())
    }
}
