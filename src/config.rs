//! Automation configuration
//!
//! Loaded from `natural-automation.yaml` (or the file named by the
//! `NATURAL_AUTOMATION_CONFIG` environment variable):
//!
//! ```yaml
//! base_url: "https://www.google.com/"
//!
//! wait:
//!   timeout_secs: 10
//!   poll_interval_ms: 100
//!
//! playwright:
//!   browser: firefox
//!   headless: false
//!   server_script: extensions/playwright/server.js
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::page::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_SECS};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "NATURAL_AUTOMATION_CONFIG";

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "natural-automation.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {file}: {error}")]
    Io {
        file: String,
        error: std::io::Error,
    },

    #[error("YAML parse error in {file}: {error}")]
    Yaml {
        file: String,
        error: serde_yaml::Error,
    },
}

/// Browser types supported by the Playwright server
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BrowserType {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserType::Chromium => "chromium",
            BrowserType::Firefox => "firefox",
            BrowserType::Webkit => "webkit",
        }
    }
}

/// Playwright server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaywrightConfig {
    /// Browser to use
    #[serde(default)]
    pub browser: BrowserType,

    /// Run in headless mode
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Node.js executable, looked up on PATH
    #[serde(default = "default_node")]
    pub node: String,

    /// Script implementing the JSON-RPC Playwright server
    #[serde(default = "default_server_script")]
    pub server_script: String,

    /// Maximum time to wait for any single server response
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_headless() -> bool {
    true
}

fn default_node() -> String {
    "node".to_string()
}

fn default_server_script() -> String {
    "extensions/playwright/server.js".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: BrowserType::default(),
            headless: default_headless(),
            node: default_node(),
            server_script: default_server_script(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Element wait gate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_WAIT_TIMEOUT_SECS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl WaitConfig {
    pub fn to_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout_secs(self.timeout_secs)
            .with_poll_interval_ms(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AutomationConfig {
    /// URL opened before the first page is navigated, if any
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub wait: WaitConfig,

    #[serde(default)]
    pub playwright: PlaywrightConfig,
}

impl AutomationConfig {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            file: path.display().to_string(),
            error: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml {
            file: path.display().to_string(),
            error: e,
        })
    }

    /// Resolve which configuration file applies.
    ///
    /// An explicit path wins, then `NATURAL_AUTOMATION_CONFIG`, then
    /// `natural-automation.yaml` if it exists in the working directory.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }

    /// Load the located configuration, falling back to defaults when none exists
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match Self::locate(explicit) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
