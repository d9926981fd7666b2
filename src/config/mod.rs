// ABOUTME: Configuration types and parsing for clusterup.yml.
// ABOUTME: Every field is optional; a missing file means all defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::hub::{DEFAULT_MAX_PARALLELISM, FanOut};

pub const CONFIG_FILENAME: &str = "clusterup.yml";
pub const CONFIG_FILENAME_ALT: &str = "clusterup.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".clusterup/config.yml";

/// Overrides the default state directory.
pub const HOME_ENV: &str = "CLUSTERUP_HOME";

pub const DEFAULT_HUB_PORT: u16 = 7527;
pub const DEFAULT_AGENT_PORT: u16 = 6416;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default = "default_hub_host")]
    pub hub_host: String,

    #[serde(default = "default_hub_port")]
    pub hub_port: u16,

    #[serde(default = "default_agent_port")]
    pub agent_port: u16,

    #[serde(default)]
    pub fanout: FanOutConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FanOutConfig {
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: usize,

    /// Per agent call; unbounded when absent.
    #[serde(default, with = "humantime_serde")]
    pub call_timeout: Option<Duration>,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            max_parallelism: default_max_parallelism(),
            call_timeout: None,
        }
    }
}

impl FanOutConfig {
    pub fn fanout(&self) -> FanOut {
        FanOut::new(self.max_parallelism).call_timeout(self.call_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            hub_host: default_hub_host(),
            hub_port: default_hub_port(),
            agent_port: default_agent_port(),
            fanout: FanOutConfig::default(),
        }
    }
}

/// `$CLUSTERUP_HOME`, else `$HOME/.clusterup`, else `./.clusterup`.
pub fn default_state_dir() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    match std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        Some(home) => PathBuf::from(home).join(".clusterup"),
        None => PathBuf::from(".clusterup"),
    }
}

fn default_hub_host() -> String {
    "localhost".to_string()
}

fn default_hub_port() -> u16 {
    DEFAULT_HUB_PORT
}

fn default_agent_port() -> u16 {
    DEFAULT_AGENT_PORT
}

fn default_max_parallelism() -> usize {
    DEFAULT_MAX_PARALLELISM
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Loading config from {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Like [`Config::discover`], but falls back to defaults when no file
    /// exists. A file that exists and fails to parse is still an error.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Err(Error::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn hub_addr(&self) -> String {
        format!("{}:{}", self.hub_host, self.hub_port)
    }

    fn validate(&self) -> Result<()> {
        if self.fanout.max_parallelism == 0 {
            return Err(Error::Config("fanout.max_parallelism must be at least 1".to_string()));
        }
        if self.hub_port == 0 || self.agent_port == 0 {
            return Err(Error::Config("hub_port and agent_port must be non-zero".to_string()));
        }
        if self.fanout.call_timeout == Some(Duration::ZERO) {
            return Err(Error::Config("fanout.call_timeout must be positive".to_string()));
        }
        Ok(())
    }
}
