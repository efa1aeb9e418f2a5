use crate::core::{AdminError, Result};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "app.toml";
pub const DEFAULT_PROXY_PATH: &str = "nutcracker.yml";
pub const DEFAULT_STORE_PATH: &str = "passwd.toml";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Tool configuration
///
/// Read from a small TOML file:
///
/// ```toml
/// proxy = "/etc/nutcracker/nutcracker.yml"
/// timeout = 3
/// store = "passwd.toml"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// twemproxy pool file describing the cluster
    pub proxy: PathBuf,

    /// Credential store file
    pub store: PathBuf,

    /// Connect, read and write timeout for each instance
    pub timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    proxy: Option<PathBuf>,
    store: Option<PathBuf>,
    /// Seconds
    timeout: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            proxy: PathBuf::from(DEFAULT_PROXY_PATH),
            store: PathBuf::from(DEFAULT_STORE_PATH),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AdminError::Config(format!("{}: {}", path.display(), e)));
            }
        };
        Self::from_toml_str(&text)
            .map_err(|e| AdminError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| AdminError::Config(e.to_string()))?;
        let mut config = Self::default();
        if let Some(proxy) = raw.proxy {
            config.proxy = proxy;
        }
        if let Some(store) = raw.store {
            config.store = store;
        }
        if let Some(secs) = raw.timeout {
            config.timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    /// Set the topology file
    pub fn proxy<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.proxy = path.into();
        self
    }

    /// Set the credential store file
    pub fn store<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.store = path.into();
        self
    }

    /// Set the per-instance timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(AdminError::Config("timeout must be greater than 0".to_string()));
        }
        if self.proxy.as_os_str().is_empty() {
            return Err(AdminError::Config("proxy path is empty".to_string()));
        }
        if self.store.as_os_str().is_empty() {
            return Err(AdminError::Config("store path is empty".to_string()));
        }
        Ok(())
    }
}
