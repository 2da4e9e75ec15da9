//! Process configuration.
//!
//! Built once at startup from an optional YAML file plus environment
//! overrides, then handed to the scheduler. Nothing reads it globally.
//!
//! ```yaml
//! server:
//!   listen_addr: "0.0.0.0:8020"
//!   workers: 4
//! timeouts:
//!   keep_alive_ms: 15000
//! responder:
//!   kind: static
//!   root: "www"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::responder::{Echo, Responder, StaticFiles};

/// Names the YAML file to load.
pub const CONFIG_ENV: &str = "PARKWAY_CONFIG";
/// Overrides `server.listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub timeouts: TimeoutConfig,
    pub responder: ResponderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Number of workers serving requests concurrently.
    pub workers: usize,
    /// Connections allowed to wait for a free worker.
    pub queue_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8020".to_string(),
            workers: 2,
            queue_depth: 64,
        }
    }
}

/// All values in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// From accept until the request line must have arrived.
    pub first_byte_ms: u64,
    /// Per header line.
    pub header_ms: u64,
    /// How long a parked keep-alive connection may stay idle.
    pub keep_alive_ms: u64,
    /// How often parked connections are checked against `keep_alive_ms`.
    pub sweep_interval_ms: u64,
    /// Upper bound on one readiness wait in the scheduler.
    pub poll_interval_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            first_byte_ms: 5_000,
            header_ms: 2_000,
            keep_alive_ms: 20_000,
            sweep_interval_ms: 5_000,
            poll_interval_ms: 10,
        }
    }
}

impl TimeoutConfig {
    pub fn first_byte(&self) -> Duration {
        Duration::from_millis(self.first_byte_ms)
    }

    pub fn header(&self) -> Duration {
        Duration::from_millis(self.header_ms)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResponderConfig {
    Static {
        #[serde(default = "default_root")]
        root: PathBuf,
    },
    Echo,
}

fn default_root() -> PathBuf {
    PathBuf::from("www")
}

impl Default for ResponderConfig {
    fn default() -> Self {
        ResponderConfig::Static { root: default_root() }
    }
}

impl Config {
    /// Loads `$PARKWAY_CONFIG` (defaults when unset), applies `$LISTEN`
    /// and validates the result.
    pub fn load() -> anyhow::Result<Self> {
        let cfg = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        let cfg = cfg.with_listen_override(std::env::var(LISTEN_ENV).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(text)?;
        Ok(cfg)
    }

    pub fn with_listen_override(mut self, listen: Option<String>) -> Self {
        if let Some(addr) = listen {
            self.server.listen_addr = addr;
        }
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.workers == 0 {
            anyhow::bail!("server.workers must be at least 1");
        }
        if self.server.queue_depth == 0 {
            anyhow::bail!("server.queue_depth must be at least 1");
        }

        let t = &self.timeouts;
        for (name, value) in [
            ("first_byte_ms", t.first_byte_ms),
            ("header_ms", t.header_ms),
            ("keep_alive_ms", t.keep_alive_ms),
            ("sweep_interval_ms", t.sweep_interval_ms),
            ("poll_interval_ms", t.poll_interval_ms),
        ] {
            if value == 0 {
                anyhow::bail!("timeouts.{} must be greater than zero", name);
            }
        }

        Ok(())
    }

    /// The responder variant is chosen here, once.
    pub fn build_responder(&self) -> Arc<dyn Responder> {
        match &self.responder {
            ResponderConfig::Static { root } => Arc::new(StaticFiles::new(root.clone())),
            ResponderConfig::Echo => Arc::new(Echo),
        }
    }
}
