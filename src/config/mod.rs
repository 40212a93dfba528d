//! Configuration
//!
//! Layered configuration for the node cache: built-in defaults, the global
//! config file, an explicit file, then `DOCTREE__*` environment variables.

mod facade;
mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How the node store is bound to its database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// The node store owns a database of its own
    Standalone,
    /// Nodes live in namespaced trees of a database shared with other data
    Shared,
}

fn default_mode() -> StorageMode {
    StorageMode::Standalone
}

fn default_namespace() -> String {
    "apis/".to_string()
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_mode")]
    pub mode: StorageMode,

    /// Database directory; None means the platform data directory
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Tree-name prefix used in shared mode
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl StorageConfig {
    /// Resolve the database directory
    pub fn resolve_path(&self) -> Result<PathBuf, ApiError> {
        match &self.path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => Ok(paths::data_dir()?.join("store")),
        }
    }

    /// Namespace applied to tree names; empty in standalone mode
    pub fn effective_namespace(&self) -> &str {
        match self.mode {
            StorageMode::Standalone => "",
            StorageMode::Shared => &self.namespace,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            path: None,
            namespace: default_namespace(),
        }
    }
}

fn default_view_ttl_secs() -> u64 {
    300
}

fn default_init_attempts() -> usize {
    2
}

fn default_init_retry_delay_ms() -> u64 {
    50
}

/// Engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Lifetime of a cached project view
    #[serde(default = "default_view_ttl_secs")]
    pub view_ttl_secs: u64,

    /// Store opens attempted before reporting the store unavailable
    #[serde(default = "default_init_attempts")]
    pub init_attempts: usize,

    #[serde(default = "default_init_retry_delay_ms")]
    pub init_retry_delay_ms: u64,
}

impl CacheSettings {
    pub fn view_ttl(&self) -> Duration {
        Duration::from_secs(self.view_ttl_secs)
    }

    pub fn init_retry_delay(&self) -> Duration {
        Duration::from_millis(self.init_retry_delay_ms)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            view_ttl_secs: default_view_ttl_secs(),
            init_attempts: default_init_attempts(),
            init_retry_delay_ms: default_init_retry_delay_ms(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctreeConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}
