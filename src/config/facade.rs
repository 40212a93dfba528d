//! Entry points for loading `DoctreeConfig`.

use super::merge::MergeService;
use super::{DoctreeConfig, StorageMode};
use crate::error::ApiError;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Layered load (`explicit` sits between the global file and the
    /// environment), then validated.
    pub fn load_for_cli(explicit: Option<&Path>) -> Result<DoctreeConfig, ApiError> {
        let config = MergeService::load(explicit)?;
        if config.cache.init_attempts == 0 {
            return Err(ApiError::ConfigError(
                "cache.init_attempts must be at least 1".to_string(),
            ));
        }
        if config.storage.mode == StorageMode::Shared && config.storage.namespace.is_empty() {
            return Err(ApiError::ConfigError(
                "storage.namespace must be set in shared mode".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn default() -> DoctreeConfig {
        DoctreeConfig::default()
    }
}
