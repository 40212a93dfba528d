//! Node Store Adapter
//!
//! Lazily opens the node store on first use and memoizes the handle. Callers
//! that arrive while initialization is in flight wait on the same attempt. A
//! failed initialization leaves the adapter uninitialized so a later call can
//! try again.

use super::NodeStore;
use crate::error::StorageError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::sleep;
use tracing::{info, warn};

/// Opens a node store; the strategy that binds the engine to a backend
#[async_trait]
pub trait StoreProvider: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn NodeStore>, StorageError>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}

/// Memoizing wrapper around a `StoreProvider`
pub struct NodeStoreAdapter {
    provider: Arc<dyn StoreProvider>,
    handle: OnceCell<Arc<dyn NodeStore>>,
    attempts: usize,
    retry_delay: Duration,
}

impl NodeStoreAdapter {
    pub fn new(provider: Arc<dyn StoreProvider>) -> Self {
        Self::with_retry(provider, 2, Duration::from_millis(50))
    }

    /// `attempts` is the number of opens tried per initialization (at least one)
    pub fn with_retry(provider: Arc<dyn StoreProvider>, attempts: usize, retry_delay: Duration) -> Self {
        Self {
            provider,
            handle: OnceCell::new(),
            attempts: attempts.max(1),
            retry_delay,
        }
    }

    /// Ready store handle, initializing it on first use
    pub async fn store(&self) -> Result<Arc<dyn NodeStore>, StorageError> {
        let handle = self.handle.get_or_try_init(|| self.initialize()).await?;
        Ok(Arc::clone(handle))
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.initialized()
    }

    async fn initialize(&self) -> Result<Arc<dyn NodeStore>, StorageError> {
        let target = self.provider.describe();
        let mut last_error = None;
        for attempt in 1..=self.attempts {
            match self.provider.open().await {
                Ok(store) => {
                    info!(store = %target, attempt, "Node store initialized");
                    return Ok(store);
                }
                Err(err) => {
                    warn!(
                        store = %target,
                        attempt,
                        error = %err,
                        "Node store initialization failed"
                    );
                    last_error = Some(err);
                    if attempt < self.attempts {
                        sleep(self.retry_delay).await;
                    }
                }
            }
        }
        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt made".to_string());
        Err(StorageError::StoreUnavailable(format!(
            "{} after {} attempt(s): {}",
            target, self.attempts, reason
        )))
    }
}
