use async_trait::async_trait;
use doctree::store::{
    MemoryNodeStore, NodeStore, NodeStoreAdapter, SledNodeStore, StandaloneStoreProvider,
    StoreProvider,
};
use doctree::{Node, NodeType, StorageError};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Slow provider that counts how often it is opened
#[derive(Default)]
struct CountingProvider {
    opens: AtomicUsize,
}

#[async_trait]
impl StoreProvider for CountingProvider {
    async fn open(&self) -> Result<Arc<dyn NodeStore>, StorageError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(Arc::new(MemoryNodeStore::new()))
    }

    fn describe(&self) -> String {
        "counting".to_string()
    }
}

struct DownProvider;

#[async_trait]
impl StoreProvider for DownProvider {
    async fn open(&self) -> Result<Arc<dyn NodeStore>, StorageError> {
        Err(StorageError::StoreUnavailable("disk gone".to_string()))
    }

    fn describe(&self) -> String {
        "down".to_string()
    }
}

#[tokio::test]
async fn concurrent_first_callers_share_one_open() {
    let provider = Arc::new(CountingProvider::default());
    let adapter = NodeStoreAdapter::new(provider.clone());

    let handles = join_all((0..8).map(|_| adapter.store())).await;
    assert!(handles.iter().all(|h| h.is_ok()));
    assert_eq!(provider.opens.load(Ordering::SeqCst), 1);

    let first = handles[0].as_ref().unwrap();
    assert!(handles
        .iter()
        .all(|h| Arc::ptr_eq(first, h.as_ref().unwrap())));
}

#[tokio::test]
async fn exhausted_retries_surface_store_unavailable() {
    let adapter = NodeStoreAdapter::with_retry(Arc::new(DownProvider), 3, Duration::from_millis(1));
    let err = adapter.store().await.err().unwrap();
    assert!(matches!(err, StorageError::StoreUnavailable(_)));
    assert!(!adapter.is_initialized());
}

#[tokio::test]
async fn standalone_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nodes");
    {
        let adapter = NodeStoreAdapter::new(Arc::new(StandaloneStoreProvider::new(&path)));
        let store = adapter.store().await.unwrap();
        store
            .put(&Node::new("a", "p", "", NodeType::Http, "a"))
            .unwrap();
    }

    let adapter = NodeStoreAdapter::new(Arc::new(StandaloneStoreProvider::new(&path)));
    let store = adapter.store().await.unwrap();
    assert_eq!(store.get("a").unwrap().unwrap().project_id, "p");
    assert_eq!(store.get_all_from_index("p").unwrap().len(), 1);
}

#[test]
fn initialization_is_idempotent_on_one_database() {
    let db = sled::Config::new().temporary(true).open().unwrap();
    let first = SledNodeStore::initialize(&db, "apis/").unwrap();
    first
        .put(&Node::new("a", "p", "", NodeType::Folder, "a"))
        .unwrap();

    let second = SledNodeStore::initialize(&db, "apis/").unwrap();
    assert_eq!(second.get_all().unwrap().len(), 1);
    assert_eq!(second.get_all_from_index("p").unwrap().len(), 1);

    let other_namespace = SledNodeStore::initialize(&db, "mocks/").unwrap();
    assert!(other_namespace.get_all().unwrap().is_empty());
}
