//! Sled-backed node store
//!
//! Layout inside one sled database (tree names carry an optional namespace
//! prefix so several stores can share a database):
//!
//! - `nodes`: node id -> JSON node record
//! - `nodes_by_project`: `projectId \0 id` -> empty, the secondary index
//! - `meta`: schema version

use super::{NodeStore, NodeTxn, StoreProvider, TxnOutcome};
use crate::error::StorageError;
use crate::node::Node;
use async_trait::async_trait;
use sled::transaction::{
    ConflictableTransactionError, TransactionError, TransactionalTree,
    UnabortableTransactionError,
};
use sled::Transactional;
use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SCHEMA_VERSION: &[u8] = b"1";
const SCHEMA_KEY: &[u8] = b"schema_version";

fn index_prefix(project_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(project_id.len() + 1);
    key.extend_from_slice(project_id.as_bytes());
    key.push(0);
    key
}

fn index_key(project_id: &str, id: &str) -> Vec<u8> {
    let mut key = index_prefix(project_id);
    key.extend_from_slice(id.as_bytes());
    key
}

fn decode(key: &[u8], bytes: &[u8]) -> Result<Node, StorageError> {
    Node::from_bytes(bytes).map_err(|e| StorageError::InvalidRecord {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: e.to_string(),
    })
}

/// Node store over sled trees
pub struct SledNodeStore {
    nodes: sled::Tree,
    index: sled::Tree,
}

impl SledNodeStore {
    /// Open the store's trees in `db`, creating and migrating them if needed.
    ///
    /// Safe to run against an already initialized database.
    pub fn initialize(db: &sled::Db, namespace: &str) -> Result<Self, StorageError> {
        let nodes = db.open_tree(format!("{}nodes", namespace))?;
        let index = db.open_tree(format!("{}nodes_by_project", namespace))?;
        let meta = db.open_tree(format!("{}meta", namespace))?;

        let store = Self { nodes, index };
        if store.index.is_empty() && !store.nodes.is_empty() {
            store.rebuild_index()?;
        }
        if meta.get(SCHEMA_KEY)?.as_deref() != Some(SCHEMA_VERSION) {
            meta.insert(SCHEMA_KEY, SCHEMA_VERSION)?;
        }
        Ok(store)
    }

    /// Store in a throwaway database that is removed when dropped
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::initialize(&db, "")
    }

    fn rebuild_index(&self) -> Result<(), StorageError> {
        let mut indexed = 0usize;
        for entry in self.nodes.iter() {
            let (key, value) = entry?;
            match decode(&key, &value) {
                Ok(node) => {
                    self.index
                        .insert(index_key(&node.project_id, &node.id), Vec::<u8>::new())?;
                    indexed += 1;
                }
                Err(err) => warn!(error = %err, "Skipping unreadable node while rebuilding index"),
            }
        }
        info!(indexed, "Rebuilt project index");
        Ok(())
    }
}

/// Transaction view over both trees.
///
/// sled reports conflicts through `UnabortableTransactionError`; the original
/// error is kept aside so the transaction closure can hand it back to sled,
/// which retries conflicts itself.
struct SledTxn<'a> {
    nodes: &'a TransactionalTree,
    index: &'a TransactionalTree,
    interrupted: RefCell<Option<UnabortableTransactionError>>,
}

impl SledTxn<'_> {
    fn track<T>(&self, result: Result<T, UnabortableTransactionError>) -> Result<T, StorageError> {
        result.map_err(|err| {
            *self.interrupted.borrow_mut() = Some(err);
            StorageError::TransactionConflict
        })
    }
}

impl NodeTxn for SledTxn<'_> {
    fn get(&self, id: &str) -> Result<Option<Node>, StorageError> {
        match self.track(self.nodes.get(id.as_bytes()))? {
            Some(bytes) => Ok(Some(decode(id.as_bytes(), &bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, node: &Node) -> Result<(), StorageError> {
        let previous = self.track(self.nodes.insert(node.id.as_bytes(), node.to_bytes()?))?;
        if let Some(bytes) = previous {
            if let Ok(previous) = Node::from_bytes(&bytes) {
                if previous.project_id != node.project_id {
                    self.track(self.index.remove(index_key(&previous.project_id, &node.id)))?;
                }
            }
        }
        self.track(
            self.index
                .insert(index_key(&node.project_id, &node.id), Vec::<u8>::new()),
        )?;
        Ok(())
    }
}

impl NodeStore for SledNodeStore {
    fn get(&self, id: &str) -> Result<Option<Node>, StorageError> {
        match self.nodes.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(id.as_bytes(), &bytes)?)),
            None => Ok(None),
        }
    }

    fn get_all(&self) -> Result<Vec<Node>, StorageError> {
        let mut nodes = Vec::new();
        for entry in self.nodes.iter() {
            let (key, value) = entry?;
            match decode(&key, &value) {
                Ok(node) => nodes.push(node),
                Err(err) => warn!(error = %err, "Skipping unreadable node record"),
            }
        }
        Ok(nodes)
    }

    fn get_all_from_index(&self, project_id: &str) -> Result<Vec<Node>, StorageError> {
        let prefix = index_prefix(project_id);
        let mut nodes = Vec::new();
        for entry in self.index.scan_prefix(&prefix) {
            let (key, _) = entry.map_err(|e| StorageError::IndexUnavailable(e.to_string()))?;
            let id = std::str::from_utf8(&key[prefix.len()..]).map_err(|e| {
                StorageError::IndexUnavailable(format!("non UTF-8 index key: {}", e))
            })?;
            match self.get(id)? {
                Some(node) if node.project_id == project_id => nodes.push(node),
                _ => debug!(project_id = %project_id, node_id = %id, "Stale index entry"),
            }
        }
        Ok(nodes)
    }

    fn transaction(&self, work: &dyn Fn(&dyn NodeTxn) -> TxnOutcome) -> TxnOutcome {
        let result = (&self.nodes, &self.index).transaction(|(nodes, index)| {
            let txn = SledTxn {
                nodes,
                index,
                interrupted: RefCell::new(None),
            };
            match work(&txn) {
                Ok(ids) => Ok(ids),
                Err(err) => match txn.interrupted.take() {
                    Some(interrupted) => Err(interrupted.into()),
                    None => Err(ConflictableTransactionError::Abort(err)),
                },
            }
        });
        match result {
            Ok(ids) => Ok(ids),
            Err(TransactionError::Abort(err)) => Err(err),
            Err(TransactionError::Storage(err)) => Err(StorageError::Database(err)),
        }
    }
}

/// Open (creating if needed) a sled database directory off the async runtime
pub async fn open_database(path: PathBuf) -> Result<sled::Db, StorageError> {
    tokio::task::spawn_blocking(move || -> Result<sled::Db, StorageError> {
        std::fs::create_dir_all(&path)?;
        Ok(sled::open(&path)?)
    })
    .await
    .map_err(|e| StorageError::StoreUnavailable(format!("database open task failed: {}", e)))?
}

/// Single-database mode: the store owns its own sled database on disk
pub struct StandaloneStoreProvider {
    path: PathBuf,
}

impl StandaloneStoreProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StoreProvider for StandaloneStoreProvider {
    async fn open(&self) -> Result<Arc<dyn NodeStore>, StorageError> {
        let db = open_database(self.path.clone()).await?;
        Ok(Arc::new(SledNodeStore::initialize(&db, "")?))
    }

    fn describe(&self) -> String {
        format!("standalone:{}", self.path.display())
    }
}

/// Shared mode: binds to a database that also holds other data
pub struct SharedStoreProvider {
    db: sled::Db,
    namespace: String,
}

impl SharedStoreProvider {
    pub fn new(db: sled::Db, namespace: impl Into<String>) -> Self {
        Self {
            db,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl StoreProvider for SharedStoreProvider {
    async fn open(&self) -> Result<Arc<dyn NodeStore>, StorageError> {
        Ok(Arc::new(SledNodeStore::initialize(&self.db, &self.namespace)?))
    }

    fn describe(&self) -> String {
        format!("shared:{}", self.namespace)
    }
}
