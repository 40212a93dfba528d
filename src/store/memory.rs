//! In-memory node store for tests and ephemeral sessions.

use super::{NodeStore, NodeTxn, StoreProvider, TxnOutcome};
use crate::error::StorageError;
use crate::node::Node;
use crate::types::{NodeId, ProjectId};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Default)]
struct MemoryState {
    nodes: BTreeMap<NodeId, Node>,
    by_project: BTreeMap<ProjectId, BTreeSet<NodeId>>,
}

impl MemoryState {
    fn insert(&mut self, node: Node) {
        if let Some(previous) = self.nodes.get(&node.id) {
            if previous.project_id != node.project_id {
                if let Some(ids) = self.by_project.get_mut(&previous.project_id) {
                    ids.remove(&node.id);
                }
            }
        }
        self.by_project
            .entry(node.project_id.clone())
            .or_default()
            .insert(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
    }
}

/// Node store held in a `BTreeMap`, with a `projectId` index kept beside it
#[derive(Default)]
pub struct MemoryNodeStore {
    state: RwLock<MemoryState>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Writes staged by a running transaction, applied on success
struct MemoryTxn<'a> {
    base: &'a MemoryState,
    staged: RefCell<BTreeMap<NodeId, Node>>,
}

impl NodeTxn for MemoryTxn<'_> {
    fn get(&self, id: &str) -> Result<Option<Node>, StorageError> {
        if let Some(node) = self.staged.borrow().get(id) {
            return Ok(Some(node.clone()));
        }
        Ok(self.base.nodes.get(id).cloned())
    }

    fn put(&self, node: &Node) -> Result<(), StorageError> {
        self.staged
            .borrow_mut()
            .insert(node.id.clone(), node.clone());
        Ok(())
    }
}

impl NodeStore for MemoryNodeStore {
    fn get(&self, id: &str) -> Result<Option<Node>, StorageError> {
        Ok(self.state.read().nodes.get(id).cloned())
    }

    fn get_all(&self) -> Result<Vec<Node>, StorageError> {
        Ok(self.state.read().nodes.values().cloned().collect())
    }

    fn get_all_from_index(&self, project_id: &str) -> Result<Vec<Node>, StorageError> {
        let state = self.state.read();
        let Some(ids) = state.by_project.get(project_id) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| state.nodes.get(id).cloned())
            .collect())
    }

    fn transaction(&self, work: &dyn Fn(&dyn NodeTxn) -> TxnOutcome) -> TxnOutcome {
        // Writer lock for the whole body serializes transactions.
        let mut state = self.state.write();
        let (outcome, staged) = {
            let txn = MemoryTxn {
                base: &state,
                staged: RefCell::new(BTreeMap::new()),
            };
            let outcome = work(&txn)?;
            (outcome, txn.staged.into_inner())
        };
        for node in staged.into_values() {
            state.insert(node);
        }
        Ok(outcome)
    }
}

/// Hands out one shared in-memory store
#[derive(Clone, Default)]
pub struct MemoryStoreProvider {
    store: Arc<MemoryNodeStore>,
}

impl MemoryStoreProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<MemoryNodeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StoreProvider for MemoryStoreProvider {
    async fn open(&self) -> Result<Arc<dyn NodeStore>, StorageError> {
        Ok(self.store.clone())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
