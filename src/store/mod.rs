//! Node Store
//!
//! Persistence for node records: a value store keyed by node id plus a
//! secondary index by project id. Multi-step mutations run inside a single
//! transaction so concurrent writers race at the transaction boundary.

pub mod adapter;
pub mod memory;
pub mod sled_store;

pub use adapter::{NodeStoreAdapter, StoreProvider};
pub use memory::{MemoryNodeStore, MemoryStoreProvider};
pub use sled_store::{open_database, SharedStoreProvider, SledNodeStore, StandaloneStoreProvider};

use crate::error::StorageError;
use crate::node::Node;
use tracing::warn;

/// Result of a transaction body: the records it hands back to the caller
pub type TxnOutcome = Result<Vec<Node>, StorageError>;

/// Reads and writes visible inside one transaction
pub trait NodeTxn {
    fn get(&self, id: &str) -> Result<Option<Node>, StorageError>;
    fn put(&self, node: &Node) -> Result<(), StorageError>;
}

/// Node store interface
///
/// `transaction` applies every write of `work` or none of them. The body may
/// run more than once if the backend retries on conflict, so it must not have
/// side effects outside the transaction.
pub trait NodeStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<Node>, StorageError>;
    fn get_all(&self) -> Result<Vec<Node>, StorageError>;
    fn get_all_from_index(&self, project_id: &str) -> Result<Vec<Node>, StorageError>;
    fn transaction(&self, work: &dyn Fn(&dyn NodeTxn) -> TxnOutcome) -> TxnOutcome;

    fn put(&self, node: &Node) -> Result<(), StorageError> {
        self.transaction(&|txn| {
            txn.put(node)?;
            Ok(vec![node.clone()])
        })
        .map(|_| ())
    }
}

/// Every node of a project, deleted or not.
///
/// Uses the project index; if the index lookup fails the whole value store
/// is scanned and filtered in memory instead.
pub fn project_nodes(store: &dyn NodeStore, project_id: &str) -> Result<Vec<Node>, StorageError> {
    match store.get_all_from_index(project_id) {
        Ok(nodes) => Ok(nodes),
        Err(err) => {
            warn!(
                project_id = %project_id,
                error = %err,
                "Project index lookup failed, falling back to full scan"
            );
            Ok(store
                .get_all()?
                .into_iter()
                .filter(|node| node.project_id == project_id)
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;

    struct BrokenIndex(MemoryNodeStore);

    impl NodeStore for BrokenIndex {
        fn get(&self, id: &str) -> Result<Option<Node>, StorageError> {
            self.0.get(id)
        }
        fn get_all(&self) -> Result<Vec<Node>, StorageError> {
            self.0.get_all()
        }
        fn get_all_from_index(&self, _project_id: &str) -> Result<Vec<Node>, StorageError> {
            Err(StorageError::IndexUnavailable("missing".to_string()))
        }
        fn transaction(&self, work: &dyn Fn(&dyn NodeTxn) -> TxnOutcome) -> TxnOutcome {
            self.0.transaction(work)
        }
    }

    #[test]
    fn test_project_nodes_falls_back_to_scan() {
        let store = BrokenIndex(MemoryNodeStore::new());
        store
            .put(&Node::new("a", "p1", "", NodeType::Http, "A"))
            .unwrap();
        store
            .put(&Node::new("b", "p2", "", NodeType::Http, "B"))
            .unwrap();

        let nodes = project_nodes(&store, "p1").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "a");
    }
}
