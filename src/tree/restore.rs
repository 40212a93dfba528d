//! Cascading restore
//!
//! Restoring a node also restores every deleted ancestor on its `pid` chain,
//! so the node is reachable again, and for folders every deleted node below
//! it. All writes land in one transaction.

use super::children::ChildIndex;
use crate::error::StorageError;
use crate::node::Node;
use crate::store::{project_nodes, NodeStore};
use std::collections::HashSet;

/// Restore `id` with its ancestors and, for folders, its subtree.
///
/// Returns the restored nodes in order: the node itself, then ancestors from
/// nearest to farthest, then descendants depth first. Empty when the node is
/// missing or not deleted.
pub fn cascade_restore(
    store: &dyn NodeStore,
    id: &str,
    timestamp: &str,
) -> Result<Vec<Node>, StorageError> {
    let Some(target) = store.get(id)? else {
        return Ok(Vec::new());
    };
    if !target.is_deleted {
        return Ok(Vec::new());
    }
    let subtree = if target.is_folder() {
        Some(ChildIndex::build(&project_nodes(store, &target.project_id)?))
    } else {
        None
    };

    store.transaction(&|txn| {
        let mut restored = Vec::new();
        let Some(mut node) = txn.get(id)? else {
            return Ok(restored);
        };
        if !node.is_deleted {
            return Ok(restored);
        }
        node.mark_restored(timestamp);
        txn.put(&node)?;
        let mut seen: HashSet<String> = HashSet::from([node.id.clone()]);
        let mut parent_id = node.pid.clone();
        let is_folder = node.is_folder();
        restored.push(node);

        // A live or missing ancestor means the rest of the path is already live.
        while !parent_id.is_empty() && seen.insert(parent_id.clone()) {
            match txn.get(&parent_id)? {
                Some(mut parent) if parent.is_deleted => {
                    parent.mark_restored(timestamp);
                    txn.put(&parent)?;
                    parent_id = parent.pid.clone();
                    restored.push(parent);
                }
                _ => break,
            }
        }

        if let Some(subtree) = subtree.as_ref().filter(|_| is_folder) {
            for child_id in subtree.descendants(id) {
                match txn.get(&child_id)? {
                    Some(mut child) if child.is_deleted => {
                        child.mark_restored(timestamp);
                        txn.put(&child)?;
                        restored.push(child);
                    }
                    _ => {}
                }
            }
        }

        Ok(restored)
    })
}
