//! Import ID remapping
//!
//! Incoming nodes always get fresh ids, so importing the same source twice
//! (or pasting a copy next to its original) never collides with stored data.
//! Parent links inside the incoming set follow the new ids; a `pid` that
//! points outside the set is left as is and acts as the mount point.

use crate::node::Node;
use crate::types::NodeId;
use std::collections::HashMap;
use uuid::Uuid;

/// Fresh node identifier
pub fn mint_node_id() -> NodeId {
    Uuid::new_v4().simple().to_string()
}

/// Nodes ready to insert, plus the `old id -> new id` mapping applied to them
#[derive(Debug, Clone)]
pub struct RemappedImport {
    pub nodes: Vec<Node>,
    pub id_map: HashMap<NodeId, NodeId>,
}

/// Give every node a new id, move it into `project_id` and re-link parents.
///
/// Nodes without an `updatedAt` are stamped with `timestamp`. When the
/// incoming set repeats an id, parent links resolve to the last copy.
pub fn remap_for_import(nodes: Vec<Node>, project_id: &str, timestamp: &str) -> RemappedImport {
    let mut id_map = HashMap::with_capacity(nodes.len());
    let mut remapped: Vec<Node> = nodes
        .into_iter()
        .map(|mut node| {
            let new_id = mint_node_id();
            let old_id = std::mem::replace(&mut node.id, new_id.clone());
            id_map.insert(old_id, new_id);
            node.project_id = project_id.to_string();
            if node.updated_at.is_empty() {
                node.updated_at = timestamp.to_string();
            }
            node
        })
        .collect();

    for node in &mut remapped {
        if node.pid.is_empty() {
            continue;
        }
        if let Some(new_pid) = id_map.get(&node.pid) {
            node.pid = new_pid.clone();
        }
    }

    RemappedImport {
        nodes: remapped,
        id_map,
    }
}
