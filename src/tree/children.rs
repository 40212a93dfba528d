//! Parent -> children adjacency over one project's nodes.
//!
//! Built once per call from a snapshot of the project; never cached, since
//! deletion state changes too often for a long-lived index to stay correct.

use crate::node::Node;
use crate::types::NodeId;
use std::collections::{HashMap, HashSet};

pub struct ChildIndex {
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl ChildIndex {
    pub fn build(nodes: &[Node]) -> Self {
        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in nodes {
            if !node.pid.is_empty() && node.pid != node.id {
                children
                    .entry(node.pid.clone())
                    .or_default()
                    .push(node.id.clone());
            }
        }
        Self { children }
    }

    pub fn children_of(&self, id: &str) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every node below `root`, depth first, each listed once.
    ///
    /// `root` itself is never listed, even when a `pid` cycle leads back to it.
    pub fn descendants(&self, root: &str) -> Vec<NodeId> {
        let mut visited: HashSet<&str> = HashSet::from([root]);
        let mut stack: Vec<&str> = self.children_of(root).iter().rev().map(String::as_str).collect();
        let mut found = Vec::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            found.push(id.to_string());
            stack.extend(self.children_of(id).iter().rev().map(String::as_str));
        }
        found
    }
}
