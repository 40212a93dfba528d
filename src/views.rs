//! Project Views
//!
//! Short-lived cache of each project's live node list, plus the helpers that
//! materialize that list into a nested tree for navigation.

use crate::node::Node;
use crate::types::{Clock, ProjectId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Default lifetime of a cached project view
pub const DEFAULT_VIEW_TTL: Duration = Duration::from_secs(5 * 60);

struct ViewEntry {
    data: Vec<Node>,
    timestamp: DateTime<Utc>,
}

#[derive(Default)]
struct Views {
    entries: HashMap<ProjectId, ViewEntry>,
    /// Bumped on every eviction of a project
    generations: HashMap<ProjectId, u64>,
}

/// Per-project node list cache bounded by a TTL
pub struct ViewCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    views: RwLock<Views>,
}

impl ViewCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            views: RwLock::new(Views::default()),
        }
    }

    /// Cached list for a project, if present and younger than the TTL
    pub fn get(&self, project_id: &str) -> Option<Vec<Node>> {
        let now = self.clock.now();
        {
            let views = self.views.read();
            let entry = views.entries.get(project_id)?;
            if self.is_fresh(entry, now) {
                return Some(entry.data.clone());
            }
        }
        // Expired; drop it unless someone refreshed it in between.
        let mut views = self.views.write();
        if let Some(entry) = views.entries.get(project_id) {
            if !self.is_fresh(entry, now) {
                views.entries.remove(project_id);
            }
        }
        None
    }

    /// Eviction counter for a project; read it before loading from the store
    pub fn generation(&self, project_id: &str) -> u64 {
        self.views
            .read()
            .generations
            .get(project_id)
            .copied()
            .unwrap_or_default()
    }

    /// Cache `data` loaded at `generation`.
    ///
    /// Dropped when the project was evicted since, so a load that raced a
    /// mutation never outlives it.
    pub fn insert(&self, project_id: &str, generation: u64, data: Vec<Node>) -> bool {
        let mut views = self.views.write();
        let current = views.generations.get(project_id).copied().unwrap_or_default();
        if current != generation {
            return false;
        }
        let entry = ViewEntry {
            data,
            timestamp: self.clock.now(),
        };
        views.entries.insert(project_id.to_string(), entry);
        true
    }

    pub fn evict(&self, project_id: &str) {
        let mut views = self.views.write();
        views.entries.remove(project_id);
        *views.generations.entry(project_id.to_string()).or_default() += 1;
    }

    fn is_fresh(&self, entry: &ViewEntry, now: DateTime<Utc>) -> bool {
        let age = (now - entry.timestamp).to_std().unwrap_or_default();
        age < self.ttl
    }
}

/// A node with its materialized children
#[derive(Debug, Clone, Serialize)]
pub struct TreeItem {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<TreeItem>,
}

/// Folders first, then by name, then by id
fn sibling_order(a: &Node, b: &Node) -> Ordering {
    b.is_folder()
        .cmp(&a.is_folder())
        .then_with(|| a.info.name.cmp(&b.info.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Nest a flat node list by `pid`.
///
/// Nodes whose parent is empty, missing from the list, or themselves are
/// mounted at the root. Members of a `pid` cycle are never reachable from a
/// root; each cycle is mounted at the root at its first unvisited member.
pub fn build_tree(nodes: &[Node]) -> Vec<TreeItem> {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut children: HashMap<&str, Vec<&Node>> = HashMap::new();
    let mut roots: Vec<&Node> = Vec::new();
    for node in nodes {
        if node.pid.is_empty() || node.pid == node.id || !ids.contains(node.pid.as_str()) {
            roots.push(node);
        } else {
            children.entry(node.pid.as_str()).or_default().push(node);
        }
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| sibling_order(a, b));
    }
    roots.sort_by(|a, b| sibling_order(a, b));

    let mut visited: HashSet<&str> = HashSet::new();
    let mut tree: Vec<TreeItem> = roots
        .into_iter()
        .filter_map(|root| materialize(root, &children, &mut visited))
        .collect();

    let mut stranded: Vec<&Node> = nodes
        .iter()
        .filter(|n| !visited.contains(n.id.as_str()))
        .collect();
    stranded.sort_by(|a, b| sibling_order(a, b));
    for node in stranded {
        if let Some(item) = materialize(node, &children, &mut visited) {
            tree.push(item);
        }
    }
    tree
}

/// Folder-only projection for navigation
pub fn build_folder_tree(nodes: &[Node]) -> Vec<TreeItem> {
    let folders: Vec<Node> = nodes.iter().filter(|n| n.is_folder()).cloned().collect();
    build_tree(&folders)
}

fn materialize<'a>(
    node: &'a Node,
    children: &HashMap<&str, Vec<&'a Node>>,
    visited: &mut HashSet<&'a str>,
) -> Option<TreeItem> {
    if !visited.insert(node.id.as_str()) {
        return None;
    }
    let kids = children
        .get(node.id.as_str())
        .map(|kids| {
            kids.iter()
                .filter_map(|&child| materialize(child, children, visited))
                .collect()
        })
        .unwrap_or_default();
    Some(TreeItem {
        node: node.clone(),
        children: kids,
    })
}
