//! Tree Cache Engine
//!
//! CRUD, soft delete, cascading restore and bulk import over node records,
//! scoped by project. Every mutation resyncs the affected projects' document
//! counters and evicts their cached views.
//!
//! Operations never fail outward: a missing target or a storage failure is
//! logged and reported as `false`, `None` or an empty list. Only
//! [`TreeCache::store`] returns the adapter's `StoreUnavailable` error.

use super::counter::ProjectCounter;
use super::import::remap_for_import;
use super::restore::cascade_restore;
use super::children::ChildIndex;
use crate::config::{CacheSettings, DoctreeConfig, StorageMode};
use crate::error::{ApiError, StorageError};
use crate::node::Node;
use crate::project::{ProjectRepository, SledProjectRepository};
use crate::store::{
    open_database, project_nodes, NodeStore, NodeStoreAdapter, SharedStoreProvider,
    StandaloneStoreProvider, StoreProvider,
};
use crate::types::{Clock, NodeId, ProjectId, SystemClock};
use crate::views::{build_folder_tree, build_tree, TreeItem, ViewCache, DEFAULT_VIEW_TTL};
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Tunables for a `TreeCache`
#[derive(Clone)]
pub struct TreeCacheOptions {
    pub view_ttl: Duration,
    pub clock: Arc<dyn Clock>,
    pub init_attempts: usize,
    pub init_retry_delay: Duration,
}

impl Default for TreeCacheOptions {
    fn default() -> Self {
        Self {
            view_ttl: DEFAULT_VIEW_TTL,
            clock: Arc::new(SystemClock),
            init_attempts: 2,
            init_retry_delay: Duration::from_millis(50),
        }
    }
}

impl TreeCacheOptions {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self {
            view_ttl: settings.view_ttl(),
            init_attempts: settings.init_attempts,
            init_retry_delay: settings.init_retry_delay(),
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Project-scoped node cache over a lazily opened store
pub struct TreeCache {
    adapter: NodeStoreAdapter,
    counter: ProjectCounter,
    views: ViewCache,
    clock: Arc<dyn Clock>,
}

fn deletion_time(node: &Node) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(&node.updated_at).ok()
}

/// Distinct project ids of `nodes`, first occurrence first
fn affected_projects<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<ProjectId> {
    let mut seen = HashSet::new();
    nodes
        .into_iter()
        .filter(|n| seen.insert(n.project_id.clone()))
        .map(|n| n.project_id.clone())
        .collect()
}

impl TreeCache {
    pub fn new(provider: Arc<dyn StoreProvider>, projects: Arc<dyn ProjectRepository>) -> Self {
        Self::with_options(provider, projects, TreeCacheOptions::default())
    }

    pub fn with_options(
        provider: Arc<dyn StoreProvider>,
        projects: Arc<dyn ProjectRepository>,
        options: TreeCacheOptions,
    ) -> Self {
        Self {
            adapter: NodeStoreAdapter::with_retry(
                provider,
                options.init_attempts,
                options.init_retry_delay,
            ),
            counter: ProjectCounter::new(projects),
            views: ViewCache::new(options.view_ttl, options.clock.clone()),
            clock: options.clock,
        }
    }

    /// Build a cache over the sled database described by `config`.
    ///
    /// Standalone mode keeps nodes in `<path>/nodes`, opened lazily on first
    /// use, and project aggregates in `<path>/projects`. Shared mode opens the
    /// database at `<path>` and keeps both in trees under the namespace.
    pub async fn from_config(config: &DoctreeConfig) -> Result<Self, ApiError> {
        let path = config.storage.resolve_path()?;
        let namespace = config.storage.effective_namespace();
        let (provider, projects): (Arc<dyn StoreProvider>, Arc<dyn ProjectRepository>) =
            match config.storage.mode {
                StorageMode::Standalone => {
                    let projects_db = open_database(path.join("projects")).await?;
                    (
                        Arc::new(StandaloneStoreProvider::new(path.join("nodes"))),
                        Arc::new(SledProjectRepository::open(&projects_db, namespace)?),
                    )
                }
                StorageMode::Shared => {
                    let db = open_database(path).await?;
                    (
                        Arc::new(SharedStoreProvider::new(db.clone(), namespace)),
                        Arc::new(SledProjectRepository::open(&db, namespace)?),
                    )
                }
            };
        info!(store = %provider.describe(), "Tree cache configured");
        Ok(Self::with_options(
            provider,
            projects,
            TreeCacheOptions::from_settings(&config.cache),
        ))
    }

    /// Ready store handle; the only call that surfaces `StoreUnavailable`
    pub async fn store(&self) -> Result<Arc<dyn NodeStore>, StorageError> {
        self.adapter.store().await
    }

    pub fn projects(&self) -> &Arc<dyn ProjectRepository> {
        self.counter.projects()
    }

    async fn ready_store(&self, operation: &'static str) -> Option<Arc<dyn NodeStore>> {
        match self.adapter.store().await {
            Ok(store) => Some(store),
            Err(err) => {
                error!(operation, error = %err, "Node store unavailable");
                None
            }
        }
    }

    /// Resync counters and evict views for each affected project
    async fn settle(&self, store: &dyn NodeStore, projects: &[ProjectId]) {
        for project_id in projects {
            if let Err(err) = self.counter.resync(store, project_id).await {
                error!(project_id = %project_id, error = %err, "Failed to resync document count");
            }
            self.views.evict(project_id);
        }
    }

    /// Drop the cached view of a project mutated outside this cache
    pub fn invalidate(&self, project_id: &str) {
        self.views.evict(project_id);
    }

    pub async fn get_all(&self, include_deleted: bool) -> Vec<Node> {
        let Some(store) = self.ready_store("get_all").await else {
            return Vec::new();
        };
        match store.get_all() {
            Ok(nodes) => nodes
                .into_iter()
                .filter(|n| include_deleted || !n.is_deleted)
                .collect(),
            Err(err) => {
                error!(error = %err, "Failed to list nodes");
                Vec::new()
            }
        }
    }

    /// Live nodes of a project, served from the view cache when fresh
    pub async fn get_by_project(&self, project_id: &str) -> Vec<Node> {
        if let Some(nodes) = self.views.get(project_id) {
            debug!(project_id = %project_id, count = nodes.len(), "View cache hit");
            return nodes;
        }
        let Some(store) = self.ready_store("get_by_project").await else {
            return Vec::new();
        };
        let generation = self.views.generation(project_id);
        match project_nodes(&*store, project_id) {
            Ok(nodes) => {
                let live: Vec<Node> = nodes.into_iter().filter(|n| !n.is_deleted).collect();
                debug!(project_id = %project_id, count = live.len(), "View cache miss");
                self.views.insert(project_id, generation, live.clone());
                live
            }
            Err(err) => {
                error!(project_id = %project_id, error = %err, "Failed to load project nodes");
                Vec::new()
            }
        }
    }

    pub async fn get_by_id(&self, id: &str, include_deleted: bool) -> Option<Node> {
        let store = self.ready_store("get_by_id").await?;
        match store.get(id) {
            Ok(node) => node.filter(|n| include_deleted || !n.is_deleted),
            Err(err) => {
                error!(node_id = %id, error = %err, "Failed to read node");
                None
            }
        }
    }

    /// Insert or overwrite a node by id
    pub async fn add(&self, node: Node) -> bool {
        let Some(store) = self.ready_store("add").await else {
            return false;
        };
        let previous = match store.get(&node.id) {
            Ok(previous) => previous,
            Err(err) => {
                warn!(
                    node_id = %node.id,
                    error = %err,
                    "Failed to read previous node, only its new project will be recounted"
                );
                None
            }
        };
        if let Err(err) = store.put(&node) {
            error!(node_id = %node.id, error = %err, "Failed to add node");
            return false;
        }
        debug!(node_id = %node.id, project_id = %node.project_id, "Node added");
        let affected = affected_projects(previous.iter().chain(std::iter::once(&node)));
        self.settle(&*store, &affected).await;
        true
    }

    /// Overwrite an existing node; never creates one
    pub async fn replace(&self, node: Node) -> bool {
        let Some(store) = self.ready_store("replace").await else {
            return false;
        };
        let result = store.transaction(&|txn| match txn.get(&node.id)? {
            Some(previous) => {
                txn.put(&node)?;
                Ok(vec![previous, node.clone()])
            }
            None => Ok(Vec::new()),
        });
        self.finish_update(&*store, &node.id, "replace", result).await
    }

    /// Change a node's display name
    pub async fn rename(&self, id: &str, name: &str) -> bool {
        let Some(store) = self.ready_store("rename").await else {
            return false;
        };
        let result = store.transaction(&|txn| {
            let Some(mut node) = txn.get(id)? else {
                return Ok(Vec::new());
            };
            node.info.name = name.to_string();
            txn.put(&node)?;
            Ok(vec![node])
        });
        match result {
            Ok(written) if written.is_empty() => false,
            Ok(written) => {
                // Counts cannot change, only the views.
                for project_id in affected_projects(&written) {
                    self.views.evict(&project_id);
                }
                true
            }
            Err(err) => {
                error!(node_id = %id, error = %err, "Failed to rename node");
                false
            }
        }
    }

    /// Shallow-merge `updates` into a node and stamp `updatedAt`
    pub async fn patch(&self, id: &str, updates: &Map<String, Value>) -> bool {
        let Some(store) = self.ready_store("patch").await else {
            return false;
        };
        let timestamp = self.clock.timestamp();
        let result = store.transaction(&|txn| {
            let Some(previous) = txn.get(id)? else {
                return Ok(Vec::new());
            };
            let mut merged = previous.merged(updates)?;
            merged.updated_at = timestamp.clone();
            txn.put(&merged)?;
            Ok(vec![previous, merged])
        });
        self.finish_update(&*store, id, "patch", result).await
    }

    async fn finish_update(
        &self,
        store: &dyn NodeStore,
        id: &str,
        operation: &'static str,
        result: Result<Vec<Node>, StorageError>,
    ) -> bool {
        match result {
            Ok(written) if written.is_empty() => {
                debug!(node_id = %id, operation, "Update target not found");
                false
            }
            Ok(written) => {
                self.settle(store, &affected_projects(&written)).await;
                true
            }
            Err(err) => {
                error!(node_id = %id, operation, error = %err, "Failed to update node");
                false
            }
        }
    }

    pub async fn soft_delete(&self, id: &str) -> bool {
        let Some(store) = self.ready_store("soft_delete").await else {
            return false;
        };
        let timestamp = self.clock.timestamp();
        let result = store.transaction(&|txn| {
            let Some(mut node) = txn.get(id)? else {
                return Ok(Vec::new());
            };
            node.mark_deleted(&timestamp);
            txn.put(&node)?;
            Ok(vec![node])
        });
        self.finish_update(&*store, id, "soft_delete", result).await
    }

    /// Soft-delete every existing id in one transaction; absent ids are skipped
    pub async fn soft_delete_many(&self, ids: &[NodeId]) -> bool {
        if ids.is_empty() {
            return true;
        }
        let Some(store) = self.ready_store("soft_delete_many").await else {
            return false;
        };
        let timestamp = self.clock.timestamp();
        match mark_deleted_in_txn(&*store, ids, &timestamp, false) {
            Ok(deleted) => {
                debug!(requested = ids.len(), deleted = deleted.len(), "Soft-deleted nodes");
                self.settle(&*store, &affected_projects(&deleted)).await;
                true
            }
            Err(err) => {
                error!(requested = ids.len(), error = %err, "Batch soft delete failed");
                false
            }
        }
    }

    /// Soft-delete every live node of a project
    pub async fn delete_by_project(&self, project_id: &str) -> bool {
        let Some(store) = self.ready_store("delete_by_project").await else {
            return false;
        };
        let ids: Vec<NodeId> = match project_nodes(&*store, project_id) {
            Ok(nodes) => nodes
                .into_iter()
                .filter(|n| !n.is_deleted)
                .map(|n| n.id)
                .collect(),
            Err(err) => {
                error!(project_id = %project_id, error = %err, "Failed to load project nodes");
                return false;
            }
        };
        self.soft_delete_many(&ids).await
    }

    /// Soft-delete a node and every live node below it
    pub async fn delete_subtree(&self, id: &str) -> Vec<NodeId> {
        let Some(store) = self.ready_store("delete_subtree").await else {
            return Vec::new();
        };
        let root = match store.get(id) {
            Ok(Some(root)) => root,
            Ok(None) => return Vec::new(),
            Err(err) => {
                error!(node_id = %id, error = %err, "Failed to read node");
                return Vec::new();
            }
        };
        let mut ids = vec![root.id.clone()];
        if root.is_folder() {
            match project_nodes(&*store, &root.project_id) {
                Ok(nodes) => ids.extend(ChildIndex::build(&nodes).descendants(id)),
                Err(err) => {
                    error!(node_id = %id, error = %err, "Failed to load subtree");
                    return Vec::new();
                }
            }
        }
        let timestamp = self.clock.timestamp();
        // Nodes deleted earlier keep their original deletion time.
        match mark_deleted_in_txn(&*store, &ids, &timestamp, true) {
            Ok(deleted) => {
                self.settle(&*store, &affected_projects(&deleted)).await;
                deleted.into_iter().map(|n| n.id).collect()
            }
            Err(err) => {
                error!(node_id = %id, error = %err, "Subtree delete failed");
                Vec::new()
            }
        }
    }

    /// Deleted nodes of a project, most recently deleted first
    pub async fn list_deleted(&self, project_id: &str) -> Vec<Node> {
        let Some(store) = self.ready_store("list_deleted").await else {
            return Vec::new();
        };
        match project_nodes(&*store, project_id) {
            Ok(nodes) => {
                let mut deleted: Vec<Node> = nodes.into_iter().filter(|n| n.is_deleted).collect();
                deleted.sort_by(|a, b| {
                    deletion_time(b)
                        .cmp(&deletion_time(a))
                        .then_with(|| b.updated_at.cmp(&a.updated_at))
                });
                deleted
            }
            Err(err) => {
                error!(project_id = %project_id, error = %err, "Failed to list deleted nodes");
                Vec::new()
            }
        }
    }

    /// Restore a node with its deleted ancestors and, for folders, its deleted subtree.
    ///
    /// Returns the restored ids: the node, then ancestors, then descendants.
    pub async fn restore(&self, id: &str) -> Vec<NodeId> {
        let Some(store) = self.ready_store("restore").await else {
            return Vec::new();
        };
        let timestamp = self.clock.timestamp();
        match cascade_restore(&*store, id, &timestamp) {
            Ok(restored) if restored.is_empty() => {
                debug!(node_id = %id, "Nothing to restore");
                Vec::new()
            }
            Ok(restored) => {
                info!(node_id = %id, restored = restored.len(), "Restored nodes");
                self.settle(&*store, &affected_projects(&restored)).await;
                restored.into_iter().map(|n| n.id).collect()
            }
            Err(err) => {
                error!(node_id = %id, error = %err, "Restore failed");
                Vec::new()
            }
        }
    }

    /// Overwrite a project with `nodes`: live nodes are soft-deleted and the
    /// remapped import inserted, all in one transaction.
    pub async fn replace_all(&self, nodes: Vec<Node>, project_id: &str) -> bool {
        let Some(store) = self.ready_store("replace_all").await else {
            return false;
        };
        let timestamp = self.clock.timestamp();
        let existing: Vec<NodeId> = match project_nodes(&*store, project_id) {
            Ok(nodes) => nodes
                .into_iter()
                .filter(|n| !n.is_deleted)
                .map(|n| n.id)
                .collect(),
            Err(err) => {
                error!(project_id = %project_id, error = %err, "Failed to load project nodes");
                return false;
            }
        };
        let import = remap_for_import(nodes, project_id, &timestamp);

        let result = store.transaction(&|txn| {
            for id in &existing {
                if let Some(mut node) = txn.get(id)? {
                    if !node.is_deleted {
                        node.mark_deleted(&timestamp);
                        txn.put(&node)?;
                    }
                }
            }
            for node in &import.nodes {
                txn.put(node)?;
            }
            Ok(import.nodes.clone())
        });
        match result {
            Ok(inserted) => {
                info!(
                    project_id = %project_id,
                    replaced = existing.len(),
                    inserted = inserted.len(),
                    "Replaced project nodes"
                );
                self.settle(&*store, &[project_id.to_string()]).await;
                true
            }
            Err(err) => {
                error!(project_id = %project_id, error = %err, "Replace import failed");
                false
            }
        }
    }

    /// Merge `nodes` into a project under fresh ids.
    ///
    /// Each node is written on its own; failed writes are skipped and left
    /// out of the returned id list.
    pub async fn append(&self, nodes: Vec<Node>, project_id: &str) -> Vec<NodeId> {
        let Some(store) = self.ready_store("append").await else {
            return Vec::new();
        };
        let timestamp = self.clock.timestamp();
        let import = remap_for_import(nodes, project_id, &timestamp);
        let mut inserted = Vec::with_capacity(import.nodes.len());
        for node in &import.nodes {
            match store.put(node) {
                Ok(()) => inserted.push(node.id.clone()),
                Err(err) => {
                    warn!(node_id = %node.id, error = %err, "Skipping node that failed to import")
                }
            }
        }
        info!(
            project_id = %project_id,
            requested = import.nodes.len(),
            inserted = inserted.len(),
            "Appended nodes"
        );
        if !inserted.is_empty() {
            self.settle(&*store, &[project_id.to_string()]).await;
        }
        inserted
    }

    /// Recount a project's documents; returns the new count
    pub async fn refresh(&self, project_id: &str) -> Option<u64> {
        let store = self.ready_store("refresh").await?;
        match self.counter.resync(&*store, project_id).await {
            Ok(doc_num) => Some(doc_num),
            Err(err) => {
                error!(project_id = %project_id, error = %err, "Failed to refresh document count");
                None
            }
        }
    }

    /// Live nodes of a project nested by parent
    pub async fn get_tree(&self, project_id: &str) -> Vec<TreeItem> {
        build_tree(&self.get_by_project(project_id).await)
    }

    /// Folder-only tree for navigation
    pub async fn get_folder_tree(&self, project_id: &str) -> Vec<TreeItem> {
        build_folder_tree(&self.get_by_project(project_id).await)
    }
}

/// Soft-delete the existing ids among `ids` in one transaction.
///
/// With `live_only`, nodes that are already deleted are left untouched and
/// not returned.
fn mark_deleted_in_txn(
    store: &dyn NodeStore,
    ids: &[NodeId],
    timestamp: &str,
    live_only: bool,
) -> Result<Vec<Node>, StorageError> {
    store.transaction(&|txn| {
        let mut deleted = Vec::new();
        for id in ids {
            if let Some(mut node) = txn.get(id)? {
                if live_only && node.is_deleted {
                    continue;
                }
                node.mark_deleted(timestamp);
                txn.put(&node)?;
                deleted.push(node);
            }
        }
        Ok(deleted)
    })
}
