//! Project aggregate accessor
//!
//! Projects are owned outside the node cache; the cache only writes the
//! `docNum` counter onto them. `put` upserts: patching an unknown project
//! creates it with the patched fields.

use crate::error::ApiError;
use crate::types::ProjectId;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Project record as seen by the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    /// Live, non-folder nodes in the project
    #[serde(default)]
    pub doc_num: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    pub fn new(id: impl Into<ProjectId>) -> Self {
        Self {
            id: id.into(),
            doc_num: 0,
            extra: Map::new(),
        }
    }

    fn apply(&mut self, patch: &ProjectPatch) {
        if let Some(doc_num) = patch.doc_num {
            self.doc_num = doc_num;
        }
    }
}

/// Partial update of a project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub doc_num: Option<u64>,
}

impl ProjectPatch {
    pub fn doc_num(doc_num: u64) -> Self {
        Self {
            doc_num: Some(doc_num),
        }
    }
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn get(&self, project_id: &str) -> Result<Option<Project>, ApiError>;
    async fn put(&self, project_id: &str, patch: ProjectPatch) -> Result<(), ApiError>;
}

/// Projects held in memory
#[derive(Default)]
pub struct MemoryProjectRepository {
    projects: RwLock<HashMap<ProjectId, Project>>,
}

impl MemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectRepository for MemoryProjectRepository {
    async fn get(&self, project_id: &str) -> Result<Option<Project>, ApiError> {
        Ok(self.projects.read().get(project_id).cloned())
    }

    async fn put(&self, project_id: &str, patch: ProjectPatch) -> Result<(), ApiError> {
        let mut projects = self.projects.write();
        projects
            .entry(project_id.to_string())
            .or_insert_with(|| Project::new(project_id))
            .apply(&patch);
        Ok(())
    }
}

/// Projects stored as JSON in a sled tree
pub struct SledProjectRepository {
    tree: sled::Tree,
}

impl SledProjectRepository {
    pub fn open(db: &sled::Db, namespace: &str) -> Result<Self, ApiError> {
        Ok(Self {
            tree: db.open_tree(format!("{}projects", namespace))?,
        })
    }
}

#[async_trait]
impl ProjectRepository for SledProjectRepository {
    async fn get(&self, project_id: &str) -> Result<Option<Project>, ApiError> {
        match self.tree.get(project_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, project_id: &str, patch: ProjectPatch) -> Result<(), ApiError> {
        let mut project = match self.tree.get(project_id.as_bytes())? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Project::new(project_id),
        };
        project.apply(&patch);
        self.tree
            .insert(project_id.as_bytes(), serde_json::to_vec(&project)?)?;
        Ok(())
    }
}
