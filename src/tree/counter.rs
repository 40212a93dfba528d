//! Project Counter Synchronizer
//!
//! Recounts a project's live documents and writes the exact value onto the
//! project aggregate. Always a full recount, so a counter left wrong by an
//! earlier failure heals on the next mutation.

use crate::error::ApiError;
use crate::node::Node;
use crate::project::{ProjectPatch, ProjectRepository};
use crate::store::{project_nodes, NodeStore};
use std::sync::Arc;
use tracing::debug;

pub struct ProjectCounter {
    projects: Arc<dyn ProjectRepository>,
}

impl ProjectCounter {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }

    pub fn projects(&self) -> &Arc<dyn ProjectRepository> {
        &self.projects
    }

    /// Non-deleted, non-folder nodes
    pub fn count(nodes: &[Node]) -> u64 {
        nodes.iter().filter(|n| n.is_live_document()).count() as u64
    }

    pub async fn resync(&self, store: &dyn NodeStore, project_id: &str) -> Result<u64, ApiError> {
        let nodes = project_nodes(store, project_id)?;
        let doc_num = Self::count(&nodes);
        self.projects
            .put(project_id, ProjectPatch::doc_num(doc_num))
            .await?;
        debug!(project_id = %project_id, doc_num, "Project document count synced");
        Ok(doc_num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;
    use crate::project::MemoryProjectRepository;
    use crate::store::MemoryNodeStore;

    #[tokio::test]
    async fn test_resync_counts_live_documents_only() {
        let store = MemoryNodeStore::new();
        let mut deleted = Node::new("d", "p", "", NodeType::Http, "d");
        deleted.is_deleted = true;
        for node in [
            Node::new("f", "p", "", NodeType::Folder, "f"),
            Node::new("a", "p", "f", NodeType::Http, "a"),
            Node::new("b", "p", "f", NodeType::Markdown, "b"),
            Node::new("c", "other", "", NodeType::Http, "c"),
            deleted,
        ] {
            store.put(&node).unwrap();
        }

        let projects = Arc::new(MemoryProjectRepository::new());
        let counter = ProjectCounter::new(projects.clone());
        assert_eq!(counter.resync(&store, "p").await.unwrap(), 2);
        assert_eq!(projects.get("p").await.unwrap().unwrap().doc_num, 2);
    }
}
