use chrono::TimeZone;
use doctree::project::{MemoryProjectRepository, ProjectRepository};
use doctree::store::{SharedStoreProvider, StoreProvider};
use doctree::types::ManualClock;
use doctree::{Node, NodeType, TreeCache, TreeCacheOptions};
use std::sync::Arc;
use tempfile::TempDir;

/// Tree cache over a sled database in a temp dir, with a manual clock
pub struct Harness {
    pub cache: TreeCache,
    pub projects: Arc<MemoryProjectRepository>,
    pub clock: Arc<ManualClock>,
    _dir: TempDir,
}

pub fn sled_harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let db = sled::open(dir.path().join("db")).unwrap();
    let provider: Arc<dyn StoreProvider> = Arc::new(SharedStoreProvider::new(db, "apis/"));
    let projects = Arc::new(MemoryProjectRepository::new());
    let clock = Arc::new(ManualClock::new(
        chrono::Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
    ));
    let cache = TreeCache::with_options(
        provider,
        projects.clone(),
        TreeCacheOptions::default().with_clock(clock.clone()),
    );
    Harness {
        cache,
        projects,
        clock,
        _dir: dir,
    }
}

pub fn node(id: &str, project: &str, pid: &str, node_type: NodeType) -> Node {
    Node::new(id, project, pid, node_type, id)
}

pub async fn doc_num(projects: &MemoryProjectRepository, project_id: &str) -> u64 {
    projects
        .get(project_id)
        .await
        .unwrap()
        .map(|p| p.doc_num)
        .unwrap_or_default()
}

pub fn ids(nodes: &[Node]) -> Vec<String> {
    let mut ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
    ids.sort();
    ids
}
