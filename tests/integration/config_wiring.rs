use doctree::config::{DoctreeConfig, StorageMode};
use doctree::project::ProjectRepository;
use doctree::{Node, NodeType, TreeCache};
use tempfile::TempDir;

fn config_at(dir: &TempDir, mode: StorageMode) -> DoctreeConfig {
    let mut config = DoctreeConfig::default();
    config.storage.mode = mode;
    config.storage.path = Some(dir.path().join("store"));
    config
}

#[tokio::test]
async fn standalone_config_counts_into_project_store() {
    let dir = TempDir::new().unwrap();
    let cache = TreeCache::from_config(&config_at(&dir, StorageMode::Standalone))
        .await
        .unwrap();

    assert!(cache.add(Node::new("a", "p", "", NodeType::Http, "a")).await);
    let project = cache.projects().get("p").await.unwrap().unwrap();
    assert_eq!(project.doc_num, 1);
    assert!(dir.path().join("store").join("nodes").exists());
}

#[tokio::test]
async fn shared_config_uses_namespaced_trees() {
    let dir = TempDir::new().unwrap();
    let config = config_at(&dir, StorageMode::Shared);
    {
        let cache = TreeCache::from_config(&config).await.unwrap();
        assert!(cache.add(Node::new("a", "p", "", NodeType::Markdown, "a")).await);
    }

    let db = sled::open(dir.path().join("store")).unwrap();
    let names: Vec<String> = db
        .tree_names()
        .into_iter()
        .map(|n| String::from_utf8_lossy(&n).into_owned())
        .collect();
    assert!(names.contains(&"apis/nodes".to_string()));
    assert!(names.contains(&"apis/nodes_by_project".to_string()));
    assert!(names.contains(&"apis/projects".to_string()));
}
