use crate::support::{doc_num, node, sled_harness};
use doctree::NodeType;

#[tokio::test]
async fn append_remaps_ids_and_keeps_structure() {
    let h = sled_harness();
    let incoming = vec![
        node("a", "source", "", NodeType::Folder),
        node("b", "source", "a", NodeType::Http),
    ];
    let new_ids = h.cache.append(incoming, "p").await;
    assert_eq!(new_ids.len(), 2);
    assert!(!new_ids.contains(&"a".to_string()));
    assert!(!new_ids.contains(&"b".to_string()));

    let parent = h.cache.get_by_id(&new_ids[0], false).await.unwrap();
    let child = h.cache.get_by_id(&new_ids[1], false).await.unwrap();
    assert_eq!(child.pid, parent.id);
    assert_eq!(parent.project_id, "p");
    assert_eq!(child.project_id, "p");
    assert!(h.cache.get_by_id("a", true).await.is_none());
}

#[tokio::test]
async fn append_twice_never_collides() {
    let h = sled_harness();
    let source = vec![node("a", "source", "", NodeType::Http)];
    let first = h.cache.append(source.clone(), "p").await;
    let second = h.cache.append(source, "p").await;
    assert_ne!(first, second);
    assert_eq!(h.cache.get_by_project("p").await.len(), 2);
    assert_eq!(doc_num(&h.projects, "p").await, 2);
}

#[tokio::test]
async fn pasted_nodes_mount_on_existing_parent() {
    let h = sled_harness();
    h.cache.add(node("target", "p", "", NodeType::Folder)).await;

    let pasted = vec![
        node("copy", "other", "target", NodeType::Folder),
        node("leaf", "other", "copy", NodeType::Http),
    ];
    let new_ids = h.cache.append(pasted, "p").await;

    let tree = h.cache.get_tree("p").await;
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].node.id, "target");
    assert_eq!(tree[0].children[0].node.id, new_ids[0]);
    assert_eq!(tree[0].children[0].children[0].node.id, new_ids[1]);
}

#[tokio::test]
async fn dangling_mount_point_renders_at_root() {
    let h = sled_harness();
    let ids = h
        .cache
        .append(vec![node("orphan", "other", "gone", NodeType::Http)], "p")
        .await;
    let tree = h.cache.get_tree("p").await;
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].node.id, ids[0]);
    assert_eq!(tree[0].node.pid, "gone");
}

#[tokio::test]
async fn replace_all_keeps_old_nodes_as_history() {
    let h = sled_harness();
    h.cache.add(node("old-1", "p", "", NodeType::Http)).await;
    h.cache.add(node("old-2", "p", "", NodeType::Markdown)).await;

    let incoming = vec![
        node("a", "source", "", NodeType::Folder),
        node("b", "source", "a", NodeType::Http),
        node("c", "source", "a", NodeType::HttpMock),
    ];
    assert!(h.cache.replace_all(incoming, "p").await);

    let mut history: Vec<String> = h
        .cache
        .list_deleted("p")
        .await
        .into_iter()
        .map(|n| n.id)
        .collect();
    history.sort();
    assert_eq!(history, vec!["old-1", "old-2"]);
    assert_eq!(h.cache.get_by_project("p").await.len(), 3);
    assert_eq!(doc_num(&h.projects, "p").await, 2);
}

#[tokio::test]
async fn folder_tree_drops_documents() {
    let h = sled_harness();
    h.cache.add(node("f", "p", "", NodeType::Folder)).await;
    h.cache.add(node("g", "p", "f", NodeType::Folder)).await;
    h.cache.add(node("doc", "p", "f", NodeType::Http)).await;

    let tree = h.cache.get_folder_tree("p").await;
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].node.id, "g");
}
