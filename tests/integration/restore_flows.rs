use crate::support::{ids, node, sled_harness};
use doctree::NodeType;

#[tokio::test]
async fn soft_delete_is_reversible() {
    let h = sled_harness();
    h.cache.add(node("n", "p", "", NodeType::Http)).await;

    assert!(h.cache.soft_delete("n").await);
    assert!(h.cache.get_by_project("p").await.is_empty());

    assert_eq!(h.cache.restore("n").await, vec!["n"]);
    let live = h.cache.get_by_project("p").await;
    assert_eq!(ids(&live), vec!["n"]);
    assert!(!live[0].is_deleted);
}

#[tokio::test]
async fn restoring_a_leaf_restores_its_ancestors() {
    let h = sled_harness();
    h.cache.add(node("a", "p", "", NodeType::Folder)).await;
    h.cache.add(node("b", "p", "a", NodeType::Folder)).await;
    h.cache.add(node("c", "p", "b", NodeType::Http)).await;
    let all = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    assert!(h.cache.soft_delete_many(&all).await);

    assert_eq!(h.cache.restore("c").await, vec!["c", "b", "a"]);
    assert_eq!(h.cache.get_by_project("p").await.len(), 3);
}

#[tokio::test]
async fn restoring_a_folder_restores_its_subtree() {
    let h = sled_harness();
    h.cache.add(node("f", "p", "", NodeType::Folder)).await;
    h.cache.add(node("x", "p", "f", NodeType::Http)).await;
    h.cache.add(node("y", "p", "f", NodeType::Folder)).await;
    h.cache.add(node("z", "p", "y", NodeType::Websocket)).await;
    h.cache.add(node("outside", "p", "", NodeType::Http)).await;
    let doomed: Vec<String> = ["f", "x", "y", "z", "outside"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    h.cache.soft_delete_many(&doomed).await;

    let mut restored = h.cache.restore("f").await;
    assert_eq!(restored[0], "f");
    restored.sort();
    assert_eq!(restored, vec!["f", "x", "y", "z"]);

    let deleted = h.cache.list_deleted("p").await;
    assert_eq!(ids(&deleted), vec!["outside"]);
}

#[tokio::test]
async fn restore_of_unknown_or_live_node_is_empty() {
    let h = sled_harness();
    h.cache.add(node("a", "p", "", NodeType::Http)).await;
    assert!(h.cache.restore("a").await.is_empty());
    assert!(h.cache.restore("missing").await.is_empty());
}

#[tokio::test]
async fn batch_delete_tolerates_missing_ids() {
    let h = sled_harness();
    h.cache.add(node("x", "p", "", NodeType::Http)).await;
    h.cache.add(node("y", "p", "", NodeType::Http)).await;

    let batch = vec!["x".to_string(), "y".to_string(), "nonexistent".to_string()];
    assert!(h.cache.soft_delete_many(&batch).await);
    assert_eq!(ids(&h.cache.list_deleted("p").await), vec!["x", "y"]);
}

#[tokio::test]
async fn delete_by_project_leaves_other_projects() {
    let h = sled_harness();
    h.cache.add(node("a", "p", "", NodeType::Http)).await;
    h.cache.add(node("b", "q", "", NodeType::Http)).await;

    assert!(h.cache.delete_by_project("p").await);
    assert!(h.cache.get_by_project("p").await.is_empty());
    assert_eq!(h.cache.get_by_project("q").await.len(), 1);
    assert_eq!(h.cache.get_all(true).await.len(), 2);
    assert_eq!(h.cache.get_all(false).await.len(), 1);
}

#[tokio::test]
async fn deleted_listing_orders_by_deletion_time() {
    let h = sled_harness();
    for id in ["first", "second", "third"] {
        h.cache.add(node(id, "p", "", NodeType::Markdown)).await;
    }
    for id in ["first", "second", "third"] {
        h.cache.soft_delete(id).await;
        h.clock.advance(chrono::Duration::minutes(1));
    }
    let order: Vec<String> = h
        .cache
        .list_deleted("p")
        .await
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(order, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn subtree_delete_keeps_earlier_deletions() {
    let h = sled_harness();
    h.cache.add(node("f", "p", "", NodeType::Folder)).await;
    h.cache.add(node("old", "p", "f", NodeType::Http)).await;
    h.cache.add(node("x", "p", "f", NodeType::Http)).await;
    assert!(h.cache.soft_delete("old").await);
    let deleted_at = h.cache.get_by_id("old", true).await.unwrap().updated_at;

    h.clock.advance(chrono::Duration::hours(1));
    let mut deleted = h.cache.delete_subtree("f").await;
    deleted.sort();
    assert_eq!(deleted, vec!["f", "x"]);

    let old = h.cache.get_by_id("old", true).await.unwrap();
    assert_eq!(old.updated_at, deleted_at);
    let order: Vec<String> = h
        .cache
        .list_deleted("p")
        .await
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(order.last().map(String::as_str), Some("old"));
}
