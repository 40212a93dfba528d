use crate::support::{node, sled_harness};
use doctree::store::NodeStore;
use doctree::NodeType;

#[tokio::test]
async fn mutation_evicts_the_view_immediately() {
    let h = sled_harness();
    h.cache.add(node("a", "p", "", NodeType::Http)).await;
    assert_eq!(h.cache.get_by_project("p").await.len(), 1);

    h.cache.rename("a", "renamed").await;
    let view = h.cache.get_by_project("p").await;
    assert_eq!(view[0].info.name, "renamed");

    h.cache.soft_delete("a").await;
    assert!(h.cache.get_by_project("p").await.is_empty());
}

#[tokio::test]
async fn out_of_band_writes_show_after_ttl() {
    let h = sled_harness();
    h.cache.add(node("a", "p", "", NodeType::Http)).await;
    assert_eq!(h.cache.get_by_project("p").await.len(), 1);

    let store = h.cache.store().await.unwrap();
    store.put(&node("b", "p", "", NodeType::Http)).unwrap();

    h.clock.advance(chrono::Duration::minutes(4));
    assert_eq!(h.cache.get_by_project("p").await.len(), 1);

    h.clock.advance(chrono::Duration::minutes(1));
    assert_eq!(h.cache.get_by_project("p").await.len(), 2);
}

#[tokio::test]
async fn views_are_per_project() {
    let h = sled_harness();
    h.cache.add(node("a", "p", "", NodeType::Http)).await;
    h.cache.add(node("b", "q", "", NodeType::Http)).await;
    assert_eq!(h.cache.get_by_project("p").await.len(), 1);
    assert_eq!(h.cache.get_by_project("q").await.len(), 1);

    h.cache.add(node("c", "q", "", NodeType::Http)).await;
    assert_eq!(h.cache.get_by_project("p").await.len(), 1);
    assert_eq!(h.cache.get_by_project("q").await.len(), 2);
}
