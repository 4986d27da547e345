use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use search_publish_core::contract::MockSearchCluster;
use search_publish_core::reconcile::{ensure_index, IndexReconciler};
use search_publish_core::TransportError;

/// A cluster holding no indexes until `create_index` is called.
fn cluster_creating_once() -> MockSearchCluster {
    let created = Arc::new(AtomicBool::new(false));
    let created_in_exists = created.clone();

    let mut cluster = MockSearchCluster::new();
    cluster
        .expect_index_exists()
        .withf(|name| name == "post")
        .returning(move |_| Ok(created_in_exists.load(Ordering::SeqCst)));
    cluster
        .expect_create_index()
        .withf(|name| name == "post")
        .times(1)
        .returning(move |_| {
            created.store(true, Ordering::SeqCst);
            Ok(())
        });
    cluster
}

#[tokio::test]
async fn test_ensure_index_twice_creates_once() {
    let cluster = cluster_creating_once();

    let first = ensure_index(&cluster, "post").await.expect("First ensure");
    let second = ensure_index(&cluster, "post").await.expect("Second ensure");

    assert!(first, "First call creates the index");
    assert!(!second, "Second call sees the index and does nothing");
}

#[tokio::test]
async fn test_ensure_index_leaves_existing_index_alone() {
    let mut cluster = MockSearchCluster::new();
    cluster.expect_index_exists().times(1).returning(|_| Ok(true));
    // No create_index expectation: calling it would panic.

    let created = ensure_index(&cluster, "post").await.expect("Ensure");
    assert!(!created);
}

#[tokio::test]
async fn test_ensure_index_surfaces_existence_check_failure() {
    let mut cluster = MockSearchCluster::new();
    cluster
        .expect_index_exists()
        .returning(|_| Err(TransportError::new("index_exists", "timeout")));

    let err = ensure_index(&cluster, "post").await.expect_err("Check fails");
    assert_eq!(err.operation, "index_exists");
}

#[tokio::test]
async fn test_reconciler_checks_each_model_once() {
    let mut cluster = MockSearchCluster::new();
    cluster.expect_index_exists().times(2).returning(|name| Ok(name == "page"));
    cluster
        .expect_create_index()
        .withf(|name| name == "post")
        .times(1)
        .returning(|_| Ok(()));

    let mut reconciler = IndexReconciler::new();
    reconciler
        .ensure_all(&cluster, ["page", "post", "post", "page"])
        .await
        .expect("Reconcile");
    reconciler.ensure(&cluster, "post").await.expect("Known model");

    assert_eq!(reconciler.created(), ["post".to_string()]);
    assert!(reconciler.is_known("page"));
    assert!(reconciler.is_known("post"));
}
