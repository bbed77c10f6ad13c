mod common;

use common::{engine, three_kingdoms, CountingBackend, FaultyBackend, Faults};
use graphsuite::{CentralityKind, MemoryBackend, Selector};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_probe_runs_once_across_calls() {
    let (inner, _) = three_kingdoms(MemoryBackend::new().with_analytics()).await;
    let counting = Arc::new(CountingBackend::new(inner));
    let engine = engine(counting.clone());

    for _ in 0..5 {
        assert!(engine.supports_advanced_centrality().await);
        engine.centrality_advanced(CentralityKind::PageRank, 1).await.unwrap();
    }
    assert_eq!(counting.introspections(), 1);
}

#[tokio::test]
async fn test_unsupported_answer_is_cached_too() {
    let (inner, _) = three_kingdoms(MemoryBackend::new()).await;
    let counting = Arc::new(CountingBackend::new(inner));
    let engine = engine(counting.clone());

    for _ in 0..3 {
        assert!(engine.centrality_advanced(CentralityKind::Betweenness, 1).await.is_err());
    }
    assert_eq!(counting.introspections(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_calls_share_one_probe() {
    let (inner, _) = three_kingdoms(MemoryBackend::new().with_analytics()).await;
    let counting = Arc::new(CountingBackend::new(inner).with_probe_delay(Duration::from_millis(20)));
    let engine = engine(counting.clone());

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let engine = engine.clone();
        tasks.spawn(async move { engine.supports_advanced_centrality().await });
    }
    while let Some(joined) = tasks.join_next().await {
        assert!(joined.unwrap());
    }
    assert_eq!(counting.introspections(), 1);
}

#[tokio::test]
async fn test_failing_probe_reports_false() {
    let (inner, _) = three_kingdoms(MemoryBackend::new().with_analytics().with_path_expansion()).await;
    let engine = engine(Arc::new(FaultyBackend::new(
        inner,
        Faults {
            introspection: true,
            ..Faults::default()
        },
    )));

    assert!(!engine.supports_advanced_centrality().await);
    assert!(!engine.supports_subgraph_procedure().await);

    // Traversal still works through the per-level walk
    let fragment = engine.subgraph(&Selector::property("name", "Lữ Bố"), 1, 100).await.unwrap();
    assert_eq!(fragment.node_count(), 4);
}

#[tokio::test]
async fn test_capabilities_are_probed_independently() {
    let (inner, _) = three_kingdoms(MemoryBackend::new().with_path_expansion()).await;
    let counting = Arc::new(CountingBackend::new(inner));
    let engine = engine(counting.clone());

    assert!(engine.supports_subgraph_procedure().await);
    assert_eq!(counting.introspections(), 1);
    assert_eq!(engine.capabilities().cached_advanced_centrality(), None);

    assert!(!engine.supports_advanced_centrality().await);
    assert_eq!(counting.introspections(), 2);

    engine.subgraph(&Selector::property("name", "Lữ Bố"), 2, 100).await.unwrap();
    engine.centrality_degree(3).await.unwrap();
    assert_eq!(counting.introspections(), 2);
}

#[tokio::test]
async fn test_degree_needs_no_probe() {
    let (inner, _) = three_kingdoms(MemoryBackend::new()).await;
    let counting = Arc::new(CountingBackend::new(inner));
    let engine = engine(counting.clone());

    engine.centrality_degree(5).await.unwrap();
    assert_eq!(counting.introspections(), 0);
    assert!(counting.matches.load(Ordering::SeqCst) > 0);
}
