mod common;

use common::{engine, three_kingdoms, wait_for_cleanup, FaultyBackend, Faults, SlowBackend, StallingBackend};
use graphsuite::{CentralityKind, ErrorKind, MemoryBackend, Phase};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_degree_on_dataset() {
    let (_, engine) = three_kingdoms(MemoryBackend::new()).await;
    let scores = engine.centrality_degree(3).await.unwrap();

    let top: Vec<(&str, u64)> = scores.iter().map(|s| (s.name.as_str(), s.score)).collect();
    assert_eq!(top, vec![("Tào Tháo", 12), ("Lưu Bị", 11), ("Tôn Quyền", 10)]);
}

#[tokio::test]
async fn test_degree_ordering_is_total_and_stable() {
    let (_, engine) = three_kingdoms(MemoryBackend::new()).await;
    let first = engine.centrality_degree(100).await.unwrap();
    assert_eq!(first.len(), 37);

    for _ in 0..3 {
        assert_eq!(engine.centrality_degree(100).await.unwrap(), first);
    }
    for pair in first.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.score > b.score || (a.score == b.score && (a.name.as_str(), a.node_id) < (b.name.as_str(), b.node_id)));
    }
    // Hoa Đà and Trương Tùng have no relationships
    assert_eq!(first[35].score, 0);
    assert_eq!(first[36].score, 0);
}

#[tokio::test]
async fn test_advanced_requires_capability_for_both_kinds() {
    let (backend, engine) = three_kingdoms(MemoryBackend::new()).await;
    for kind in [CentralityKind::PageRank, CentralityKind::Betweenness] {
        let err = engine.centrality_advanced(kind, 10).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
        assert!(err.to_string().contains("analytics"));
    }
    assert!(backend.active_computations().is_empty());
}

#[tokio::test]
async fn test_failing_probe_reports_unsupported() {
    let (inner, _) = three_kingdoms(MemoryBackend::new().with_analytics()).await;
    let engine = engine(Arc::new(FaultyBackend::new(
        inner,
        Faults {
            introspection: true,
            ..Faults::default()
        },
    )));
    let err = engine.centrality_advanced(CentralityKind::PageRank, 10).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
}

#[tokio::test]
async fn test_pagerank_cleans_up_after_success() {
    let (backend, engine) = three_kingdoms(MemoryBackend::new().with_analytics()).await;
    let result = engine.centrality_advanced(CentralityKind::PageRank, 5).await.unwrap();

    assert_eq!(result.kind, CentralityKind::PageRank);
    assert_eq!(result.scores.len(), 5);
    assert!(result.computation.starts_with("graphsuite_pagerank_"));
    assert!(result.scores.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(backend.active_computations().is_empty());
}

#[tokio::test]
async fn test_each_call_uses_a_fresh_computation() {
    let (_, engine) = three_kingdoms(MemoryBackend::new().with_analytics()).await;
    let a = engine.centrality_advanced(CentralityKind::Betweenness, 1).await.unwrap();
    let b = engine.centrality_advanced(CentralityKind::Betweenness, 1).await.unwrap();
    assert_ne!(a.computation, b.computation);
    assert_eq!(a.scores, b.scores);
}

#[tokio::test]
async fn test_betweenness_follows_relationship_direction() {
    let (_, engine) = three_kingdoms(MemoryBackend::new().with_analytics()).await;
    let result = engine.centrality_advanced(CentralityKind::Betweenness, 1).await.unwrap();
    // Directed routes from Wu into Shu, and from Wei into Wu, all pass through Tôn Quyền
    assert_eq!(result.scores[0].name, "Tôn Quyền");
}

#[tokio::test]
async fn test_cleanup_after_algorithm_failure() {
    let (inner, _) = three_kingdoms(MemoryBackend::new().with_analytics()).await;
    let engine = engine(Arc::new(FaultyBackend::new(
        inner.clone(),
        Faults {
            algorithm: true,
            ..Faults::default()
        },
    )));

    let err = engine.centrality_advanced(CentralityKind::PageRank, 10).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendFailure);
    assert_eq!(err.phase(), Some(Phase::Algorithm));
    assert!(inner.active_computations().is_empty());
}

#[tokio::test]
async fn test_algorithm_error_wins_over_cleanup_error() {
    let (inner, _) = three_kingdoms(MemoryBackend::new().with_analytics()).await;
    let engine = engine(Arc::new(FaultyBackend::new(
        inner,
        Faults {
            algorithm: true,
            drop: true,
            ..Faults::default()
        },
    )));

    let err = engine.centrality_advanced(CentralityKind::Betweenness, 10).await.unwrap_err();
    assert_eq!(err.phase(), Some(Phase::Algorithm));
}

#[tokio::test]
async fn test_cleanup_failure_after_success_fails_the_call() {
    let (inner, _) = three_kingdoms(MemoryBackend::new().with_analytics()).await;
    let engine = engine(Arc::new(FaultyBackend::new(
        inner,
        Faults {
            drop: true,
            ..Faults::default()
        },
    )));

    let err = engine.centrality_advanced(CentralityKind::PageRank, 10).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendFailure);
    assert_eq!(err.phase(), Some(Phase::Cleanup));
}

#[tokio::test]
async fn test_cleanup_after_cancellation() {
    let (inner, _) = three_kingdoms(MemoryBackend::new().with_analytics()).await;
    let stalling = Arc::new(StallingBackend::new(inner.clone()));
    let engine = engine(stalling.clone());

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        engine.centrality_advanced(CentralityKind::PageRank, 10),
    )
    .await;

    assert!(outcome.is_err(), "stalled run should time out");
    assert_eq!(stalling.started.load(Ordering::SeqCst), 1);
    assert!(wait_for_cleanup(&inner).await, "computation left behind after cancellation");
}

#[tokio::test]
async fn test_cleanup_after_cancellation_during_projection() {
    let (inner, _) = three_kingdoms(MemoryBackend::new().with_analytics()).await;
    let engine = engine(Arc::new(
        SlowBackend::new(inner.clone()).with_create_delay(Duration::from_millis(200)),
    ));

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        engine.centrality_advanced(CentralityKind::PageRank, 5),
    )
    .await;

    assert!(outcome.is_err(), "slow projection should time out");
    assert!(wait_for_cleanup(&inner).await, "computation left behind after cancelled projection");
}

#[tokio::test]
async fn test_cleanup_after_cancellation_during_release() {
    let (inner, _) = three_kingdoms(MemoryBackend::new().with_analytics()).await;
    let engine = engine(Arc::new(
        SlowBackend::new(inner.clone()).with_drop_delay(Duration::from_millis(200)),
    ));

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        engine.centrality_advanced(CentralityKind::Betweenness, 5),
    )
    .await;

    assert!(outcome.is_err(), "slow release should time out");
    assert_eq!(inner.active_computations().len(), 1);
    assert!(wait_for_cleanup(&inner).await, "computation left behind after cancelled release");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_leave_nothing_behind() {
    let (backend, engine) = three_kingdoms(MemoryBackend::new().with_analytics()).await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let engine = engine.clone();
        let kind = if i % 2 == 0 {
            CentralityKind::PageRank
        } else {
            CentralityKind::Betweenness
        };
        tasks.spawn(async move { engine.centrality_advanced(kind, 3).await });
    }
    while let Some(joined) = tasks.join_next().await {
        assert_eq!(joined.unwrap().unwrap().scores.len(), 3);
    }
    assert!(backend.active_computations().is_empty());
}
