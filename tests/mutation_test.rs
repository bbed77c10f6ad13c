mod common;

use common::{engine, three_kingdoms};
use graphsuite::{props, ErrorKind, MemoryBackend, NodeId, PropertyMap, PropertyValue, Selector};
use std::sync::Arc;

#[tokio::test]
async fn test_upsert_node_twice_keeps_identity() {
    let backend = Arc::new(MemoryBackend::new());
    let engine = engine(backend.clone());

    let first = engine
        .upsert_node("Character", "name", props! { "name" => "Quan Vũ", "faction" => "Thục Hán" })
        .await
        .unwrap();
    let second = engine
        .upsert_node("Character", "name", props! { "name" => "Quan Vũ", "faction" => "Tào Ngụy" })
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.get_property("faction"), Some(&PropertyValue::from("Tào Ngụy")));
    assert_eq!(backend.store_read().await.node_count(), 1);
}

#[tokio::test]
async fn test_merge_key_is_scoped_by_label() {
    let backend = Arc::new(MemoryBackend::new());
    let engine = engine(backend.clone());

    let person = engine
        .upsert_node("Character", "name", props! { "name" => "Xích Bích" })
        .await
        .unwrap();
    let place = engine
        .upsert_node("Place", "name", props! { "name" => "Xích Bích" })
        .await
        .unwrap();
    assert_ne!(person.id, place.id);
}

#[tokio::test]
async fn test_identifiers_are_sanitized() {
    let backend = Arc::new(MemoryBackend::new());
    let engine = engine(backend.clone());

    let node = engine
        .upsert_node("Char`acter) DETACH DELETE", "name", props! { "name" => "X" })
        .await
        .unwrap();
    assert_eq!(node.labels[0].as_str(), "CharacterDETACHDELETE");

    let err = engine
        .upsert_node("Character", "name) SET n.x", props! { "name" => "X" })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);
    assert!(err.kind().is_invalid_argument());
}

#[tokio::test]
async fn test_missing_endpoint_creates_nothing() {
    let (backend, engine) = three_kingdoms(MemoryBackend::new()).await;
    let before = backend.store_read().await.relationship_count();

    let err = engine
        .upsert_relationship("ENEMY", NodeId::new(1), NodeId::new(999), PropertyMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(backend.store_read().await.relationship_count(), before);
}

#[tokio::test]
async fn test_invalid_property_key_rejects_whole_call() {
    let (backend, engine) = three_kingdoms(MemoryBackend::new()).await;
    let err = engine
        .upsert_relationship(
            "ENEMY",
            NodeId::new(1),
            NodeId::new(2),
            props! { "since" => 220i64, "2nd" => "x" },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);

    let store = backend.store_read().await;
    assert!(store
        .find_relationship(NodeId::new(1), NodeId::new(2), &"ENEMY".into())
        .is_none());
}

#[tokio::test]
async fn test_connect_by_key_reuses_existing_nodes() {
    let (backend, engine) = three_kingdoms(MemoryBackend::new()).await;

    let rel = engine
        .connect_by_key(
            "Character",
            "character_id",
            63i64,
            20i64,
            "physician",
            props! { "description" => "Hoa Đà chữa bệnh cho Tào Tháo" },
        )
        .await
        .unwrap();
    assert_eq!(rel.rel_type.as_str(), "PHYSICIAN");

    let store = backend.store_read().await;
    assert_eq!(store.node_count(), 37);
    assert_eq!(store.relationship_count(), 37);
    drop(store);

    let fragment = engine
        .filter_relation(&Selector::property("name", "Hoa Đà"), "PHYSICIAN", 10)
        .await
        .unwrap();
    let names: Vec<String> = fragment.nodes().map(|n| n.display_name("name")).collect();
    assert_eq!(names, vec!["Hoa Đà", "Tào Tháo"]);
}

#[tokio::test]
async fn test_connect_by_key_validates_before_writing() {
    let backend = Arc::new(MemoryBackend::new());
    let engine = engine(backend.clone());

    for (label, key, rel_type) in [("", "name", "ALLY"), ("Character", "bad key", "ALLY"), ("Character", "name", "---")] {
        let err = engine
            .connect_by_key(label, key, "A", "B", rel_type, PropertyMap::new())
            .await
            .unwrap_err();
        assert!(err.kind().is_invalid_argument());
    }
    assert_eq!(backend.store_read().await.node_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_converge() {
    let backend = Arc::new(MemoryBackend::new());
    let engine = engine(backend.clone());

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16i64 {
        let engine = engine.clone();
        tasks.spawn(async move {
            engine
                .upsert_node("Character", "name", props! { "name" => "Triệu Vân", "visits" => i })
                .await
        });
    }

    let mut ids = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        ids.push(joined.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(backend.store_read().await.node_count(), 1);
}
