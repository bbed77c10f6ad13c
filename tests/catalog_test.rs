mod common;

use common::{engine_with, seed_three_kingdoms, three_kingdoms};
use graphsuite::{props, EngineConfig, ErrorKind, MemoryBackend, Phase, PropertyValue, Selector};
use std::sync::Arc;

#[tokio::test]
async fn test_list_nodes_in_id_order() {
    let (_, engine) = three_kingdoms(MemoryBackend::new()).await;

    assert_eq!(engine.list_nodes(100).await.unwrap().len(), 37);
    let first: Vec<String> = engine
        .list_nodes(3)
        .await
        .unwrap()
        .iter()
        .map(|n| n.display_name("name"))
        .collect();
    assert_eq!(first, vec!["Lưu Bị", "Quan Vũ", "Trương Phi"]);
}

#[tokio::test]
async fn test_get_node_by_name_or_key() {
    let (_, engine) = three_kingdoms(MemoryBackend::new()).await;

    let by_key = engine
        .get_node(&Selector::parse("character_id=63", "name").unwrap())
        .await
        .unwrap();
    let by_name = engine.get_node(&Selector::property("name", "Hoa Đà")).await.unwrap();
    assert_eq!(by_key, by_name);

    let err = engine.get_node(&Selector::property("name", "Gia Cát Cẩn")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_distinct_factions() {
    let (_, engine) = three_kingdoms(MemoryBackend::new()).await;
    let factions = engine.distinct_values("faction").await.unwrap();
    assert_eq!(
        factions,
        vec![
            PropertyValue::from("Thục Hán"),
            PropertyValue::from("Tào Ngụy"),
            PropertyValue::from("Đông Ngô"),
            PropertyValue::from("Khác"),
        ]
    );

    assert!(engine.distinct_values("title").await.unwrap().is_empty());
    let err = engine.distinct_values("").await.unwrap_err();
    assert!(err.kind().is_invalid_argument());
}

#[tokio::test]
async fn test_update_node_shows_up_in_reads() {
    let (_, engine) = three_kingdoms(MemoryBackend::new()).await;
    let hoa_da = Selector::property("name", "Hoa Đà");

    let updated = engine
        .update_node(&hoa_da, props! { "faction" => "Danh y", "hometown" => "Bái quốc" })
        .await
        .unwrap();
    assert_eq!(updated.get_property("character_id"), Some(&PropertyValue::Integer(63)));
    assert_eq!(engine.get_node(&hoa_da).await.unwrap(), updated);

    let factions = engine.distinct_values("faction").await.unwrap();
    assert_eq!(factions.last(), Some(&PropertyValue::from("Danh y")));
    assert_eq!(factions.len(), 5);

    let err = engine
        .update_node(&hoa_da, props! { "faction" => "Khác", "home town" => "x" })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);
    assert_eq!(
        engine.get_node(&hoa_da).await.unwrap().get_property("faction"),
        Some(&PropertyValue::from("Danh y"))
    );
}

#[tokio::test]
async fn test_delete_refuses_connected_character() {
    let (backend, engine) = three_kingdoms(MemoryBackend::new()).await;

    let err = engine.delete_node(&Selector::property("name", "Lưu Bị")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendFailure);
    assert_eq!(err.phase(), Some(Phase::Merge));

    let store = backend.store_read().await;
    assert_eq!(store.node_count(), 37);
    assert_eq!(store.relationship_count(), 36);
}

#[tokio::test]
async fn test_delete_isolated_character() {
    let (backend, engine) = three_kingdoms(MemoryBackend::new()).await;
    let hoa_da = Selector::property("name", "Hoa Đà");

    let deleted = engine.delete_node(&hoa_da).await.unwrap();
    assert_eq!(deleted.display_name("name"), "Hoa Đà");
    assert_eq!(backend.store_read().await.node_count(), 36);

    for err in [
        engine.get_node(&hoa_da).await.unwrap_err(),
        engine.delete_node(&hoa_da).await.unwrap_err(),
        engine.delete_node(&Selector::id(deleted.id)).await.unwrap_err(),
        engine.update_node(&hoa_da, props! { "faction" => "Khác" }).await.unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
    assert!(engine.search("Hoa Đà", 10).await.unwrap().is_empty());
    assert_eq!(engine.list_nodes(100).await.unwrap().len(), 36);
}

#[tokio::test]
async fn test_catalog_respects_node_label() {
    let backend = Arc::new(MemoryBackend::new());
    seed_three_kingdoms(backend.clone()).await;
    let engine = engine_with(
        backend.clone(),
        EngineConfig {
            node_label: Some("Place".to_string()),
            ..EngineConfig::default()
        },
    );

    assert!(engine.list_nodes(100).await.unwrap().is_empty());
    assert!(engine.distinct_values("faction").await.unwrap().is_empty());

    let err = engine
        .update_node(&Selector::property("name", "Tào Tháo"), props! { "faction" => "Đông Hán" })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
