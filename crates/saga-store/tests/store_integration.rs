//! Integration tests for the in-memory saga store.

use std::sync::Arc;

use saga_store::{
    InMemorySagaStore, OrderId, SagaRecord, SagaStore, SagaStoreError, SaveOptions, Version,
};

fn record(order_id: OrderId, state: &str) -> SagaRecord {
    SagaRecord::encode(order_id, "OrderSaga", state, &serde_json::json!({ "state": state })).unwrap()
}

#[tokio::test]
async fn test_concurrent_writers_single_winner() {
    let store = Arc::new(InMemorySagaStore::new());
    let order_id = OrderId::new();
    let v1 = store
        .save(record(order_id, "Started"), SaveOptions::expect_new())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .save(
                    record(order_id, &format!("writer-{i}")),
                    SaveOptions::expect_version(v1),
                )
                .await
        }));
    }

    let mut winners = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(version) => {
                assert_eq!(version, Version::new(2));
                winners += 1;
            }
            Err(SagaStoreError::ConcurrencyConflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn test_independent_orders_do_not_interfere() {
    let store = InMemorySagaStore::new();
    let first = OrderId::new();
    let second = OrderId::new();

    store
        .save(record(first, "Started"), SaveOptions::expect_new())
        .await
        .unwrap();
    store
        .save(record(second, "Started"), SaveOptions::expect_new())
        .await
        .unwrap();
    store.archive(first).await.unwrap();

    assert!(store.load(first).await.unwrap().is_none());
    assert!(store.load(second).await.unwrap().is_some());
    assert_eq!(store.active_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_record_survives_json_roundtrip_through_store() {
    let store = InMemorySagaStore::new();
    let order_id = OrderId::new();
    store
        .save(record(order_id, "AwaitingPayment"), SaveOptions::expect_new())
        .await
        .unwrap();

    let loaded = store.load(order_id).await.unwrap().unwrap();
    let payload: serde_json::Value = loaded.decode().unwrap();
    assert_eq!(payload["state"], "AwaitingPayment");
    assert_eq!(loaded.saga_type, "OrderSaga");
}
