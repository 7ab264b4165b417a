use rebind::core::blueprint::CallbackOptions;
use rebind::core::dependency::{input, output, serverside_output};
use rebind::core::invocation::{handler, InvocationContext, OutputUpdate};
use rebind::core::registry::BlueprintRegistry;
use rebind::core::store::{CacheToken, MemoryStore, ValueStore};
use rebind::core::transform::ServersideOutputTransform;
use rebind::core::types::ErrorCategory;
use serde_json::{json, Value};
use std::sync::Arc;

fn cached_registry(store: Arc<MemoryStore>) -> BlueprintRegistry {
    let registry = BlueprintRegistry::with_transforms(vec![Arc::new(
        ServersideOutputTransform::new(store),
    )]);
    // Writer: keeps its expensive payload server-side.
    registry
        .callback(
            vec![
                serverside_output("store", "children").into(),
                input("btn", "n_clicks").into(),
            ],
            CallbackOptions::new(),
            handler(|_ctx| async move {
                Ok(vec![OutputUpdate::Set(json!({"A": {"0": 1}}))])
            }),
        )
        .expect("writer declaration");
    // Reader: echoes whatever arrives so tests can observe materialization.
    registry
        .callback(
            vec![
                output("log", "children").into(),
                input("store", "children").into(),
            ],
            CallbackOptions::new(),
            handler(|ctx: InvocationContext| async move {
                Ok(vec![OutputUpdate::Set(ctx.args[0].clone())])
            }),
        )
        .expect("reader declaration");
    registry
}

async fn invoke_writer(resolution: &rebind::core::registry::Resolution, session: &str) -> Value {
    let writer = resolution.find("store", "children").expect("writer");
    let wrapped = writer.handler.clone().expect("handler");
    let updates = wrapped(InvocationContext::new(vec![json!(1)]).with_session(session))
        .await
        .expect("writer invocation");
    updates[0].clone().into_value().expect("set update")
}

#[tokio::test]
async fn test_transport_carries_token_not_payload() {
    let store = Arc::new(MemoryStore::new());
    let registry = cached_registry(store.clone());
    let resolution = registry.resolve().expect("resolution");

    let transported = invoke_writer(&resolution, "session-1").await;
    // What crosses the transport boundary is a token, not the payload.
    let token = CacheToken::from_value(&transported).expect("token shape");
    assert_ne!(transported, json!({"A": {"0": 1}}));
    // The payload itself landed in the store.
    assert_eq!(
        store.get(&token.key).await.expect("stored value"),
        json!({"A": {"0": 1}})
    );
}

#[tokio::test]
async fn test_round_trip_through_reader() {
    let store = Arc::new(MemoryStore::new());
    let registry = cached_registry(store);
    let resolution = registry.resolve().expect("resolution");

    let transported = invoke_writer(&resolution, "session-1").await;

    let reader = resolution.find("log", "children").expect("reader");
    let wrapped = reader.handler.clone().expect("handler");
    let updates = wrapped(
        InvocationContext::new(vec![transported]).with_session("session-1"),
    )
    .await
    .expect("reader invocation");
    // The reader's handler saw the materialized value, structurally equal to
    // what the writer returned.
    assert_eq!(updates, vec![OutputUpdate::Set(json!({"A": {"0": 1}}))]);
}

#[tokio::test]
async fn test_token_stable_per_session_and_slot() {
    let store = Arc::new(MemoryStore::new());
    let registry = cached_registry(store);
    let resolution = registry.resolve().expect("resolution");

    let first = invoke_writer(&resolution, "session-1").await;
    let second = invoke_writer(&resolution, "session-1").await;
    assert_eq!(first, second);

    let other_session = invoke_writer(&resolution, "session-2").await;
    assert_ne!(first, other_session);
}

#[tokio::test]
async fn test_missing_key_is_a_distinct_failure() {
    let store = Arc::new(MemoryStore::new());
    let registry = cached_registry(store);
    let resolution = registry.resolve().expect("resolution");

    let reader = resolution.find("log", "children").expect("reader");
    let wrapped = reader.handler.clone().expect("handler");
    let evicted = CacheToken::new("0000deadbeef").to_value();
    let err = wrapped(InvocationContext::new(vec![evicted]))
        .await
        .expect_err("evicted key");
    assert_eq!(err.category, ErrorCategory::NotFoundError);
    assert_eq!(err.code, "CBK-STORE-001");
}

#[tokio::test]
async fn test_no_change_skips_the_store() {
    let store = Arc::new(MemoryStore::new());
    let registry = BlueprintRegistry::with_transforms(vec![Arc::new(
        ServersideOutputTransform::new(store.clone()),
    )]);
    registry
        .callback(
            vec![
                serverside_output("store", "children").into(),
                input("btn", "n_clicks").into(),
            ],
            CallbackOptions::new(),
            handler(|_ctx| async move { Ok(vec![OutputUpdate::NoChange]) }),
        )
        .expect("declaration");

    let resolution = registry.resolve().expect("resolution");
    let wrapped = resolution.registrations[0].handler.clone().expect("handler");
    let updates = wrapped(InvocationContext::new(vec![json!(1)]))
        .await
        .expect("invocation");
    assert_eq!(updates, vec![OutputUpdate::NoChange]);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_plain_outputs_untouched() {
    let store = Arc::new(MemoryStore::new());
    let registry = cached_registry(store.clone());
    let resolution = registry.resolve().expect("resolution");

    // The reader's own output is not serverside; its result passes through.
    let reader = resolution.find("log", "children").expect("reader");
    let wrapped = reader.handler.clone().expect("handler");
    let updates = wrapped(InvocationContext::new(vec![json!("plain")]))
        .await
        .expect("invocation");
    assert_eq!(updates, vec![OutputUpdate::Set(json!("plain"))]);
    assert!(store.is_empty());
}
