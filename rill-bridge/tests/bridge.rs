//! Bridge tests: loading wrapped functions by name and calling them.
//!
//! Tests cover:
//! - Positional and named arguments, defaults
//! - Error port, rejected futures and callback errors resolve as errors
//! - Result shapes for one and several success ports
//! - invoke / as_callback completions
//! - Load failures, argument mismatches and timeouts

use rill_adapter::{FunctionAdapter, InvocationError};
use rill_bridge::*;
use rill_core::test_utils::InMemoryLoader;
use rill_core::{ComponentLoader, LoadError};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

fn loader() -> Arc<InMemoryLoader> {
    let loader = InMemoryLoader::new();
    loader.register(
        "greet/one",
        FunctionAdapter::builder()
            .param("hello")
            .sync(|args| Ok::<_, InvocationError>(format!("Hello {}", args.text(0))))
            .unwrap()
            .into_factory(),
    );
    loader.register(
        "greet/two",
        FunctionAdapter::builder()
            .params(["greeting", "name"])
            .sync(|args| Ok::<_, InvocationError>(format!("{} {}", args.text(0), args.text(1))))
            .unwrap()
            .into_factory(),
    );
    loader.register(
        "greet/default",
        FunctionAdapter::builder()
            .param("name")
            .param_with_default("greeting", "Hello")
            .sync(|args| Ok::<_, InvocationError>(format!("{} {}", args.text(1), args.text(0))))
            .unwrap()
            .into_factory(),
    );
    loader.register(
        "fail/sync",
        FunctionAdapter::builder()
            .param("hello")
            .sync(|args| Err::<Value, _>(InvocationError::new(format!("Hello {}", args.text(0)))))
            .unwrap()
            .into_factory(),
    );
    loader.register(
        "fail/promise",
        FunctionAdapter::builder()
            .param("hello")
            .promise(|args| {
                let name = args.text(0);
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Err::<Value, _>(InvocationError::new(format!("Hello {name}")))
                }
            })
            .unwrap()
            .into_factory(),
    );
    loader.register(
        "math/divmod",
        FunctionAdapter::builder()
            .params(["a", "b"])
            .results(["quotient", "remainder"])
            .callback(|args, done| match (args.parse::<i64>("a"), args.parse::<i64>("b")) {
                (Ok(_), Ok(0)) => done.reject("division by zero"),
                (Ok(a), Ok(b)) => done.call(None, vec![json!(a / b), json!(a % b)]),
                _ => done.reject("not numbers"),
            })
            .unwrap()
            .into_factory(),
    );
    Arc::new(loader)
}

fn bridge() -> CallbackBridge {
    CallbackBridge::new(loader())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Success
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn positional_argument_to_single_port() {
    let result = bridge().call("greet/one", "World").await.unwrap();
    assert_eq!(result, json!("Hello World"));
}

#[tokio::test]
async fn named_arguments_to_several_ports() {
    let result = bridge()
        .call("greet/two", json!({"greeting": "Hei", "name": "Maailma"}))
        .await
        .unwrap();
    assert_eq!(result, json!("Hei Maailma"));
}

#[tokio::test]
async fn defaults_apply_to_missing_named_arguments() {
    let result = bridge()
        .call("greet/default", json!({"name": "Maailma"}))
        .await
        .unwrap();
    assert_eq!(result, json!("Hello Maailma"));
}

#[tokio::test]
async fn positional_argument_to_sole_required_port() {
    let result = bridge().call("greet/default", "Maailma").await.unwrap();
    assert_eq!(result, json!("Hello Maailma"));
}

#[tokio::test]
async fn mirror_input_keys_named_results_by_port() {
    let bridge = bridge().with_config(BridgeConfig::default().with_result_shape(ResultShape::MirrorInput));
    let result = bridge
        .call("greet/two", json!({"greeting": "Hei", "name": "Maailma"}))
        .await
        .unwrap();
    assert_eq!(result, json!({"out": "Hei Maailma"}));
    let result = bridge.call("greet/one", "World").await.unwrap();
    assert_eq!(result, json!("Hello World"));
}

#[tokio::test]
async fn several_success_ports_resolve_to_a_mapping() {
    let result = bridge()
        .call("math/divmod", CallArgs::named([("a", 7), ("b", 2)]))
        .await
        .unwrap();
    assert_eq!(result, json!({"quotient": 3, "remainder": 1}));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Failures
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn error_port_resolves_as_invocation_error() {
    for name in ["fail/sync", "fail/promise"] {
        let err = bridge().call(name, "Error").await.unwrap_err();
        assert_eq!(err.as_invocation().unwrap().message, "Hello Error");
        assert_eq!(err.to_string(), "Hello Error");
    }
}

#[tokio::test]
async fn callback_rejection_resolves_as_error() {
    let err = bridge()
        .call("math/divmod", CallArgs::named([("a", 1), ("b", 0)]))
        .await
        .unwrap_err();
    assert_eq!(err.as_invocation().unwrap().message, "division by zero");
}

#[tokio::test]
async fn unknown_component_fails_to_load() {
    let err = bridge().call("nope/missing", "x").await.unwrap_err();
    assert!(matches!(err, BridgeError::Load(LoadError::NotFound(_))));
}

#[tokio::test]
async fn ambiguous_positional_argument_is_rejected() {
    let err = bridge().call("greet/two", "Hei").await.unwrap_err();
    assert!(matches!(err, BridgeError::ArgumentMismatch(_)));
}

#[tokio::test]
async fn missing_required_input_times_out() {
    let bridge = bridge().with_config(BridgeConfig::default().with_timeout(DurationMs::from_millis(50)));
    let err = bridge
        .call("greet/two", json!({"greeting": "Hei"}))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::TimedOut(_)));
}

#[tokio::test]
async fn missing_required_input_waits_without_timeout() {
    let pending = tokio::time::timeout(
        Duration::from_millis(100),
        bridge().call("greet/two", json!({"greeting": "Hei"})),
    )
    .await;
    assert!(pending.is_err());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Completions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn invoke_calls_completion_once() {
    let (tx, rx) = oneshot::channel();
    bridge().invoke("greet/one", "World", move |result| {
        let _ = tx.send(result);
    });
    let result = tokio::time::timeout(Duration::from_secs(2), rx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.unwrap(), json!("Hello World"));
}

#[tokio::test]
async fn as_callback_is_reusable() {
    let greet = bridge().as_callback("greet/one");
    let mut results = Vec::new();
    for name in ["Foo", "Bar"] {
        let (tx, rx) = oneshot::channel();
        greet(
            CallArgs::from(name),
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );
        results.push(rx.await.unwrap().unwrap());
    }
    assert_eq!(results, vec![json!("Hello Foo"), json!("Hello Bar")]);
}

#[tokio::test]
async fn each_call_gets_a_fresh_instance() {
    let loader = loader();
    let a = loader.load(&"greet/two".into()).await.unwrap();
    let b = loader.load(&"greet/two".into()).await.unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}
