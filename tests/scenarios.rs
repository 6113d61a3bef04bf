//! End-to-end scenarios through the umbrella crate.
//!
//! Every scenario registers wrapped functions with an in-memory loader and
//! drives them either through the callback bridge or through sockets:
//!
//! 1. **Sync, promise and callback functions** called by name
//! 2. **Parameterless functions** triggered by any packet
//! 3. **Pipelines** of two function components wired by a socket,
//!    with brackets preserved end to end

use rill::prelude::*;
use rill_core::SocketEvent;
use rill_core::test_utils::{InMemoryLoader, RecordingSink};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

fn register_all(loader: &InMemoryLoader) {
    loader.register(
        "ascomponent/sync-one",
        FunctionAdapter::builder()
            .param("hello")
            .sync(|args| Ok::<_, InvocationError>(format!("Hello {}", args.text(0))))
            .unwrap()
            .into_factory(),
    );
    loader.register(
        "ascomponent/sync-null",
        FunctionAdapter::builder()
            .param("hello")
            .sync(|_| Ok::<_, InvocationError>(Value::Null))
            .unwrap()
            .into_factory(),
    );
    loader.register(
        "ascomponent/sync-throw",
        FunctionAdapter::builder()
            .param("hello")
            .sync(|args| Err::<Value, _>(InvocationError::new(format!("Hello {}", args.text(0)))))
            .unwrap()
            .into_factory(),
    );
    loader.register(
        "ascomponent/sync-zero",
        FunctionAdapter::builder()
            .sync(|_| Ok::<_, InvocationError>("Hello there"))
            .unwrap()
            .into_factory(),
    );
    loader.register(
        "ascomponent/clock",
        FunctionAdapter::builder()
            .sync(|_| {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(|e| InvocationError::new(e.to_string()))?;
                Ok(now.as_millis() as u64)
            })
            .unwrap()
            .into_factory(),
    );
    loader.register(
        "ascomponent/promise-one",
        FunctionAdapter::builder()
            .param("hello")
            .promise(|args| {
                let name = args.text(0);
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok::<_, InvocationError>(format!("Hello {name}"))
                }
            })
            .unwrap()
            .into_factory(),
    );
    loader.register(
        "ascomponent/callback-one",
        FunctionAdapter::builder()
            .param("hello")
            .callback(|args, done| {
                let name = args.text(0);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    if name == "Error" {
                        done.reject(format!("Hello {name}"));
                    } else {
                        done.call(None, vec![json!(format!("Hello {name}"))]);
                    }
                });
            })
            .unwrap()
            .into_factory(),
    );
    loader.register(
        "text/shout",
        FunctionAdapter::builder()
            .param("text")
            .sync(|args| Ok::<_, InvocationError>(args.text(0).to_uppercase()))
            .unwrap()
            .into_factory(),
    );
}

fn setup() -> (Arc<InMemoryLoader>, CallbackBridge) {
    init_tracing();
    let loader = Arc::new(InMemoryLoader::new());
    register_all(&loader);
    let bridge = CallbackBridge::new(loader.clone());
    (loader, bridge)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 1. Calling functions by name
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn every_convention_resolves_through_the_bridge() {
    let (_, bridge) = setup();
    for name in [
        "ascomponent/sync-one",
        "ascomponent/promise-one",
        "ascomponent/callback-one",
    ] {
        let result = bridge.call(name, "World").await.unwrap();
        assert_eq!(result, json!("Hello World"), "{name}");
    }
}

#[tokio::test]
async fn every_failure_resolves_as_error() {
    let (_, bridge) = setup();
    for name in ["ascomponent/sync-throw", "ascomponent/callback-one"] {
        let err = bridge.call(name, "Error").await.unwrap_err();
        assert_eq!(err.to_string(), "Hello Error", "{name}");
    }
}

#[tokio::test]
async fn null_result_resolves_to_null() {
    let (_, bridge) = setup();
    assert_eq!(
        bridge.call("ascomponent/sync-null", "World").await.unwrap(),
        Value::Null
    );
}

#[tokio::test]
async fn loaded_instances_declare_their_ports() {
    let (loader, _) = setup();
    let instance = loader
        .load(&ComponentName::new("ascomponent/callback-one"))
        .await
        .unwrap();
    assert_eq!(instance.descriptor().in_port_names(), vec!["hello"]);
    assert_eq!(instance.descriptor().out_port_names(), vec!["out", "error"]);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 2. Parameterless functions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn parameterless_function_answers_any_trigger() {
    let (_, bridge) = setup();
    assert_eq!(
        bridge.call("ascomponent/sync-zero", Value::Null).await.unwrap(),
        json!("Hello there")
    );
    assert_eq!(
        bridge.call("ascomponent/sync-zero", "bang").await.unwrap(),
        json!("Hello there")
    );
    let now = bridge.call("ascomponent/clock", json!(true)).await.unwrap();
    assert!(now.is_u64());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 3. Pipelines
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn two_functions_wired_by_a_socket_keep_brackets() {
    let (loader, _) = setup();
    let greet = loader
        .load(&"ascomponent/promise-one".into())
        .await
        .unwrap();
    let shout = loader.load(&"text/shout".into()).await.unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let wire = Socket::connect(&greet, OUT_PORT, &shout, "text").unwrap();
    let seen = Arc::clone(&events);
    wire.on_event(move |event| {
        let label = match event {
            SocketEvent::Attached => "attached".to_string(),
            SocketEvent::Delivered(ip) => ip.to_string(),
            SocketEvent::Detached => "detached".to_string(),
        };
        seen.lock().unwrap().push(label);
    });

    let out = RecordingSink::new();
    out.listen(shout.as_ref(), OUT_PORT).unwrap();

    greet.post("hello", Ip::open("names")).unwrap();
    for name in ["Foo", "Bar", "Baz"] {
        greet.post("hello", Ip::data(name)).unwrap();
    }
    greet.post("hello", Ip::close("names")).unwrap();

    let received = tokio::time::timeout(Duration::from_secs(2), out.wait_for(5))
        .await
        .unwrap();
    let rendered: Vec<String> = received.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "open_bracket names",
            "data HELLO FOO",
            "data HELLO BAR",
            "data HELLO BAZ",
            "close_bracket names",
        ]
    );

    wire.detach();
    assert!(wire.is_closed());
    let events = events.lock().unwrap().clone();
    assert_eq!(events.first().map(String::as_str), Some("open_bracket names"));
    assert!(events.contains(&"data Hello Baz".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("detached"));
}

#[tokio::test]
async fn unmatched_close_never_reaches_downstream() {
    let (loader, _) = setup();
    let greet = loader.load(&"ascomponent/sync-one".into()).await.unwrap();
    let shout = loader.load(&"text/shout".into()).await.unwrap();
    let _wire = Socket::connect(&greet, OUT_PORT, &shout, "text").unwrap();
    let out = RecordingSink::new();
    out.listen(shout.as_ref(), OUT_PORT).unwrap();

    assert!(greet.post("hello", Ip::close("stray")).is_err());
    greet.post("hello", Ip::data("Foo")).unwrap();

    let received = tokio::time::timeout(Duration::from_secs(2), out.wait_for(1))
        .await
        .unwrap();
    assert_eq!(received, vec![Ip::data("HELLO FOO")]);
}
