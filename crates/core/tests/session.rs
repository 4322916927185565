mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use wsio_core::{SessionConfig, SessionError, TransportEvent};
use wsio_wire::WireMessage;

use support::{expect_text, inbound_session, outbound_session};

fn short_config() -> SessionConfig {
    SessionConfig {
        ping_interval_ms: 25_000,
        ping_timeout_ms: 60_000,
        connect_timeout_ms: 10_000,
        job_timeout_ms: 600_000,
        liveness_tick_ms: 5_000,
    }
}

#[tokio::test]
async fn handshake_sends_open_then_connect() {
    let (_socket, mut sent_rx, events_tx) = inbound_session(short_config());
    events_tx.send(TransportEvent::Open).unwrap();

    let open = expect_text(&mut sent_rx).await;
    assert_eq!(
        open,
        r#"0{"sid":"00000000000000000000","upgrades":[],"pingInterval":25000,"pingTimeout":60000}"#
    );

    let connect = expect_text(&mut sent_rx).await;
    assert_eq!(connect, "40");
}

#[tokio::test]
async fn fire_sends_one_event_frame_with_no_correlation_id() {
    let (socket, mut sent_rx, events_tx) = inbound_session(short_config());
    events_tx.send(TransportEvent::Open).unwrap();
    expect_text(&mut sent_rx).await; // OPEN
    expect_text(&mut sent_rx).await; // CONNECT

    socket
        .fire("hello", vec![json!(1), json!("two")])
        .await
        .unwrap();

    let sent = expect_text(&mut sent_rx).await;
    assert_eq!(sent, r#"42["hello",1,"two"]"#);
}

#[tokio::test]
async fn frames_fired_before_open_are_buffered_and_flushed_in_order() {
    let (socket, mut sent_rx, events_tx) = inbound_session(short_config());

    // fire() while unconnected should not block: the reply resolves as soon as the frame
    // is queued, not once it reaches the wire.
    socket.fire("first", vec![]).await.unwrap();
    socket.fire("second", vec![]).await.unwrap();

    events_tx.send(TransportEvent::Open).unwrap();

    assert_eq!(
        expect_text(&mut sent_rx).await,
        r#"0{"sid":"00000000000000000000","upgrades":[],"pingInterval":25000,"pingTimeout":60000}"#
    );
    assert_eq!(expect_text(&mut sent_rx).await, "40");
    assert_eq!(expect_text(&mut sent_rx).await, r#"42["first"]"#);
    assert_eq!(expect_text(&mut sent_rx).await, r#"42["second"]"#);
}

#[tokio::test]
async fn call_resolves_when_the_matching_ack_arrives() {
    let (socket, mut sent_rx, events_tx) = inbound_session(short_config());
    events_tx.send(TransportEvent::Open).unwrap();
    expect_text(&mut sent_rx).await; // OPEN
    expect_text(&mut sent_rx).await; // CONNECT

    let call = tokio::spawn({
        let socket = socket.clone();
        async move { socket.call("add", vec![json!(1), json!(2)]).await }
    });

    let outgoing = expect_text(&mut sent_rx).await;
    assert_eq!(outgoing, r#"420["add",1,2]"#);

    events_tx
        .send(TransportEvent::Message(WireMessage::Text(
            "430[null,3]".to_string(),
        )))
        .unwrap();

    let result = call.await.unwrap().unwrap();
    assert_eq!(result, json!(3));
}

#[tokio::test]
async fn call_rejects_with_the_remote_error_shape() {
    let (socket, mut sent_rx, events_tx) = inbound_session(short_config());
    events_tx.send(TransportEvent::Open).unwrap();
    expect_text(&mut sent_rx).await;
    expect_text(&mut sent_rx).await;

    let call = tokio::spawn({
        let socket = socket.clone();
        async move { socket.call("boom", vec![]).await }
    });

    expect_text(&mut sent_rx).await;

    events_tx
        .send(TransportEvent::Message(WireMessage::Text(
            r#"430[{"message":"bad","code":42,"type":"X"}]"#.to_string(),
        )))
        .unwrap();

    let error = call.await.unwrap().unwrap_err();
    match error {
        SessionError::Rpc(rpc_error) => {
            assert_eq!(rpc_error.message, "bad");
            assert_eq!(rpc_error.code, Some(json!(42)));
            assert_eq!(rpc_error.r#type, Some("X".to_string()));
        }
        other => panic!("expected an Rpc error, got {other:?}"),
    }
}

#[tokio::test]
async fn incoming_call_invokes_the_matching_hook_and_acks_the_result() {
    let (socket, mut sent_rx, events_tx) = inbound_session(short_config());
    events_tx.send(TransportEvent::Open).unwrap();
    expect_text(&mut sent_rx).await;
    expect_text(&mut sent_rx).await;

    socket
        .hook(
            "add",
            Arc::new(|args: Vec<Value>| -> wsio_core::HookFuture {
                Box::pin(async move {
                    let sum = args.iter().filter_map(Value::as_i64).sum::<i64>();
                    Ok(json!(sum))
                })
            }),
        )
        .unwrap();

    events_tx
        .send(TransportEvent::Message(WireMessage::Text(
            r#"420["add",1,2]"#.to_string(),
        )))
        .unwrap();

    let ack = expect_text(&mut sent_rx).await;
    assert_eq!(ack, "30[null,3]");
}

#[tokio::test]
async fn rebinding_a_hook_is_a_programmer_error() {
    let (socket, _sent_rx, _events_tx) = inbound_session(short_config());
    let noop_hook = || -> wsio_core::HookHandler {
        Arc::new(|_: Vec<Value>| -> wsio_core::HookFuture { Box::pin(async { Ok(Value::Null) }) })
    };
    socket.hook("add", noop_hook()).unwrap();
    let err = socket.hook("add", noop_hook()).unwrap_err();
    assert!(matches!(err, SessionError::Programmer(_)));
}

#[tokio::test]
async fn blacklisted_names_are_rejected_everywhere() {
    let (socket, _sent_rx, _events_tx) = inbound_session(short_config());

    let err = socket
        .listen("error", Arc::new(|_: &[Value]| {}))
        .unwrap_err();
    assert!(matches!(err, SessionError::Programmer(_)));

    let hook: wsio_core::HookHandler =
        Arc::new(|_: Vec<Value>| -> wsio_core::HookFuture { Box::pin(async { Ok(Value::Null) }) });
    let err = socket.hook("newListener", hook).unwrap_err();
    assert!(matches!(err, SessionError::Programmer(_)));

    let err = socket.fire("close", vec![]).await.unwrap_err();
    assert!(matches!(err, SessionError::Programmer(_)));
}

#[tokio::test]
async fn binary_attachment_assembles_in_arrival_order() {
    let (_socket, mut sent_rx, events_tx) = inbound_session(short_config());
    events_tx.send(TransportEvent::Open).unwrap();
    expect_text(&mut sent_rx).await;
    expect_text(&mut sent_rx).await;

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    _socket
        .listen(
            "upload",
            Arc::new(move |args| received_clone.lock().push(args.to_vec())),
        )
        .unwrap();

    events_tx
        .send(TransportEvent::Message(WireMessage::Text(
            r#"451-["upload",{"_placeholder":true,"num":0}]"#.to_string(),
        )))
        .unwrap();
    events_tx
        .send(TransportEvent::Message(WireMessage::Binary(
            bytes::Bytes::from_static(b"\x01\x02\x03"),
        )))
        .unwrap();

    // give the actor a beat to process both messages
    tokio::time::sleep(Duration::from_millis(20)).await;

    let seen = received.lock();
    assert_eq!(seen.len(), 1);
}

#[tokio::test]
async fn text_frame_during_reassembly_is_a_protocol_error() {
    let (socket, mut sent_rx, events_tx) = inbound_session(short_config());
    events_tx.send(TransportEvent::Open).unwrap();
    expect_text(&mut sent_rx).await;
    expect_text(&mut sent_rx).await;

    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = errors.clone();
    socket.on_error(move |error| errors_clone.lock().push(error.to_string()));

    // announces one attachment, but a text frame arrives instead of the promised binary one
    events_tx
        .send(TransportEvent::Message(WireMessage::Text(
            r#"451-["upload",{"_placeholder":true,"num":0}]"#.to_string(),
        )))
        .unwrap();
    events_tx
        .send(TransportEvent::Message(WireMessage::Text(
            "not a binary attachment".to_string(),
        )))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let seen = errors.lock();
    assert!(seen.iter().any(|message| message.contains("Expected a binary attachment")));
}

#[tokio::test]
async fn idempotent_destroy_emits_close_exactly_once() {
    let (socket, _sent_rx, events_tx) = inbound_session(short_config());
    events_tx.send(TransportEvent::Open).unwrap();

    let close_count = Arc::new(AtomicUsize::new(0));
    let close_count_clone = close_count.clone();
    socket.on_close(move || {
        close_count_clone.fetch_add(1, Ordering::SeqCst);
    });

    socket.destroy();
    socket.destroy();
    socket.destroy();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(close_count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stalled_ping_challenge_emits_an_error_after_ping_timeout() {
    let mut config = short_config();
    config.ping_timeout_ms = 1_000;
    config.liveness_tick_ms = 200;

    let (socket, mut sent_rx, events_tx) = inbound_session(config);
    events_tx.send(TransportEvent::Open).unwrap();
    expect_text(&mut sent_rx).await; // OPEN
    expect_text(&mut sent_rx).await; // CONNECT

    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = errors.clone();
    socket.on_error(move |error| errors_clone.lock().push(error.to_string()));

    // first tick sends the PING challenge
    tokio::time::advance(Duration::from_millis(200)).await;
    let ping = expect_text(&mut sent_rx).await;
    assert_eq!(ping, "2");

    // advance well past the ping timeout without ever answering with a PONG
    tokio::time::advance(Duration::from_millis(1_200)).await;
    tokio::task::yield_now().await;

    let seen = errors.lock();
    assert!(seen.iter().any(|message| message.contains("stalling")));
}

#[tokio::test(start_paused = true)]
async fn stalled_outbound_session_waits_out_connect_timeout_before_reconnecting() {
    let config = SessionConfig {
        ping_interval_ms: 25_000,
        ping_timeout_ms: 300,
        connect_timeout_ms: 1_000,
        job_timeout_ms: 600_000,
        liveness_tick_ms: 100,
    };

    let (_socket, mut sent_rx, events_tx, mut connections_rx) = outbound_session(config).await;

    // complete the handshake (peer OPEN, then CONNECT) so the session becomes connected
    events_tx.send(TransportEvent::Open).unwrap();
    events_tx
        .send(TransportEvent::Message(WireMessage::Text(
            r#"0{"sid":"peer","upgrades":[],"pingInterval":25000,"pingTimeout":60000}"#.to_string(),
        )))
        .unwrap();
    events_tx
        .send(TransportEvent::Message(WireMessage::Text("40".to_string())))
        .unwrap();
    tokio::time::advance(Duration::from_millis(50)).await;
    tokio::task::yield_now().await;

    // first tick after connecting sends the PING challenge
    tokio::time::advance(Duration::from_millis(100)).await;
    let ping = expect_text(&mut sent_rx).await;
    assert_eq!(ping, "2");

    // advance well past ping_timeout without ever answering with a PONG: this stalls and
    // closes the session (fail_per_role -> close() for Role::Outbound)
    tokio::time::advance(Duration::from_millis(400)).await;
    tokio::task::yield_now().await;

    // the close must have reset `time` to now, not left it at the original connect: no
    // reconnect should happen until the full connect_timeout_ms grace period elapses
    assert!(connections_rx.try_recv().is_err());

    tokio::time::advance(Duration::from_millis(1_100)).await;
    tokio::task::yield_now().await;

    connections_rx
        .recv()
        .await
        .expect("session should reconnect through the factory once the grace period elapses");
}
