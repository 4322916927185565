use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::protocol::Message;
use url::Url;
use wsio_core::{Transport, TransportEvent};
use wsio_transport::{connect, WebSocketTransportConfig};
use wsio_wire::WireMessage;

#[tokio::test]
async fn exchanges_one_text_message_over_a_real_loopback_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let message = ws.next().await.unwrap().unwrap();
        assert_eq!(message, Message::Text("hello from client".to_string()));
        ws.send(Message::Text("hello from server".to_string())).await.unwrap();
    });

    let url = Url::parse(&format!("ws://{addr}/socket.io/?transport=websocket")).unwrap();
    let config = WebSocketTransportConfig::new("loopback-test", url);
    let (mut transport, mut events) = connect(config).await.unwrap();

    match events.recv().await.unwrap() {
        TransportEvent::Open => {}
        other => panic!("expected Open, got {other:?}"),
    }

    transport.send_text("hello from client".to_string()).await.unwrap();

    let received = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for server reply")
        .expect("event channel closed early");
    match received {
        TransportEvent::Message(WireMessage::Text(text)) => {
            assert_eq!(text, "hello from server");
        }
        other => panic!("expected a text message, got {other:?}"),
    }

    server.await.unwrap();
}

#[tokio::test]
async fn connect_fails_after_exhausting_backoff_against_a_dead_port() {
    use wsio_transport::BackoffConfig;

    let url = Url::parse("ws://127.0.0.1:1/socket.io/?transport=websocket").unwrap();
    let mut config = WebSocketTransportConfig::new("dead-port-test", url);
    config.backoff = BackoffConfig {
        initial: Duration::from_millis(1),
        max: Duration::from_millis(5),
        multiplier: 1.0,
        jitter: None,
        max_attempts: Some(2),
    };

    let result = connect(config).await;
    assert!(result.is_err());
}
