use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use wsio_core::{ChannelDelegate, Transport, TransportEvent, TransportSendError};
use wsio_wire::WireMessage;

/// A transport that forwards every outgoing send into a channel the test can drain, and
/// never fails a send.
pub struct MockTransport {
    pub sent: mpsc::UnboundedSender<WireMessage>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportSendError> {
        let _ = self.sent.send(WireMessage::Text(text));
        Ok(())
    }

    async fn send_binary(&mut self, bytes: Bytes) -> Result<(), TransportSendError> {
        let _ = self.sent.send(WireMessage::Binary(bytes));
        Ok(())
    }

    async fn close(&mut self) {}
}

/// A channel delegate with no channels; accept() requires one even when a test does not
/// exercise join/leave/channel.
pub struct NullChannels;

impl ChannelDelegate for NullChannels {
    fn join(&self, _session_id: &str, _channel: &str) {}
    fn leave(&self, _session_id: &str, _channel: &str) {}
    fn contains(&self, _session_id: &str, _channel: &str) -> bool {
        false
    }
}

/// Wires up a fresh inbound session with a mock transport, returning the socket handle,
/// a receiver for everything the session sends, and a sender used to simulate transport
/// events (peer frames, open, error, close).
pub fn inbound_session(
    config: wsio_core::SessionConfig,
) -> (
    wsio_core::Socket,
    mpsc::UnboundedReceiver<WireMessage>,
    mpsc::UnboundedSender<TransportEvent>,
) {
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let transport = Box::new(MockTransport { sent: sent_tx });
    let socket = wsio_core::Socket::accept(
        "test-session",
        true,
        config,
        transport,
        events_rx,
        Arc::new(NullChannels),
    );
    (socket, sent_rx, events_tx)
}

/// Wires up a fresh outbound session whose `TransportFactory` hands back a new mock
/// transport/event-channel pair on every call, including every reconnect attempt. The
/// first connection's channels are returned directly; later ones (from reconnects) arrive
/// over the returned `connections` receiver, in order.
pub async fn outbound_session(
    config: wsio_core::SessionConfig,
) -> (
    wsio_core::Socket,
    mpsc::UnboundedReceiver<WireMessage>,
    mpsc::UnboundedSender<TransportEvent>,
    mpsc::UnboundedReceiver<(mpsc::UnboundedReceiver<WireMessage>, mpsc::UnboundedSender<TransportEvent>)>,
) {
    let (connections_tx, mut connections_rx) = mpsc::unbounded_channel();

    let factory: wsio_core::TransportFactory = Arc::new(move || -> BoxFuture<'static, _> {
        let connections_tx = connections_tx.clone();
        Box::pin(async move {
            let (sent_tx, sent_rx) = mpsc::unbounded_channel();
            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let transport: Box<dyn Transport> = Box::new(MockTransport { sent: sent_tx });
            let _ = connections_tx.send((sent_rx, events_tx));
            Ok((transport, events_rx))
        })
    });

    let socket = wsio_core::Socket::connect("test-outbound", config, factory)
        .await
        .expect("factory should succeed on first connect");

    let (sent_rx, events_tx) = connections_rx
        .recv()
        .await
        .expect("factory should have registered the first connection");

    (socket, sent_rx, events_tx, connections_rx)
}

/// Receives the next sent message, decoded as text, panicking if none arrives or it was
/// binary.
pub async fn expect_text(sent_rx: &mut mpsc::UnboundedReceiver<WireMessage>) -> String {
    match sent_rx.recv().await.expect("session should have sent something") {
        WireMessage::Text(text) => text,
        WireMessage::Binary(_) => panic!("expected a textual message"),
    }
}
