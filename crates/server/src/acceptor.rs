//! Inbound `/socket.io/` WebSocket acceptor: upgrades the HTTP connection, reads the
//! `transport`/`b64` query parameters, and spawns an accepted session exactly as
//! `wsio_core::Socket::accept` describes.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};
use wsio_core::{Socket, Transport, TransportEvent, TransportSendError};
use wsio_wire::WireMessage;

use crate::ServerState;

#[derive(Debug, Deserialize)]
pub struct HandshakeQuery {
    #[serde(default)]
    transport: Option<String>,
    #[serde(default)]
    b64: Option<String>,
}

/// Handles `GET /socket.io/?transport=websocket[&b64=1]`. Rejects any request that
/// doesn't ask for the websocket transport; everything else (long-polling) is out of
/// scope here.
pub async fn handshake(
    Query(query): Query<HandshakeQuery>,
    State(state): State<ServerState>,
    upgrade: WebSocketUpgrade,
) -> Response {
    if query.transport.as_deref() != Some("websocket") {
        return (
            axum::http::StatusCode::BAD_REQUEST,
            "only transport=websocket is supported",
        )
            .into_response();
    }
    let binary = query.b64.as_deref() != Some("1");

    upgrade.on_upgrade(move |socket| accept(socket, binary, state))
}

async fn accept(socket: WebSocket, binary: bool, state: ServerState) {
    let session_id: Arc<str> = uuid::Uuid::new_v4().to_string().into();
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    tokio::spawn(run(socket, outgoing_rx, events_tx));

    let transport = Box::new(AxumWsTransport { outgoing: outgoing_tx });
    let handle = Socket::accept(
        session_id.clone(),
        binary,
        state.config.session,
        transport,
        events_rx,
        state.channels.clone(),
    );

    let channels = state.channels.clone();
    let session_id_for_close = session_id.clone();
    handle.on_close(move || channels.drop_session(&session_id_for_close));

    state.sessions.insert(session_id.to_string(), handle);
    debug!(%session_id, "accepted inbound session");
}

enum Outgoing {
    Text(String),
    Binary(Bytes),
    Close,
}

struct AxumWsTransport {
    outgoing: UnboundedSender<Outgoing>,
}

#[async_trait]
impl Transport for AxumWsTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportSendError> {
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| TransportSendError("socket worker has stopped".into()))
    }

    async fn send_binary(&mut self, bytes: Bytes) -> Result<(), TransportSendError> {
        self.outgoing
            .send(Outgoing::Binary(bytes))
            .map_err(|_| TransportSendError("socket worker has stopped".into()))
    }

    async fn close(&mut self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

async fn run(socket: WebSocket, mut outgoing: UnboundedReceiver<Outgoing>, events: UnboundedSender<TransportEvent>) {
    let (mut write, mut read) = socket.split();
    let _ = events.send(TransportEvent::Open);

    loop {
        tokio::select! {
            outgoing_message = outgoing.recv() => {
                match outgoing_message {
                    Some(Outgoing::Text(text)) => {
                        if let Err(error) = write.send(Message::Text(text)).await {
                            let _ = events.send(TransportEvent::Error(error.to_string()));
                            break;
                        }
                    }
                    Some(Outgoing::Binary(bytes)) => {
                        if let Err(error) = write.send(Message::Binary(bytes.to_vec())).await {
                            let _ = events.send(TransportEvent::Error(error.to_string()));
                            break;
                        }
                    }
                    Some(Outgoing::Close) => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                    None => break,
                }
            }

            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(TransportEvent::Message(WireMessage::Text(text)));
                    }
                    Some(Ok(Message::Binary(bin))) => {
                        let _ = events.send(TransportEvent::Message(WireMessage::Binary(Bytes::from(bin))));
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (f.code, f.reason.to_string()))
                            .unwrap_or((1000, String::new()));
                        let _ = events.send(TransportEvent::Close { code, reason });
                        return;
                    }
                    Some(Err(error)) => {
                        warn!(%error, "websocket read error");
                        let _ = events.send(TransportEvent::Error(error.to_string()));
                        return;
                    }
                    None => {
                        let _ = events.send(TransportEvent::Close { code: 1006, reason: "stream ended".into() });
                        return;
                    }
                }
            }
        }
    }
}
