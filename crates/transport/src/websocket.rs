//! Resilient outbound WebSocket transport for wsio sessions.
//!
//! Grounded on the teacher's market-data worker: a background task owns the socket and
//! talks to the caller only through channels, so the `Transport` handle handed back to
//! `wsio-core` is a cheap, `Send` value with no borrow on the connection itself. Dialing
//! retries with jittered exponential backoff; once established, a dropped or errored
//! socket is surfaced as a [`TransportEvent`] and left for the session's own policy to
//! decide whether to reconnect, rather than silently reattached here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use rand::{rngs::OsRng, RngCore};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{sleep, Instant};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use wsio_core::{SessionError, Transport, TransportEvent, TransportSendError};
use wsio_wire::WireMessage;

use crate::error::TransportError;

/// Reconnection backoff policy applied while dialing.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
    pub jitter: Option<Duration>,
    /// Caps how many dial attempts one `connect` call makes before giving up. `None`
    /// retries indefinitely.
    pub max_attempts: Option<u32>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(250),
            max: Duration::from_secs(30),
            multiplier: 1.8,
            jitter: Some(Duration::from_millis(120)),
            max_attempts: Some(5),
        }
    }
}

impl BackoffConfig {
    fn compute_delay(&self, attempt: u32) -> Duration {
        let exp = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let mut delay = self.initial.mul_f64(exp);
        if delay > self.max {
            delay = self.max;
        }
        if let Some(jitter) = self.jitter {
            let mut buf = [0u8; 8];
            if OsRng.try_fill_bytes(&mut buf).is_ok() {
                let noise = u64::from_le_bytes(buf) % (jitter.as_millis().max(1) as u64);
                delay = delay.saturating_add(Duration::from_millis(noise));
            }
        }
        delay
    }
}

/// Protocol-level heartbeat for peers that expect unsolicited WebSocket pings on an
/// idle socket. This sits below the session's own ping/pong (which rides inside MESSAGE
/// frames as part of the wire protocol) and is purely a transport-layer nicety.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    pub interval: Duration,
}

/// Dialing configuration for one outbound wsio session.
#[derive(Clone)]
pub struct WebSocketTransportConfig {
    pub name: Arc<str>,
    pub url: Url,
    pub backoff: BackoffConfig,
    pub heartbeat: Option<HeartbeatConfig>,
    pub read_timeout: Duration,
}

impl WebSocketTransportConfig {
    pub fn new(name: impl Into<Arc<str>>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
            backoff: BackoffConfig::default(),
            heartbeat: None,
            read_timeout: Duration::from_secs(60),
        }
    }
}

enum Outgoing {
    Text(String),
    Binary(Bytes),
    Close,
}

/// A [`Transport`] that forwards sends to a background task owning the real socket.
pub struct TungsteniteTransport {
    outgoing: UnboundedSender<Outgoing>,
}

impl std::fmt::Debug for TungsteniteTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TungsteniteTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for TungsteniteTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportSendError> {
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| TransportSendError("transport worker has stopped".into()))
    }

    async fn send_binary(&mut self, bytes: Bytes) -> Result<(), TransportSendError> {
        self.outgoing
            .send(Outgoing::Binary(bytes))
            .map_err(|_| TransportSendError("transport worker has stopped".into()))
    }

    async fn close(&mut self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

/// Dials `config.url`, retrying the handshake with jittered exponential backoff, then
/// spawns the background read/write task. Returns a [`Transport`] handle paired with
/// the event receiver, matching the shape `wsio_core::TransportFactory` expects so this
/// function can be wrapped directly as one.
pub async fn connect(
    config: WebSocketTransportConfig,
) -> Result<(Box<dyn Transport>, UnboundedReceiver<TransportEvent>), SessionError> {
    let mut attempt: u32 = 0;
    let stream = loop {
        attempt += 1;
        debug!(name = %config.name, url = %config.url, attempt, "dialing websocket");
        match connect_async(config.url.as_str()).await {
            Ok((stream, _response)) => break stream,
            Err(error) => {
                let exhausted = config.backoff.max_attempts.map(|max| attempt >= max).unwrap_or(false);
                if exhausted {
                    return Err(SessionError::Transport(
                        TransportError::Connect { url: config.url.to_string(), message: error.to_string() }
                            .to_string(),
                    ));
                }
                let delay = config.backoff.compute_delay(attempt);
                warn!(name = %config.name, %error, ?delay, "websocket dial failed, retrying");
                sleep(delay).await;
            }
        }
    };

    info!(name = %config.name, "websocket connection established");

    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    tokio::spawn(run(config, stream, outgoing_rx, events_tx));

    Ok((Box::new(TungsteniteTransport { outgoing: outgoing_tx }), events_rx))
}

async fn run(
    config: WebSocketTransportConfig,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut outgoing: UnboundedReceiver<Outgoing>,
    events: UnboundedSender<TransportEvent>,
) {
    let (mut write, mut read) = stream.split();
    let _ = events.send(TransportEvent::Open);
    let mut last_frame = Instant::now();
    let heartbeat_interval = config.heartbeat.as_ref().map(|hb| hb.interval);

    loop {
        tokio::select! {
            biased;

            _ = async {
                if let Some(interval) = heartbeat_interval {
                    sleep(interval).await;
                }
            }, if heartbeat_interval.is_some() => {
                if last_frame.elapsed() >= heartbeat_interval.unwrap() {
                    if let Err(error) = write.send(Message::Ping(Vec::new())).await {
                        warn!(name = %config.name, %error, "failed to send heartbeat ping");
                        break;
                    }
                    last_frame = Instant::now();
                }
            }

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
                        last_frame = Instant::now();
                        let _ = events.send(TransportEvent::Message(WireMessage::Text(text)));
                    }
                    Some(Ok(Message::Binary(bin))) => {
                        last_frame = Instant::now();
                        let _ = events.send(TransportEvent::Message(WireMessage::Binary(Bytes::from(bin))));
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        last_frame = Instant::now();
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.to_string()))
                            .unwrap_or((1000, String::new()));
                        let _ = events.send(TransportEvent::Close { code, reason });
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        let _ = events.send(TransportEvent::Error(error.to_string()));
                        return;
                    }
                    None => {
                        let _ = events.send(TransportEvent::Close {
                            code: 1006,
                            reason: "stream ended".into(),
                        });
                        return;
                    }
                }

                if last_frame.elapsed() > config.read_timeout {
                    let _ = events.send(TransportEvent::Close {
                        code: 1006,
                        reason: "read timeout".into(),
                    });
                    return;
                }
            }
        }
    }

    debug!(name = %config.name, "transport worker stopped");
}
