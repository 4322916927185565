use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};

use wsio_bus::{is_blacklisted, EventBus, Listener};
use wsio_wire::{
    Frame, FrameData, FrameKind, HandshakePayload, Packet, PacketKind, Parser, WireError, WireMessage,
};

use crate::channel::ChannelDelegate;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::hook::HookHandler;
use crate::job::{Job, RpcError};
use crate::lifecycle::Lifecycle;
use crate::transport::{Transport, TransportEvent};

/// Whether a session was accepted from a listening server or initiated by a client-side
/// connect. Only outbound sessions ever reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Inbound,
    Outbound,
}

/// Builds a fresh transport for an outbound session's single-reattach policy. Supplied by
/// whoever calls [`Socket::connect`] (typically `wsio-transport`), since this crate never
/// depends on a concrete transport implementation.
pub type TransportFactory = Arc<
    dyn Fn() -> BoxFuture<'static, Result<(Box<dyn Transport>, mpsc::UnboundedReceiver<TransportEvent>), SessionError>>
        + Send
        + Sync,
>;

pub(crate) enum Command {
    Fire {
        name: String,
        args: Vec<Value>,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Call {
        name: String,
        args: Vec<Value>,
        reply: oneshot::Sender<Result<Value, RpcError>>,
    },
    Destroy,
}

/// A cheap, `Clone`-able handle to a running session. Holds no lock over session state:
/// `listen`/`hook` mutate `Arc`-shared, concurrency-safe registries directly, while
/// `fire`/`call`/`destroy` are funneled through the session's mailbox so they interleave
/// correctly with frame dispatch and the liveness tick on the single task that owns them.
#[derive(Clone)]
pub struct Socket {
    commands: mpsc::UnboundedSender<Command>,
    events: Arc<EventBus>,
    hooks: Arc<DashMap<String, HookHandler>>,
    lifecycle: Arc<Lifecycle>,
    channels: Option<Arc<dyn ChannelDelegate>>,
    session_id: Arc<str>,
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket").field("session_id", &self.session_id).finish()
    }
}

impl Socket {
    /// Accepts an inbound session over an already-upgraded transport. Immediately sends
    /// the OPEN handshake and a CONNECT packet once the transport reports `Open`.
    pub fn accept(
        session_id: impl Into<Arc<str>>,
        binary: bool,
        config: SessionConfig,
        transport: Box<dyn Transport>,
        transport_events: mpsc::UnboundedReceiver<TransportEvent>,
        channels: Arc<dyn ChannelDelegate>,
    ) -> Socket {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let events = Arc::new(EventBus::new());
        let hooks = Arc::new(DashMap::new());
        let lifecycle = Arc::new(Lifecycle::default());
        let session_id: Arc<str> = session_id.into();

        let state = SessionState::new(
            Role::Inbound,
            binary,
            config,
            transport,
            None,
            events.clone(),
            hooks.clone(),
            lifecycle.clone(),
        );

        tokio::spawn(run(state, commands_rx, transport_events));

        Socket {
            commands: commands_tx,
            events,
            hooks,
            lifecycle,
            channels: Some(channels),
            session_id,
        }
    }

    /// Initiates an outbound session. Nothing is sent until the peer's OPEN/CONNECT
    /// arrive; `factory` is retained so the liveness timer's connect-timeout path can
    /// reattach with a fresh transport to the same URL.
    pub async fn connect(
        session_id: impl Into<Arc<str>>,
        config: SessionConfig,
        factory: TransportFactory,
    ) -> Result<Socket, SessionError> {
        let (transport, transport_events) = factory().await?;

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let events = Arc::new(EventBus::new());
        let hooks = Arc::new(DashMap::new());
        let lifecycle = Arc::new(Lifecycle::default());
        let session_id: Arc<str> = session_id.into();

        let state = SessionState::new(
            Role::Outbound,
            true,
            config,
            transport,
            Some(factory),
            events.clone(),
            hooks.clone(),
            lifecycle.clone(),
        );

        tokio::spawn(run(state, commands_rx, transport_events));

        Ok(Socket {
            commands: commands_tx,
            events,
            hooks,
            lifecycle,
            channels: None,
            session_id,
        })
    }

    /// Registers an application event listener. Rejects blacklisted names.
    pub fn listen(&self, name: &str, listener: Listener) -> Result<(), SessionError> {
        if is_blacklisted(name) {
            return Err(SessionError::Programmer(format!(
                "'{name}' is a reserved event name and cannot be used with listen"
            )));
        }
        self.events
            .on(name, listener)
            .map_err(|e| SessionError::Programmer(e.to_string()))
    }

    /// Sends a fire-and-forget EVENT packet.
    pub async fn fire(&self, name: impl Into<String>, args: Vec<Value>) -> Result<(), SessionError> {
        let name = name.into();
        if is_blacklisted(&name) {
            return Err(SessionError::Programmer(format!(
                "'{name}' is a reserved event name and cannot be fired"
            )));
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Fire { name, args, reply: reply_tx })
            .map_err(|_| SessionError::Programmer("session actor is no longer running".into()))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Programmer("session actor dropped the reply channel".into()))?
    }

    /// Registers exactly one RPC responder for `name`. Rebinding is a programmer error.
    pub fn hook(&self, name: impl Into<String>, handler: HookHandler) -> Result<(), SessionError> {
        let name = name.into();
        if is_blacklisted(&name) {
            return Err(SessionError::Programmer(format!(
                "'{name}' is a reserved event name and cannot be hooked"
            )));
        }
        match self.hooks.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(SessionError::Programmer(format!(
                "hook '{name}' is already bound"
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(handler);
                Ok(())
            }
        }
    }

    /// Sends a correlated EVENT packet and awaits the matching ACK.
    pub async fn call(&self, name: impl Into<String>, args: Vec<Value>) -> Result<Value, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Call { name: name.into(), args, reply: reply_tx })
            .map_err(|_| SessionError::Programmer("session actor is no longer running".into()))?;
        match reply_rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(rpc_error)) => Err(SessionError::Rpc(rpc_error)),
            Err(_) => Err(SessionError::Programmer("session actor dropped the reply channel".into())),
        }
    }

    /// Reports whether this (inbound) session belongs to `name`, via the server's channel
    /// delegate. Always `false` for outbound sessions.
    pub fn channel(&self, name: &str) -> bool {
        self.channels
            .as_ref()
            .map(|delegate| delegate.contains(&self.session_id, name))
            .unwrap_or(false)
    }

    /// Joins `name` via the server's channel delegate. A no-op for outbound sessions.
    pub fn join(&self, name: &str) {
        if let Some(delegate) = &self.channels {
            delegate.join(&self.session_id, name);
        }
    }

    /// Leaves `name` via the server's channel delegate. A no-op for outbound sessions.
    pub fn leave(&self, name: &str) {
        if let Some(delegate) = &self.channels {
            delegate.leave(&self.session_id, name);
        }
    }

    pub fn on_open(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.lifecycle.on_open(Arc::new(listener));
    }

    pub fn on_close(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.lifecycle.on_close(Arc::new(listener));
    }

    pub fn on_error(&self, listener: impl Fn(&SessionError) + Send + Sync + 'static) {
        self.lifecycle.on_error(Arc::new(listener));
    }

    /// Idempotently tears the session down: rejects all pending jobs, closes the
    /// transport, emits `close`, and removes every application listener.
    pub fn destroy(&self) {
        let _ = self.commands.send(Command::Destroy);
    }
}

struct SessionState {
    role: Role,
    config: SessionConfig,
    connected: bool,
    challenge: bool,
    destroyed: bool,
    time: Instant,
    last_ping: Option<Instant>,
    sequence: u32,
    ping_interval: u32,
    ping_timeout: u32,
    binary: bool,
    packet_in_progress: Option<(Packet, u32)>,
    buffer: VecDeque<Frame>,
    jobs: HashMap<u32, Job>,
    hooks: Arc<DashMap<String, HookHandler>>,
    events: Arc<EventBus>,
    lifecycle: Arc<Lifecycle>,
    transport: Box<dyn Transport>,
    transport_factory: Option<TransportFactory>,
    parser: Parser,
}

impl SessionState {
    #[allow(clippy::too_many_arguments)]
    fn new(
        role: Role,
        binary: bool,
        config: SessionConfig,
        transport: Box<dyn Transport>,
        transport_factory: Option<TransportFactory>,
        events: Arc<EventBus>,
        hooks: Arc<DashMap<String, HookHandler>>,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        SessionState {
            role,
            ping_interval: config.ping_interval_ms as u32,
            ping_timeout: config.ping_timeout_ms as u32,
            config,
            connected: false,
            challenge: false,
            destroyed: false,
            time: Instant::now(),
            last_ping: None,
            sequence: 0,
            binary,
            packet_in_progress: None,
            buffer: VecDeque::new(),
            jobs: HashMap::new(),
            hooks,
            events,
            lifecycle,
            transport,
            transport_factory,
            parser: Parser::new(),
        }
    }

    #[cfg(test)]
    fn set_sequence_for_test(&mut self, value: u32) {
        self.sequence = value;
    }

    fn next_sequence(&mut self) -> u32 {
        let id = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        id
    }

    fn emit_error(&self, error: SessionError) {
        if self.destroyed {
            return;
        }
        warn!(role = ?self.role, %error, "session error");
        self.lifecycle.emit_error(&error);
    }

    async fn fail_per_role(&mut self) {
        match self.role {
            Role::Inbound => self.destroy().await,
            Role::Outbound => self.close().await,
        }
    }

    async fn on_transport_open(&mut self) {
        match self.role {
            Role::Inbound => {
                debug!(role = ?self.role, "sending handshake");
                let handshake = HandshakePayload::new(self.ping_interval, self.ping_timeout);
                let json = serde_json::to_string(&handshake).expect("handshake payload always serializes");
                self.send_frame(Frame::open(json)).await;
                self.send_packet(Packet::connect()).await;
                self.mark_connected().await;
            }
            Role::Outbound => {
                // No unsolicited send: wait for the peer's OPEN, then its CONNECT.
            }
        }
    }

    async fn mark_connected(&mut self) {
        if self.connected {
            return;
        }
        self.connected = true;
        self.time = Instant::now();
        debug!(role = ?self.role, "session connected");
        let pending: Vec<Frame> = self.buffer.drain(..).collect();
        for frame in pending {
            self.transmit(frame).await;
        }
        self.lifecycle.emit_open();
    }

    async fn on_transport_message(&mut self, message: WireMessage) {
        let frame = match message {
            WireMessage::Text(text) => self.parser.feed_str(&text),
            WireMessage::Binary(bytes) => self.parser.feed_bytes(bytes),
        };
        match frame {
            Ok(frame) => self.handle_frame(frame).await,
            Err(WireError::UnknownFrameType(_)) => {
                self.emit_error(SessionError::Protocol("Unknown frame.".into()));
            }
            Err(error) => self.emit_error(SessionError::Wire(error)),
        }
    }

    async fn handle_frame(&mut self, frame: Frame) {
        match frame.kind {
            FrameKind::Open => self.handle_open_frame(frame).await,
            FrameKind::Close => {
                self.send_frame(Frame::close()).await;
                self.fail_per_role().await;
            }
            FrameKind::Ping => self.send_frame(Frame::pong()).await,
            FrameKind::Pong => {
                if !self.challenge {
                    self.emit_error(SessionError::Protocol("Unexpected PONG.".into()));
                    self.destroy().await;
                } else {
                    self.challenge = false;
                }
            }
            FrameKind::Message => self.handle_message_frame(frame).await,
            FrameKind::Upgrade => {
                self.emit_error(SessionError::Protocol("Cannot upgrade from websocket.".into()));
            }
            FrameKind::Noop => {}
        }
    }

    async fn handle_open_frame(&mut self, frame: Frame) {
        let text = match &frame.data {
            FrameData::Text(text) => text,
            FrameData::Binary(_) => {
                self.emit_error(SessionError::Protocol("OPEN frame must be textual.".into()));
                return;
            }
        };
        match serde_json::from_str::<HandshakePayload>(text) {
            Ok(payload) => {
                self.ping_interval = payload.ping_interval;
                self.ping_timeout = payload.ping_timeout;
            }
            Err(error) => {
                self.emit_error(SessionError::Protocol(format!("Malformed OPEN payload: {error}")));
            }
        }
    }

    async fn handle_message_frame(&mut self, frame: Frame) {
        if let Some((mut packet, total)) = self.packet_in_progress.take() {
            match frame.data {
                FrameData::Binary(bytes) => {
                    packet.buffers.push(bytes);
                    if packet.buffers.len() as u32 == total {
                        self.dispatch_packet(packet).await;
                    } else {
                        self.packet_in_progress = Some((packet, total));
                    }
                }
                FrameData::Text(_) => {
                    self.emit_error(SessionError::Protocol(
                        "Expected a binary attachment during packet reassembly.".into(),
                    ));
                    self.packet_in_progress = Some((packet, total));
                }
            }
            return;
        }

        let text = match frame.data {
            FrameData::Text(text) => text,
            FrameData::Binary(_) => {
                self.emit_error(SessionError::Protocol(
                    "Unexpected binary frame outside of packet reassembly.".into(),
                ));
                return;
            }
        };

        match Packet::from_str(&text) {
            Ok(packet) if packet.kind.carries_attachments() && packet.attachments > 0 => {
                let total = packet.attachments;
                self.packet_in_progress = Some((packet, total));
            }
            Ok(packet) => self.dispatch_packet(packet).await,
            Err(error) => self.emit_error(SessionError::Wire(error)),
        }
    }

    async fn dispatch_packet(&mut self, packet: Packet) {
        let id = packet.id;
        let data = packet.get_data().clone();
        match packet.kind {
            PacketKind::Connect => {
                if self.role == Role::Outbound {
                    self.mark_connected().await;
                }
            }
            PacketKind::Disconnect => {}
            PacketKind::Event | PacketKind::BinaryEvent => self.dispatch_event_packet(id, data).await,
            PacketKind::Ack | PacketKind::BinaryAck => self.dispatch_ack_packet(id, data).await,
            PacketKind::Error => {
                let rpc_error = RpcError::from_wire(&data);
                self.emit_error(SessionError::Rpc(rpc_error));
            }
        }
    }

    async fn dispatch_event_packet(&mut self, id: Option<u32>, data: Value) {
        let arr = match data.as_array() {
            Some(arr) if !arr.is_empty() => arr.clone(),
            _ => {
                self.emit_error(SessionError::Protocol(
                    "Malformed event packet: expected a non-empty array.".into(),
                ));
                return;
            }
        };
        let name = match arr[0].as_str() {
            Some(name) => name.to_string(),
            None => {
                self.emit_error(SessionError::Protocol(
                    "Malformed event packet: first element must be a string.".into(),
                ));
                return;
            }
        };
        let args = arr[1..].to_vec();

        if let Some(id) = id {
            let handler = self.hooks.get(&name).map(|entry| entry.value().clone());
            match handler {
                None => {
                    self.emit_error(SessionError::Protocol(format!("No hook registered for '{name}'.")));
                }
                Some(handler) => {
                    let outcome = handler(args).await;
                    match outcome {
                        Ok(value) => {
                            self.send_packet(Packet::ack(id, serde_json::json!([Value::Null, value])))
                                .await;
                        }
                        Err(rpc_error) => {
                            self.send_packet(Packet::ack(id, serde_json::json!([rpc_error.to_wire()])))
                                .await;
                        }
                    }
                }
            }
            return;
        }

        if is_blacklisted(&name) {
            self.emit_error(SessionError::Protocol(format!("'{name}' is a reserved event name.")));
            return;
        }

        let events = self.events.clone();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| events.emit(&name, &args)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(bus_error)) => self.emit_error(SessionError::Protocol(bus_error.to_string())),
            Err(panic_payload) => {
                let message = panic_message(&panic_payload);
                self.send_packet(Packet::error(serde_json::json!({
                    "message": message,
                    "code": Value::Null,
                    "type": Value::Null,
                })))
                .await;
            }
        }
    }

    async fn dispatch_ack_packet(&mut self, id: Option<u32>, data: Value) {
        let id = match id {
            Some(id) => id,
            None => {
                self.emit_error(SessionError::Protocol("ACK packet is missing a correlation id.".into()));
                return;
            }
        };
        let job = match self.jobs.remove(&id) {
            Some(job) => job,
            None => {
                self.emit_error(SessionError::Protocol(format!("Unknown ack id {id}.")));
                return;
            }
        };

        let arr = data.as_array();
        let err_value = arr.and_then(|a| a.first()).cloned().unwrap_or(Value::Null);
        let result_value = arr.and_then(|a| a.get(1)).cloned().unwrap_or(Value::Null);

        if !err_value.is_null() {
            if err_value.is_object() {
                let _ = job.resolve.send(Err(RpcError::from_wire(&err_value)));
            } else {
                self.emit_error(SessionError::Protocol("Malformed ACK error payload.".into()));
                let _ = job.resolve.send(Err(RpcError::new("Malformed ACK error payload.")));
            }
        } else {
            let _ = job.resolve.send(Ok(result_value));
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Fire { name, args, reply } => {
                let mut payload = vec![Value::String(name)];
                payload.extend(args);
                self.send_packet(Packet::event(Value::Array(payload))).await;
                let _ = reply.send(Ok(()));
            }
            Command::Call { name, args, reply } => {
                let id = self.next_sequence();
                if self.jobs.contains_key(&id) {
                    let _ = reply.send(Err(RpcError::new(
                        "call id collision: too many in-flight calls",
                    )));
                    return;
                }
                let (tx, rx) = oneshot::channel();
                self.jobs.insert(id, Job { resolve: tx, issued_at: Instant::now() });

                let mut payload = vec![Value::String(name)];
                payload.extend(args);
                let mut packet = Packet::event(Value::Array(payload));
                packet.id = Some(id);
                self.send_packet(packet).await;

                tokio::spawn(async move {
                    let outcome = rx
                        .await
                        .unwrap_or_else(|_| Err(RpcError::new("session was destroyed before the call completed")));
                    let _ = reply.send(outcome);
                });
            }
            Command::Destroy => self.destroy().await,
        }
    }

    async fn handle_tick(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        if self.destroyed {
            return None;
        }
        let now = Instant::now();

        if !self.connected {
            let elapsed_ms = now.saturating_duration_since(self.time).as_millis() as u64;
            if elapsed_ms > self.config.connect_timeout_ms {
                self.emit_error(SessionError::Protocol("Timed out waiting for connection.".into()));
                return match self.role {
                    Role::Inbound => {
                        self.destroy().await;
                        None
                    }
                    Role::Outbound => self.reconnect().await,
                };
            }
            return None;
        }

        let deadline = Duration::from_millis(self.config.job_timeout_ms);
        let expired: Vec<u32> = self
            .jobs
            .iter()
            .filter(|(_, job)| now.saturating_duration_since(job.issued_at) > deadline)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(job) = self.jobs.remove(&id) {
                let _ = job.resolve.send(Err(RpcError::new("Job timed out.")));
            }
        }

        if !self.challenge {
            self.challenge = true;
            self.last_ping = Some(now);
            self.send_frame(Frame::ping()).await;
        } else if let Some(last_ping) = self.last_ping {
            let elapsed_ms = now.saturating_duration_since(last_ping).as_millis() as u64;
            if elapsed_ms > self.ping_timeout as u64 {
                self.emit_error(SessionError::Protocol("Connection is stalling (ping).".into()));
                self.fail_per_role().await;
            }
        }
        None
    }

    async fn reconnect(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.close().await;
        let factory = self.transport_factory.clone()?;
        match factory().await {
            Ok((transport, events_rx)) => {
                self.transport = transport;
                self.time = Instant::now();
                Some(events_rx)
            }
            Err(error) => {
                self.emit_error(error);
                None
            }
        }
    }

    async fn close(&mut self) {
        self.packet_in_progress = None;
        self.connected = false;
        self.challenge = false;
        self.sequence = 0;
        self.last_ping = None;
        self.time = Instant::now();
        let jobs = std::mem::take(&mut self.jobs);
        for (_, job) in jobs {
            let _ = job.resolve.send(Err(RpcError::new("Job timed out.")));
        }
        self.transport.close().await;
    }

    async fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        debug!(role = ?self.role, "destroying session");
        self.destroyed = true;
        self.buffer.clear();
        self.close().await;
        self.lifecycle.emit_close();
        self.events.clear();
        self.lifecycle.clear();
    }

    async fn send_frame(&mut self, frame: Frame) {
        if !self.connected {
            self.buffer.push_back(frame);
        } else {
            self.transmit(frame).await;
        }
    }

    async fn send_packet(&mut self, packet: Packet) {
        let buffers = packet.buffers.clone();
        self.send_frame(Frame::message_text(packet.to_string_wire())).await;
        for chunk in buffers {
            self.send_frame(Frame::message_binary(chunk)).await;
        }
    }

    async fn transmit(&mut self, frame: Frame) {
        let message = render_for_wire(&frame, self.binary);
        let result = match message {
            WireMessage::Text(text) => self.transport.send_text(text).await,
            WireMessage::Binary(bytes) => self.transport.send_binary(bytes).await,
        };
        if let Err(error) = result {
            self.emit_error(SessionError::Transport(error.to_string()));
            self.fail_per_role().await;
        }
    }
}

/// Renders a frame for the wire given the peer's binary capability. Binary attachments
/// are base64-packed into a textual MESSAGE frame (`4b<base64>`, Engine.IO's own
/// polling-transport convention) when the peer signaled `b64=1` during handshake;
/// otherwise frames go out exactly as the wire codec encodes them.
fn render_for_wire(frame: &Frame, binary_capable: bool) -> WireMessage {
    match (&frame.data, binary_capable) {
        (FrameData::Binary(bytes), false) => {
            use base64::{engine::general_purpose::STANDARD, Engine as _};
            WireMessage::Text(format!("4b{}", STANDARD.encode(bytes)))
        }
        _ => frame.to_raw(),
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "event listener panicked".to_string()
    }
}

/// Maps a WebSocket close code to a human-readable name, per the external interfaces'
/// close-code table. Falls back to `UNKNOWN_CODE` for anything not listed.
pub fn close_code_name(code: u16) -> &'static str {
    match code {
        1000 => "NORMAL_CLOSURE",
        1001 => "GOING_AWAY",
        1002 => "PROTOCOL_ERROR",
        1003 => "UNSUPPORTED_DATA",
        1006 => "ABNORMAL_CLOSURE",
        1007 => "INVALID_FRAME_PAYLOAD_DATA",
        1008 => "POLICY_VIOLATION",
        1009 => "MESSAGE_TOO_BIG",
        1010 => "MANDATORY_EXTENSION",
        1011 => "INTERNAL_ERROR",
        1015 => "TLS_HANDSHAKE",
        _ => "UNKNOWN_CODE",
    }
}

async fn run(
    mut state: SessionState,
    mut commands: mpsc::UnboundedReceiver<Command>,
    transport_events: mpsc::UnboundedReceiver<TransportEvent>,
) {
    let mut events_rx = transport_events;
    let mut tick = tokio::time::interval(Duration::from_millis(state.config.liveness_tick_ms));

    loop {
        tokio::select! {
            maybe_command = commands.recv() => {
                match maybe_command {
                    Some(command) => state.handle_command(command).await,
                    None => break,
                }
            }
            maybe_event = events_rx.recv() => {
                match maybe_event {
                    Some(TransportEvent::Open) => state.on_transport_open().await,
                    Some(TransportEvent::Message(message)) => state.on_transport_message(message).await,
                    Some(TransportEvent::Error(message)) => {
                        state.emit_error(SessionError::Transport(message));
                        state.fail_per_role().await;
                    }
                    Some(TransportEvent::Close { code, reason }) => {
                        if code != 1000 && code != 1001 {
                            let name = close_code_name(code);
                            state.emit_error(SessionError::Transport(format!("{name} ({code}): {reason}")));
                        }
                        state.fail_per_role().await;
                    }
                    None => {
                        state.emit_error(SessionError::Transport(
                            "transport event channel closed unexpectedly".into(),
                        ));
                        state.fail_per_role().await;
                    }
                }
            }
            _ = tick.tick() => {
                if let Some(new_rx) = state.handle_tick().await {
                    events_rx = new_rx;
                }
            }
        }

        if state.destroyed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NoopTransport;

    #[async_trait]
    impl Transport for NoopTransport {
        async fn send_text(&mut self, _text: String) -> Result<(), crate::transport::TransportSendError> {
            Ok(())
        }

        async fn send_binary(&mut self, _bytes: bytes::Bytes) -> Result<(), crate::transport::TransportSendError> {
            Ok(())
        }

        async fn close(&mut self) {}
    }

    fn test_state() -> SessionState {
        SessionState::new(
            Role::Inbound,
            true,
            SessionConfig::default(),
            Box::new(NoopTransport),
            None,
            Arc::new(EventBus::new()),
            Arc::new(DashMap::new()),
            Arc::new(Lifecycle::default()),
        )
    }

    #[test]
    fn sequence_wraps_after_u32_max() {
        let mut state = test_state();
        state.set_sequence_for_test(u32::MAX);
        assert_eq!(state.next_sequence(), u32::MAX);
        assert_eq!(state.next_sequence(), 0);
    }
}
