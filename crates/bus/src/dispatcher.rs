use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::trace;

use crate::error::BusError;

/// Event names reserved by the bus itself and therefore forbidden as application event
/// names, matching the EventEmitter-style blacklist referenced throughout the session
/// design (`newListener`, `removeListener`, `error`, plus the session lifecycle events
/// that are emitted through a separate channel, not this bus).
pub const BLACKLIST: &[&str] = &["newListener", "removeListener", "error", "open", "close"];

/// Returns whether `name` is reserved and therefore cannot be used as an application
/// event name.
pub fn is_blacklisted(name: &str) -> bool {
    BLACKLIST.contains(&name)
}

/// An application event listener: a callback invoked with the positional arguments of a
/// dispatched event.
pub type Listener = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Multi-listener bus for application events, dispatched synchronously and in arrival
/// order on whichever task calls [`EventBus::emit`]. This is the Rust rendering of the
/// session's EventEmitter-style `events` bus: no channels, no background task — just a
/// guarded registry, because dispatch must happen inline with frame/packet handling to
/// preserve the single-threaded cooperative ordering the session relies on.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self
            .listeners
            .read()
            .iter()
            .map(|(name, listeners)| (name.clone(), listeners.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an application event listener. Rejects blacklisted names.
    pub fn on(&self, name: &str, listener: Listener) -> Result<(), BusError> {
        if is_blacklisted(name) {
            return Err(BusError::Blacklisted(name.to_string()));
        }
        self.listeners
            .write()
            .entry(name.to_string())
            .or_default()
            .push(listener);
        Ok(())
    }

    /// Dispatches `args` to every listener registered for `name`, in registration order.
    /// Rejects blacklisted names.
    pub fn emit(&self, name: &str, args: &[Value]) -> Result<(), BusError> {
        if is_blacklisted(name) {
            return Err(BusError::Blacklisted(name.to_string()));
        }
        let listeners = self.listeners.read();
        match listeners.get(name) {
            Some(handlers) => {
                for handler in handlers {
                    handler(args);
                }
            }
            None => trace!(event = name, "no listeners registered for application event"),
        }
        Ok(())
    }

    /// Removes every registered listener. Used by session teardown.
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners
            .read()
            .get(name)
            .map(Vec::len)
            .unwrap_or_default()
    }
}
