use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::SessionError;

type OpenListener = Arc<dyn Fn() + Send + Sync>;
type CloseListener = Arc<dyn Fn() + Send + Sync>;
type ErrorListener = Arc<dyn Fn(&SessionError) + Send + Sync>;

/// Listener registry for the three lifecycle events (`open`, `close`, `error`) a session
/// emits outside the application event bus. These names sit in the bus's blacklist
/// precisely so application code cannot register them through `listen`; this is the
/// dedicated channel they're multiplexed onto instead. Append-only and `Arc`-shared, so
/// registering a listener from the `Socket` handle never needs to cross the mailbox.
#[derive(Default)]
pub(crate) struct Lifecycle {
    open: RwLock<Vec<OpenListener>>,
    close: RwLock<Vec<CloseListener>>,
    error: RwLock<Vec<ErrorListener>>,
}

impl Lifecycle {
    pub fn on_open(&self, listener: OpenListener) {
        self.open.write().push(listener);
    }

    pub fn on_close(&self, listener: CloseListener) {
        self.close.write().push(listener);
    }

    pub fn on_error(&self, listener: ErrorListener) {
        self.error.write().push(listener);
    }

    pub fn emit_open(&self) {
        for listener in self.open.read().iter() {
            listener();
        }
    }

    pub fn emit_close(&self) {
        for listener in self.close.read().iter() {
            listener();
        }
    }

    pub fn emit_error(&self, error: &SessionError) {
        for listener in self.error.read().iter() {
            listener(error);
        }
    }

    pub fn clear(&self) {
        self.open.write().clear();
        self.close.write().clear();
        self.error.write().clear();
    }
}
