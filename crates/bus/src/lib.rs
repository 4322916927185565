#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]
#![allow(missing_docs)]

//! Blacklist-enforcing, multi-listener application event bus used by wsio sessions.
//!
//! This mirrors the EventEmitter-style `events` registry a session exposes to
//! application code (`Socket::listen`/`Socket::fire` in `wsio-core`), kept here as its
//! own crate so it has no dependency on the transport or wire layers.

mod dispatcher;
mod error;

pub use dispatcher::{is_blacklisted, EventBus, Listener, BLACKLIST};
pub use error::BusError;
