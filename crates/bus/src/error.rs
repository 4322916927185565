use thiserror::Error;

/// Errors raised by the application event bus.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The caller tried to register or dispatch a framework-reserved event name.
    #[error("'{0}' is a reserved event name and cannot be used on the application bus")]
    Blacklisted(String),
}
