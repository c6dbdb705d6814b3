//! Session error types.
//!
//! Synchronous requests report failures through [`SessionError`]. Outcomes
//! that arrive later (decode failures, timeouts, persistence failures) are
//! never errors; they are delivered as [`SessionEvent`](crate::SessionEvent)s.

use crate::link::ConnectionState;
use magswipe_hardware::HardwareError;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors returned by session requests.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No driver handle is open.
    #[error("Reader must be activated before starting swipe.")]
    ReaderInactive,

    /// Driver handle is open but the reader has not connected.
    #[error("Reader has been activated but is not connected.")]
    NotConnected,

    /// Auto-config owns the reader.
    #[error("Auto Config is already running.")]
    AutoConfigRunning,

    /// Reader kind hint is not one of the supported kinds.
    #[error("Reader type '{0}' invalid.")]
    InvalidReaderKind(String),

    /// The standard configuration file could not be located.
    #[error("Configuration file is unavailable.")]
    ConfigFileUnavailable,

    /// Driver refused to open.
    #[error("Failed to open reader: {0}")]
    DriverOpen(#[source] HardwareError),

    /// Driver refused to arm a swipe.
    #[error("Failed to start swipe.")]
    SwipeStartFailed,

    /// Driver refused to start auto-config.
    #[error("Failed to start Auto Config.")]
    AutoConfigStartFailed,

    /// Plug detection could not be registered.
    #[error("Failed to activate reader - {0}")]
    Subscription(#[source] HardwareError),

    /// Link state change not allowed from the current state.
    #[error("Invalid link transition from {from} to {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// Session was assembled incorrectly.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Session actor is no longer running.
    #[error("Session is closed")]
    SessionClosed,
}

impl SessionError {
    /// Whether the request was rejected without touching any state.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ReaderInactive
                | Self::NotConnected
                | Self::AutoConfigRunning
                | Self::InvalidReaderKind(_)
        )
    }
}

impl From<magswipe_core::Error> for SessionError {
    fn from(error: magswipe_core::Error) -> Self {
        match error {
            magswipe_core::Error::InvalidReaderKind(kind) => Self::InvalidReaderKind(kind),
        }
    }
}
