//! Failures reported by the platform collaborators.

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// No driver handle is open to act on.
    #[error("No open reader: {reason}")]
    NotOpen { reason: String },

    /// Vendor driver refused to open the reader.
    #[error("Reader driver refused to open: {reason}")]
    OpenRefused { reason: String },

    /// OS refused the headset plug registration.
    #[error("Subscription failed: {reason}")]
    SubscriptionFailed { reason: String },

    #[error("Plug detector already subscribed")]
    AlreadySubscribed,

    #[error("Plug detector not subscribed")]
    NotSubscribed,

    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    pub fn not_open(reason: impl Into<String>) -> Self {
        Self::NotOpen {
            reason: reason.into(),
        }
    }

    pub fn open_refused(reason: impl Into<String>) -> Self {
        Self::OpenRefused {
            reason: reason.into(),
        }
    }

    pub fn subscription_failed(reason: impl Into<String>) -> Self {
        Self::SubscriptionFailed {
            reason: reason.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
