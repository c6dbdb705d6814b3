use magswipe_core::ReaderKind;
use serde::{Deserialize, Serialize};

/// Default actor mailbox size.
pub const DEFAULT_COMMAND_CAPACITY: usize = 100;

/// Default number of link transitions kept for diagnostics.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// Initial settings of a [`DeviceSession`](crate::DeviceSession).
///
/// # Examples
///
/// ```
/// use magswipe_core::ReaderKind;
/// use magswipe_session::SessionConfig;
///
/// let config = SessionConfig::default()
///     .with_verbose_logging(true)
///     .with_reader_kind(ReaderKind::UniMagII);
///
/// assert!(config.verbose_logging);
/// assert_eq!(config.command_capacity, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Vendor SDK logging at startup.
    pub verbose_logging: bool,

    /// Reader kind hint at startup.
    pub reader_kind: Option<ReaderKind>,

    /// Capacity of the actor command mailbox.
    pub command_capacity: usize,

    /// Number of link transitions kept in history.
    pub history_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verbose_logging: false,
            reader_kind: None,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl SessionConfig {
    pub fn with_verbose_logging(mut self, enabled: bool) -> Self {
        self.verbose_logging = enabled;
        self
    }

    pub fn with_reader_kind(mut self, kind: ReaderKind) -> Self {
        self.reader_kind = Some(kind);
        self
    }

    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }
}
