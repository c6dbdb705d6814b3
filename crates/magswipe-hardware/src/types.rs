//! Messages exchanged between the reader driver, the plug detector and the
//! session.
//!
//! The vendor driver reports everything asynchronously. Instead of a
//! callback interface, every report is a [`DriverNotification`] value sent
//! through a single channel, tagged with the generation of the driver handle
//! that produced it.

use magswipe_core::{ConfigProfile, ReaderKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

/// How a driver handle locates its signal parameters when opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectMode {
    /// Use the vendor configuration file at this path.
    ConfigFile(PathBuf),

    /// Use a profile discovered by auto-config, bypassing the file lookup.
    Profile(ConfigProfile),
}

/// Settings for opening a new driver handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    /// Generation stamped on every notification of the new handle.
    pub generation: u64,

    /// Optional hardware family hint.
    pub reader_kind: Option<ReaderKind>,

    /// Enable vendor SDK logging.
    pub verbose_logging: bool,

    /// Seconds the driver waits for a card once a swipe is armed.
    pub swipe_timeout_secs: u16,

    /// Where the driver gets its signal parameters.
    pub connect: ConnectMode,
}

/// Kind of permission the driver asks for before acting on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    /// Power up the reader after it was plugged in.
    PowerUp,

    /// Download the latest configuration file.
    UpdateConfig,

    /// Download the configuration file and overwrite the local copy.
    OverwriteConfig,

    /// Report an unsupported phone to the vendor.
    ReportToVendor,

    /// Any query the driver may add in later versions.
    Other(i32),
}

impl GrantKind {
    /// Whether this is one of the known query kinds.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Permission query from the driver, answered through a one-shot reply.
#[derive(Debug)]
pub struct GrantRequest {
    /// What the driver wants to do.
    pub kind: GrantKind,

    /// Driver-provided description.
    pub message: String,

    reply: oneshot::Sender<bool>,
}

impl GrantRequest {
    /// Create a query and the receiver on which the driver awaits the answer.
    pub fn new(kind: GrantKind, message: impl Into<String>) -> (Self, oneshot::Receiver<bool>) {
        let (reply, rx) = oneshot::channel();
        (
            Self {
                kind,
                message: message.into(),
                reply,
            },
            rx,
        )
    }

    /// Answer the query. A driver that stopped waiting is ignored.
    pub fn respond(self, granted: bool) {
        let _ = self.reply.send(granted);
    }
}

/// Asynchronous report from the reader driver.
#[derive(Debug)]
#[non_exhaustive]
pub enum DriverNotification {
    /// Driver started powering up the reader; may end in a timeout.
    Connecting,

    /// Reader is powered and ready.
    Connected,

    /// Reader link went down.
    Disconnected,

    /// A powerup, swipe or auto-config wait expired.
    Timeout { message: String },

    /// Signal detected after a swipe was armed.
    ProcessingCardData,

    /// Raw track characters from a swipe.
    CardData { format: u8, payload: Vec<u8> },

    /// Driver could not load, fetch or apply its configuration.
    FailureInfo { code: i32, message: String },

    /// Auto-config progress in percent.
    AutoConfigProgress { percent: u8 },

    /// Auto-config finished with a discovered profile.
    AutoConfigCompleted(ConfigProfile),

    /// Driver asks for permission to act.
    Grant(GrantRequest),
}

impl DriverNotification {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Timeout { .. } => "timeout",
            Self::ProcessingCardData => "processing_card_data",
            Self::CardData { .. } => "card_data",
            Self::FailureInfo { .. } => "failure_info",
            Self::AutoConfigProgress { .. } => "autoconfig_progress",
            Self::AutoConfigCompleted(_) => "autoconfig_completed",
            Self::Grant(_) => "grant",
        }
    }
}

/// Notification tagged with the generation of the handle that sent it.
#[derive(Debug)]
pub struct DriverEnvelope {
    pub generation: u64,
    pub notification: DriverNotification,
}

/// Sending half of the driver notification channel.
pub type NotificationSender = mpsc::UnboundedSender<DriverEnvelope>;

/// Receiving half of the driver notification channel.
pub type NotificationReceiver = mpsc::UnboundedReceiver<DriverEnvelope>;

/// Create the channel that carries driver notifications to the session.
///
/// The channel is unbounded: vendor callbacks run on driver threads that
/// cannot await capacity.
pub fn notification_channel() -> (NotificationSender, NotificationReceiver) {
    mpsc::unbounded_channel()
}

/// Per-handle notifier that stamps its generation on every notification.
#[derive(Debug, Clone)]
pub struct DriverNotifier {
    generation: u64,
    tx: NotificationSender,
}

impl DriverNotifier {
    /// Create a notifier for the handle of the given generation.
    pub fn new(tx: NotificationSender, generation: u64) -> Self {
        Self { generation, tx }
    }

    /// Generation of the handle this notifier belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Send a notification. Returns `false` if the session is gone.
    pub fn notify(&self, notification: DriverNotification) -> bool {
        self.tx
            .send(DriverEnvelope {
                generation: self.generation,
                notification,
            })
            .is_ok()
    }
}

/// Jack plug state change reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlugEvent {
    /// Something was plugged into the headset jack.
    PluggedIn,

    /// The headset jack was emptied.
    Unplugged,
}

/// Sending half of the plug event channel.
pub type PlugEventSender = mpsc::UnboundedSender<PlugEvent>;

/// Receiving half of the plug event channel.
pub type PlugEventReceiver = mpsc::UnboundedReceiver<PlugEvent>;

/// Create the channel that carries plug events to the session.
pub fn plug_channel() -> (PlugEventSender, PlugEventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_kind_recognition() {
        assert!(GrantKind::PowerUp.is_recognized());
        assert!(GrantKind::UpdateConfig.is_recognized());
        assert!(GrantKind::OverwriteConfig.is_recognized());
        assert!(GrantKind::ReportToVendor.is_recognized());
        assert!(!GrantKind::Other(42).is_recognized());
    }

    #[tokio::test]
    async fn test_grant_request_reply() {
        let (request, rx) = GrantRequest::new(GrantKind::PowerUp, "power up?");
        assert_eq!(request.message, "power up?");

        request.respond(true);
        assert!(rx.await.unwrap());
    }

    #[test]
    fn test_grant_request_respond_after_driver_gave_up() {
        let (request, rx) = GrantRequest::new(GrantKind::UpdateConfig, "");
        drop(rx);
        request.respond(false);
    }

    #[tokio::test]
    async fn test_notifier_stamps_generation() {
        let (tx, mut rx) = notification_channel();
        let notifier = DriverNotifier::new(tx, 7);

        assert!(notifier.notify(DriverNotification::Connected));

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.generation, 7);
        assert!(matches!(envelope.notification, DriverNotification::Connected));
    }

    #[test]
    fn test_notifier_reports_closed_session() {
        let (tx, rx) = notification_channel();
        drop(rx);

        let notifier = DriverNotifier::new(tx, 1);
        assert!(!notifier.notify(DriverNotification::Connecting));
    }

    #[test]
    fn test_notification_kind_names() {
        assert_eq!(DriverNotification::Connecting.kind(), "connecting");
        assert_eq!(
            DriverNotification::CardData {
                format: 0,
                payload: vec![]
            }
            .kind(),
            "card_data"
        );
        assert_eq!(
            DriverNotification::AutoConfigCompleted(ConfigProfile::default()).kind(),
            "autoconfig_completed"
        );
    }

    #[tokio::test]
    async fn test_plug_channel_delivers_in_order() {
        let (tx, mut rx) = plug_channel();
        tx.send(PlugEvent::PluggedIn).unwrap();
        tx.send(PlugEvent::Unplugged).unwrap();

        assert_eq!(rx.recv().await, Some(PlugEvent::PluggedIn));
        assert_eq!(rx.recv().await, Some(PlugEvent::Unplugged));
    }
}
