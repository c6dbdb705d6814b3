//! Notifications reported to the application.

use magswipe_core::constants::{
    EVENT_AUTOCONFIG_COMPLETED, EVENT_AUTOCONFIG_ERROR, EVENT_CONNECTED, EVENT_CONNECTING,
    EVENT_DISCONNECTED, EVENT_SWIPE_ERROR, EVENT_SWIPE_PROCESSING, EVENT_SWIPE_SUCCESS,
    EVENT_TIMEOUT, EVENT_XML_ERROR,
};
use magswipe_protocol::CardRecord;
use tokio::sync::mpsc;

/// State change or result reported by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connecting,
    Connected,
    Disconnected,
    SwipeProcessing,
    SwipeSuccess(CardRecord),
    SwipeError,
    Timeout(String),
    AutoConfigCompleted,
    AutoConfigError(String),
    XmlError(String),
}

impl SessionEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connecting => EVENT_CONNECTING,
            Self::Connected => EVENT_CONNECTED,
            Self::Disconnected => EVENT_DISCONNECTED,
            Self::SwipeProcessing => EVENT_SWIPE_PROCESSING,
            Self::SwipeSuccess(_) => EVENT_SWIPE_SUCCESS,
            Self::SwipeError => EVENT_SWIPE_ERROR,
            Self::Timeout(_) => EVENT_TIMEOUT,
            Self::AutoConfigCompleted => EVENT_AUTOCONFIG_COMPLETED,
            Self::AutoConfigError(_) => EVENT_AUTOCONFIG_ERROR,
            Self::XmlError(_) => EVENT_XML_ERROR,
        }
    }

    /// Detail string delivered with the event, if any.
    ///
    /// `swipe_success` carries the record as JSON; message events carry
    /// their message.
    pub fn payload(&self) -> Option<String> {
        match self {
            Self::SwipeSuccess(record) => record.to_json().ok(),
            Self::Timeout(message) | Self::AutoConfigError(message) | Self::XmlError(message) => {
                Some(message.clone())
            }
            _ => None,
        }
    }
}

/// Receives session events.
///
/// Called from the session actor; implementations must not block.
pub trait EventSink: Send {
    fn emit(&mut self, event: SessionEvent);
}

/// [`EventSink`] that forwards events into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&mut self, event: SessionEvent) {
        // A dropped receiver means nobody listens anymore
        let _ = self.tx.send(event);
    }
}

/// Create a channel-backed sink and the receiver the application reads.
pub fn event_channel() -> (ChannelEventSink, mpsc::UnboundedReceiver<SessionEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelEventSink::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use magswipe_protocol::TrackParser;

    #[test]
    fn test_event_names() {
        assert_eq!(SessionEvent::Connecting.name(), "connecting");
        assert_eq!(SessionEvent::SwipeProcessing.name(), "swipe_processing");
        assert_eq!(SessionEvent::AutoConfigCompleted.name(), "autoconfig_completed");
        assert_eq!(SessionEvent::XmlError(String::new()).name(), "xml_error");
    }

    #[test]
    fn test_payloads() {
        assert_eq!(SessionEvent::Connected.payload(), None);
        assert_eq!(SessionEvent::SwipeError.payload(), None);
        assert_eq!(
            SessionEvent::Timeout("Swipe timed out".into()).payload().as_deref(),
            Some("Swipe timed out")
        );

        let record = TrackParser::parse_str("%B4111111111111111^DOE/JOHN^2505123").unwrap();
        let payload = SessionEvent::SwipeSuccess(record).payload().unwrap();
        let json: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(json["last_name"], "DOE");
        assert_eq!(json["expiry_month"], "05");
    }

    #[test]
    fn test_channel_sink() {
        let (mut sink, mut rx) = event_channel();
        sink.emit(SessionEvent::Connected);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Connected);

        drop(rx);
        sink.emit(SessionEvent::Disconnected);
    }
}
