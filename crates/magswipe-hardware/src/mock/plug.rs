//! Mock headset jack plug detector.

use crate::{
    HardwareError, Result,
    traits::PlugDetector,
    types::{PlugEvent, PlugEventSender},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct PlugState {
    subscribed: bool,
    plugged: bool,
    fail_subscribe: bool,
    subscribe_count: usize,
}

fn lock(state: &Mutex<PlugState>) -> MutexGuard<'_, PlugState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock plug detector.
///
/// Plug events are only delivered while subscribed, like the OS broadcast
/// they stand in for.
///
/// # Examples
///
/// ```
/// use magswipe_hardware::mock::MockPlugDetector;
/// use magswipe_hardware::traits::PlugDetector;
/// use magswipe_hardware::types::{plug_channel, PlugEvent};
///
/// let (tx, mut rx) = plug_channel();
/// let (mut detector, handle) = MockPlugDetector::new(tx);
///
/// detector.subscribe().unwrap();
/// handle.plug_in();
///
/// assert!(detector.is_plugged());
/// assert_eq!(rx.try_recv().unwrap(), PlugEvent::PluggedIn);
/// ```
#[derive(Debug)]
pub struct MockPlugDetector {
    state: Arc<Mutex<PlugState>>,
}

impl MockPlugDetector {
    /// Create a detector that delivers events through `tx`.
    pub fn new(tx: PlugEventSender) -> (Self, MockPlugHandle) {
        let state = Arc::new(Mutex::new(PlugState::default()));

        let detector = Self {
            state: Arc::clone(&state),
        };
        let handle = MockPlugHandle { tx, state };

        (detector, handle)
    }
}

impl PlugDetector for MockPlugDetector {
    fn subscribe(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_subscribe {
            return Err(HardwareError::subscription_failed("mock receiver rejected"));
        }
        if state.subscribed {
            return Err(HardwareError::AlreadySubscribed);
        }
        state.subscribed = true;
        state.subscribe_count += 1;
        Ok(())
    }

    fn unsubscribe(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.subscribed {
            return Err(HardwareError::NotSubscribed);
        }
        state.subscribed = false;
        Ok(())
    }

    fn is_plugged(&self) -> bool {
        lock(&self.state).plugged
    }
}

/// Handle for simulating jack plug changes.
#[derive(Debug, Clone)]
pub struct MockPlugHandle {
    tx: PlugEventSender,
    state: Arc<Mutex<PlugState>>,
}

impl MockPlugHandle {
    /// Plug something in. Delivers `PluggedIn` if subscribed.
    pub fn plug_in(&self) {
        self.change(true, PlugEvent::PluggedIn);
    }

    /// Empty the jack. Delivers `Unplugged` if subscribed.
    pub fn unplug(&self) {
        self.change(false, PlugEvent::Unplugged);
    }

    /// Set the jack state without delivering an event.
    pub fn set_plugged(&self, plugged: bool) {
        lock(&self.state).plugged = plugged;
    }

    /// Make `subscribe` fail.
    pub fn fail_subscriptions(&self, fail: bool) {
        lock(&self.state).fail_subscribe = fail;
    }

    /// Whether the detector is subscribed.
    pub fn is_subscribed(&self) -> bool {
        lock(&self.state).subscribed
    }

    /// Number of successful subscriptions.
    pub fn subscribe_count(&self) -> usize {
        lock(&self.state).subscribe_count
    }

    fn change(&self, plugged: bool, event: PlugEvent) {
        let subscribed = {
            let mut state = lock(&self.state);
            state.plugged = plugged;
            state.subscribed
        };
        if subscribed {
            let _ = self.tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::plug_channel;

    #[test]
    fn test_events_only_while_subscribed() {
        let (tx, mut rx) = plug_channel();
        let (mut detector, handle) = MockPlugDetector::new(tx);

        handle.plug_in();
        assert!(rx.try_recv().is_err());
        assert!(detector.is_plugged());

        detector.subscribe().unwrap();
        handle.unplug();
        assert_eq!(rx.try_recv().unwrap(), PlugEvent::Unplugged);

        detector.unsubscribe().unwrap();
        handle.plug_in();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_double_subscribe() {
        let (tx, _rx) = plug_channel();
        let (mut detector, handle) = MockPlugDetector::new(tx);

        detector.subscribe().unwrap();
        assert!(matches!(
            detector.subscribe(),
            Err(HardwareError::AlreadySubscribed)
        ));
        assert_eq!(handle.subscribe_count(), 1);
    }

    #[test]
    fn test_unsubscribe_without_subscription() {
        let (tx, _rx) = plug_channel();
        let (mut detector, _handle) = MockPlugDetector::new(tx);

        assert!(matches!(
            detector.unsubscribe(),
            Err(HardwareError::NotSubscribed)
        ));
    }

    #[test]
    fn test_failed_subscription() {
        let (tx, _rx) = plug_channel();
        let (mut detector, handle) = MockPlugDetector::new(tx);

        handle.fail_subscriptions(true);
        let err = detector.subscribe().unwrap_err();
        assert!(matches!(err, HardwareError::SubscriptionFailed { .. }));
        assert!(!handle.is_subscribed());
    }

    #[test]
    fn test_set_plugged_is_silent() {
        let (tx, mut rx) = plug_channel();
        let (mut detector, handle) = MockPlugDetector::new(tx);
        detector.subscribe().unwrap();

        handle.set_plugged(true);
        assert!(detector.is_plugged());
        assert!(rx.try_recv().is_err());
    }
}
