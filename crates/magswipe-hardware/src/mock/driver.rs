//! Mock reader driver for testing and development.
//!
//! The factory opens [`MockDriver`] handles that only record what was asked
//! of them. A [`MockDriverHandle`] inspects that record and plays the part
//! of the vendor SDK by emitting notifications for the current handle.

use crate::{
    HardwareError, Result,
    traits::{DriverFactory, ReaderDriver},
    types::{
        DriverNotification, DriverNotifier, DriverOptions, GrantKind, GrantRequest,
        NotificationSender,
    },
};
use magswipe_core::ConfigProfile;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::debug;

#[derive(Debug, Default)]
struct DriverState {
    opened: Vec<DriverOptions>,
    current_generation: Option<u64>,
    live_handles: usize,
    swipe_armed: bool,
    arm_count: usize,
    cancel_count: usize,
    close_count: usize,
    verbose_logging: Option<bool>,
    auto_config_starts: Vec<(PathBuf, bool)>,
    fail_next_open: Option<String>,
    refuse_swipe: bool,
    refuse_auto_config: bool,
}

fn lock(state: &Mutex<DriverState>) -> MutexGuard<'_, DriverState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Factory for [`MockDriver`] handles.
///
/// # Examples
///
/// ```
/// use magswipe_hardware::mock::MockDriverFactory;
/// use magswipe_hardware::types::notification_channel;
///
/// let (tx, rx) = notification_channel();
/// let (factory, handle) = MockDriverFactory::new(tx);
/// assert_eq!(handle.open_count(), 0);
/// ```
#[derive(Debug)]
pub struct MockDriverFactory {
    tx: NotificationSender,
    state: Arc<Mutex<DriverState>>,
}

impl MockDriverFactory {
    /// Create a factory whose handles report through `tx`.
    ///
    /// Returns the factory and a handle for simulating driver behavior.
    pub fn new(tx: NotificationSender) -> (Self, MockDriverHandle) {
        let state = Arc::new(Mutex::new(DriverState::default()));

        let factory = Self {
            tx: tx.clone(),
            state: Arc::clone(&state),
        };
        let handle = MockDriverHandle { tx, state };

        (factory, handle)
    }
}

impl DriverFactory for MockDriverFactory {
    type Driver = MockDriver;

    fn open(&mut self, options: DriverOptions) -> Result<MockDriver> {
        let mut state = lock(&self.state);

        if let Some(reason) = state.fail_next_open.take() {
            return Err(HardwareError::open_refused(reason));
        }

        debug!("Mock driver opened (generation {})", options.generation);

        let generation = options.generation;
        state.current_generation = Some(generation);
        state.live_handles += 1;
        state.swipe_armed = false;
        state.verbose_logging = Some(options.verbose_logging);
        state.opened.push(options);

        Ok(MockDriver {
            notifier: DriverNotifier::new(self.tx.clone(), generation),
            state: Arc::clone(&self.state),
            closed: false,
        })
    }
}

/// Mock driver handle.
#[derive(Debug)]
pub struct MockDriver {
    notifier: DriverNotifier,
    state: Arc<Mutex<DriverState>>,
    closed: bool,
}

impl MockDriver {
    /// Generation this handle was opened with.
    pub fn generation(&self) -> u64 {
        self.notifier.generation()
    }

    fn is_current(&self, state: &DriverState) -> bool {
        !self.closed && state.current_generation == Some(self.generation())
    }
}

impl ReaderDriver for MockDriver {
    fn arm_swipe(&mut self, _timeout_secs: u16) -> bool {
        let mut state = lock(&self.state);
        if !self.is_current(&state) || state.refuse_swipe {
            return false;
        }
        state.arm_count += 1;
        state.swipe_armed = true;
        true
    }

    fn cancel_swipe(&mut self) {
        let mut state = lock(&self.state);
        if self.is_current(&state) {
            state.cancel_count += 1;
            state.swipe_armed = false;
        }
    }

    fn is_swipe_armed(&self) -> bool {
        let state = lock(&self.state);
        self.is_current(&state) && state.swipe_armed
    }

    fn set_verbose_logging(&mut self, enabled: bool) {
        let mut state = lock(&self.state);
        if self.is_current(&state) {
            state.verbose_logging = Some(enabled);
        }
    }

    fn start_auto_config(&mut self, config_path: &Path, allow_overwrite: bool) -> bool {
        let mut state = lock(&self.state);
        if !self.is_current(&state) || state.refuse_auto_config {
            return false;
        }
        state
            .auto_config_starts
            .push((config_path.to_path_buf(), allow_overwrite));
        true
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }

        let mut state = lock(&self.state);
        if state.current_generation == Some(self.generation()) {
            state.current_generation = None;
            state.swipe_armed = false;
        }
        state.live_handles = state.live_handles.saturating_sub(1);
        state.close_count += 1;
        self.closed = true;

        debug!("Mock driver closed (generation {})", self.generation());
    }
}

/// Handle for controlling and inspecting mock driver handles.
#[derive(Debug, Clone)]
pub struct MockDriverHandle {
    tx: NotificationSender,
    state: Arc<Mutex<DriverState>>,
}

impl MockDriverHandle {
    /// Emit a notification from the currently open handle.
    ///
    /// # Errors
    ///
    /// Returns an error if no handle is open or the session is gone.
    pub fn emit(&self, notification: DriverNotification) -> Result<()> {
        let generation = lock(&self.state)
            .current_generation
            .ok_or_else(|| HardwareError::not_open("no mock driver handle"))?;
        self.emit_for(generation, notification)
    }

    /// Emit a notification as if it came from the handle of `generation`,
    /// which may already be closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is gone.
    pub fn emit_for(&self, generation: u64, notification: DriverNotification) -> Result<()> {
        if DriverNotifier::new(self.tx.clone(), generation).notify(notification) {
            Ok(())
        } else {
            Err(HardwareError::other("notification channel closed"))
        }
    }

    /// Power up the reader: `Connecting` then `Connected`.
    ///
    /// # Errors
    ///
    /// Same as [`emit`](Self::emit).
    pub fn connect(&self) -> Result<()> {
        self.emit(DriverNotification::Connecting)?;
        self.emit(DriverNotification::Connected)
    }

    /// Simulate a swipe delivering `payload`.
    ///
    /// # Errors
    ///
    /// Same as [`emit`](Self::emit).
    pub fn swipe(&self, payload: &[u8]) -> Result<()> {
        self.emit(DriverNotification::ProcessingCardData)?;
        self.emit(DriverNotification::CardData {
            format: 0,
            payload: payload.to_vec(),
        })
    }

    /// Simulate an expired wait.
    ///
    /// # Errors
    ///
    /// Same as [`emit`](Self::emit).
    pub fn timeout(&self, message: impl Into<String>) -> Result<()> {
        self.emit(DriverNotification::Timeout {
            message: message.into(),
        })
    }

    /// Finish auto-config with `profile`.
    ///
    /// # Errors
    ///
    /// Same as [`emit`](Self::emit).
    pub fn complete_auto_config(&self, profile: ConfigProfile) -> Result<()> {
        self.emit(DriverNotification::AutoConfigCompleted(profile))
    }

    /// Ask the session for permission. The answer arrives on the receiver.
    ///
    /// # Errors
    ///
    /// Same as [`emit`](Self::emit).
    pub fn request_grant(&self, kind: GrantKind) -> Result<oneshot::Receiver<bool>> {
        let (request, rx) = GrantRequest::new(kind, format!("{:?}?", kind));
        self.emit(DriverNotification::Grant(request))?;
        Ok(rx)
    }

    /// Make the next `open` fail with `reason`.
    pub fn fail_next_open(&self, reason: impl Into<String>) {
        lock(&self.state).fail_next_open = Some(reason.into());
    }

    /// Make `arm_swipe` return `false`.
    pub fn refuse_swipe(&self, refuse: bool) {
        lock(&self.state).refuse_swipe = refuse;
    }

    /// Make `start_auto_config` return `false`.
    pub fn refuse_auto_config(&self, refuse: bool) {
        lock(&self.state).refuse_auto_config = refuse;
    }

    /// Number of handles opened so far.
    pub fn open_count(&self) -> usize {
        lock(&self.state).opened.len()
    }

    /// Options of the most recently opened handle.
    pub fn last_options(&self) -> Option<DriverOptions> {
        lock(&self.state).opened.last().cloned()
    }

    /// Generation of the open handle, if any.
    pub fn current_generation(&self) -> Option<u64> {
        lock(&self.state).current_generation
    }

    /// Number of handles opened and not yet closed.
    pub fn live_handles(&self) -> usize {
        lock(&self.state).live_handles
    }

    /// Whether the open handle has a swipe armed.
    pub fn is_swipe_armed(&self) -> bool {
        lock(&self.state).swipe_armed
    }

    /// Number of successful `arm_swipe` calls.
    pub fn arm_count(&self) -> usize {
        lock(&self.state).arm_count
    }

    /// Number of `cancel_swipe` calls on the open handle.
    pub fn cancel_count(&self) -> usize {
        lock(&self.state).cancel_count
    }

    /// Number of handles closed.
    pub fn close_count(&self) -> usize {
        lock(&self.state).close_count
    }

    /// Logging flag last applied to a handle, at open or live.
    pub fn verbose_logging(&self) -> Option<bool> {
        lock(&self.state).verbose_logging
    }

    /// Every accepted `start_auto_config` call.
    pub fn auto_config_starts(&self) -> Vec<(PathBuf, bool)> {
        lock(&self.state).auto_config_starts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConnectMode, notification_channel};

    fn options(generation: u64) -> DriverOptions {
        DriverOptions {
            generation,
            reader_kind: None,
            verbose_logging: false,
            swipe_timeout_secs: 30,
            connect: ConnectMode::ConfigFile(PathBuf::from("cfg.xml")),
        }
    }

    #[tokio::test]
    async fn test_open_and_emit() {
        let (tx, mut rx) = notification_channel();
        let (mut factory, handle) = MockDriverFactory::new(tx);

        let _driver = factory.open(options(3)).unwrap();
        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.current_generation(), Some(3));

        handle.connect().unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.generation, 3);
        assert!(matches!(first.notification, DriverNotification::Connecting));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second.notification, DriverNotification::Connected));
    }

    #[test]
    fn test_emit_without_open_driver() {
        let (tx, _rx) = notification_channel();
        let (_factory, handle) = MockDriverFactory::new(tx);

        assert!(handle.emit(DriverNotification::Connected).is_err());
    }

    #[test]
    fn test_fail_next_open() {
        let (tx, _rx) = notification_channel();
        let (mut factory, handle) = MockDriverFactory::new(tx);

        handle.fail_next_open("no reader");
        let err = factory.open(options(1)).unwrap_err();
        assert!(matches!(err, HardwareError::OpenRefused { .. }));

        assert!(factory.open(options(2)).is_ok());
        assert_eq!(handle.open_count(), 1);
    }

    #[test]
    fn test_swipe_arm_and_cancel() {
        let (tx, _rx) = notification_channel();
        let (mut factory, handle) = MockDriverFactory::new(tx);
        let mut driver = factory.open(options(1)).unwrap();

        assert!(driver.arm_swipe(30));
        assert!(driver.is_swipe_armed());
        assert_eq!(handle.arm_count(), 1);

        driver.cancel_swipe();
        assert!(!driver.is_swipe_armed());
        assert_eq!(handle.cancel_count(), 1);

        handle.refuse_swipe(true);
        assert!(!driver.arm_swipe(30));
        assert_eq!(handle.arm_count(), 1);
    }

    #[test]
    fn test_closed_handle_is_inert() {
        let (tx, _rx) = notification_channel();
        let (mut factory, handle) = MockDriverFactory::new(tx);
        let mut old = factory.open(options(1)).unwrap();
        old.close();
        old.close();
        assert_eq!(handle.close_count(), 1);
        assert_eq!(handle.live_handles(), 0);

        let _new = factory.open(options(2)).unwrap();
        assert!(!old.arm_swipe(30));
        assert!(!old.start_auto_config(Path::new("cfg.xml"), true));
        assert_eq!(handle.current_generation(), Some(2));
    }

    #[test]
    fn test_auto_config_start_recorded() {
        let (tx, _rx) = notification_channel();
        let (mut factory, handle) = MockDriverFactory::new(tx);
        let mut driver = factory.open(options(1)).unwrap();

        assert!(driver.start_auto_config(Path::new("cfg.xml"), true));
        assert_eq!(
            handle.auto_config_starts(),
            vec![(PathBuf::from("cfg.xml"), true)]
        );

        handle.refuse_auto_config(true);
        assert!(!driver.start_auto_config(Path::new("cfg.xml"), true));
        assert_eq!(handle.auto_config_starts().len(), 1);
    }

    #[tokio::test]
    async fn test_grant_round_trip() {
        let (tx, mut rx) = notification_channel();
        let (mut factory, handle) = MockDriverFactory::new(tx);
        let _driver = factory.open(options(1)).unwrap();

        let reply = handle.request_grant(GrantKind::PowerUp).unwrap();
        let envelope = rx.recv().await.unwrap();
        match envelope.notification {
            DriverNotification::Grant(request) => {
                assert_eq!(request.kind, GrantKind::PowerUp);
                request.respond(true);
            }
            other => panic!("unexpected notification: {:?}", other),
        }
        assert!(reply.await.unwrap());
    }

    #[test]
    fn test_verbose_logging_tracked() {
        let (tx, _rx) = notification_channel();
        let (mut factory, handle) = MockDriverFactory::new(tx);
        assert_eq!(handle.verbose_logging(), None);

        let mut driver = factory.open(options(1)).unwrap();
        assert_eq!(handle.verbose_logging(), Some(false));

        driver.set_verbose_logging(true);
        assert_eq!(handle.verbose_logging(), Some(true));
    }
}
