//! Device session state machine.
//!
//! [`DeviceSession`] owns the reader connection, the swipe capture and the
//! auto-config sub-protocol. It is driven by three inputs:
//!
//! - application requests ([`activate`](DeviceSession::activate),
//!   [`request_swipe`](DeviceSession::request_swipe), ...)
//! - jack plug events ([`handle_plug_event`](DeviceSession::handle_plug_event))
//! - driver notifications
//!   ([`handle_driver_notification`](DeviceSession::handle_driver_notification))
//!
//! Every input is processed to completion, including the events it emits,
//! before the next one. The session itself is not shared; the
//! [`SessionActor`](crate::SessionActor) serializes inputs from several
//! sources onto it.
//!
//! # Generations
//!
//! Each driver handle is opened with a new generation number. Notifications
//! from an older generation, or arriving after the handle was released,
//! are dropped.

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::event::{EventSink, SessionEvent};
use crate::link::{ConnectionState, LinkStateMachine, LinkTransition};
use magswipe_core::constants::{MSG_PROFILE_SAVE_FAILED, SWIPE_TIMEOUT_SECS};
use magswipe_core::{ConfigProfile, ReaderKind};
use magswipe_hardware::{
    ConfigFileProvider, ConnectMode, DriverEnvelope, DriverFactory, DriverNotification,
    DriverOptions, HardwareError, PlugDetector, PlugEvent, ReaderDriver,
};
use magswipe_protocol::TrackParser;
use magswipe_storage::ProfileStore;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info, warn};

/// Whether plug detection is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Inactive,
    Active,
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub activation: Activation,
    pub suspended: bool,
    pub connection: ConnectionState,
    pub reader_kind: Option<ReaderKind>,
    pub swipe_in_flight: bool,
    pub auto_config_in_flight: bool,
    pub verbose_logging: bool,
    pub has_profile: bool,
}

/// Outcome of a logging toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingStatus {
    /// Recorded preference.
    pub enabled: bool,

    /// Whether it reached the live driver handle; otherwise it applies on
    /// the next open.
    pub applied_now: bool,
}

impl fmt::Display for LoggingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.enabled {
            f.write_str("Logging enabled.")
        } else {
            f.write_str("Logging disabled.")
        }
    }
}

/// Connection, swipe and auto-config state machine for one reader.
pub struct DeviceSession<F: DriverFactory, S: ProfileStore> {
    factory: F,
    store: S,
    plug_detector: Box<dyn PlugDetector>,
    events: Box<dyn EventSink>,
    config_files: Box<dyn ConfigFileProvider>,

    activation: Activation,
    suspended: bool,
    link: LinkStateMachine,
    driver: Option<F::Driver>,
    generation: u64,
    disconnect_reported: bool,

    reader_kind: Option<ReaderKind>,
    swipe_in_flight: bool,
    auto_config_in_flight: bool,
    verbose_logging: bool,
    stored_profile: Option<ConfigProfile>,
}

impl<F: DriverFactory, S: ProfileStore> DeviceSession<F, S> {
    /// Start assembling a session around a driver factory and profile store.
    pub fn builder(factory: F, store: S) -> DeviceSessionBuilder<F, S> {
        DeviceSessionBuilder {
            factory,
            store,
            plug_detector: None,
            events: None,
            config_files: None,
            config: SessionConfig::default(),
        }
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    /// Subscribe to plug events and open the reader if already plugged in.
    ///
    /// Any existing driver handle is replaced, even one opened by an earlier
    /// activation or by auto-config. A failure to open the reader is reported
    /// as `xml_error`; activation still succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Subscription`] if plug detection could not be
    /// registered; the session stays inactive.
    pub fn activate(&mut self) -> Result<()> {
        self.subscribe()?;
        self.activation = Activation::Active;
        self.suspended = false;
        info!("Reader activated");

        if self.plug_detector.is_plugged() {
            self.open_reporting();
        }
        Ok(())
    }

    /// Unsubscribe from plug events and tear the reader down.
    ///
    /// Unregistration failures are ignored.
    pub fn deactivate(&mut self) {
        self.unsubscribe();
        self.close();
        if self.activation == Activation::Active {
            info!("Reader deactivated");
        }
        self.activation = Activation::Inactive;
        self.suspended = false;
    }

    /// Tear down for a host pause without forgetting the activation.
    pub fn suspend(&mut self) {
        if self.activation != Activation::Active || self.suspended {
            return;
        }
        self.unsubscribe();
        self.close();
        self.suspended = true;
        info!("Session suspended");
    }

    /// Undo [`suspend`](Self::suspend): re-subscribe and reopen if plugged.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Subscription`] if plug detection could not be
    /// registered again; the session stays suspended.
    pub fn resume(&mut self) -> Result<()> {
        if !self.suspended {
            return Ok(());
        }
        self.subscribe()?;
        self.suspended = false;
        info!("Session resumed");

        if self.plug_detector.is_plugged() {
            self.open_reporting();
        }
        Ok(())
    }

    /// Arm the driver for a swipe. The outcome arrives as an event.
    ///
    /// A swipe already armed is discarded first.
    ///
    /// # Errors
    ///
    /// - [`SessionError::ReaderInactive`] if no driver handle is open
    /// - [`SessionError::AutoConfigRunning`] while auto-config runs
    /// - [`SessionError::NotConnected`] before the reader connected
    /// - [`SessionError::SwipeStartFailed`] if the driver refused
    pub fn request_swipe(&mut self) -> Result<()> {
        let Some(driver) = self.driver.as_mut() else {
            return Err(SessionError::ReaderInactive);
        };
        if self.auto_config_in_flight {
            return Err(SessionError::AutoConfigRunning);
        }
        if !self.link.is_connected() {
            return Err(SessionError::NotConnected);
        }

        if self.swipe_in_flight || driver.is_swipe_armed() {
            debug!("Discarding previously armed swipe");
            driver.cancel_swipe();
        }
        self.swipe_in_flight = false;

        if !driver.arm_swipe(SWIPE_TIMEOUT_SECS) {
            warn!("Driver refused to arm swipe");
            return Err(SessionError::SwipeStartFailed);
        }

        self.swipe_in_flight = true;
        debug!("Swipe armed for {} seconds", SWIPE_TIMEOUT_SECS);
        Ok(())
    }

    /// Record the vendor logging preference and apply it when possible.
    pub fn set_logging(&mut self, enabled: bool) -> LoggingStatus {
        self.verbose_logging = enabled;

        let applied_now = match self.driver.as_mut() {
            Some(driver) if !self.auto_config_in_flight => {
                driver.set_verbose_logging(enabled);
                true
            }
            _ => false,
        };

        debug!(
            "Vendor logging {} ({})",
            if enabled { "enabled" } else { "disabled" },
            if applied_now { "applied" } else { "deferred" }
        );
        LoggingStatus {
            enabled,
            applied_now,
        }
    }

    /// Set the reader kind hint from its vendor name or alias.
    ///
    /// If a driver handle is open and auto-config is not running, the
    /// reader is reopened with the new hint.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidReaderKind`] for an unknown kind, with
    /// no side effects. If the reopen fails, its error is returned and the
    /// new hint is kept.
    pub fn set_reader_kind(&mut self, kind: &str) -> Result<ReaderKind> {
        let kind: ReaderKind = kind.parse()?;
        self.reader_kind = Some(kind);
        info!("Reader type set as '{}'", kind);

        if self.driver.is_some() && !self.auto_config_in_flight {
            self.open(true)?;
        }
        Ok(kind)
    }

    /// Start auto-config, opening a driver handle first if there is none.
    ///
    /// # Errors
    ///
    /// - [`SessionError::AutoConfigRunning`] if already running
    /// - [`SessionError::ConfigFileUnavailable`] without a configuration file
    /// - [`SessionError::DriverOpen`] if the driver could not be opened
    /// - [`SessionError::AutoConfigStartFailed`] if the driver refused
    pub fn request_auto_config(&mut self) -> Result<()> {
        if self.auto_config_in_flight {
            return Err(SessionError::AutoConfigRunning);
        }

        let config_path = self
            .config_files
            .config_file_path()
            .ok_or(SessionError::ConfigFileUnavailable)?;

        if self.driver.is_none() {
            self.open(false)?;
        }
        let driver = self.driver.as_mut().ok_or(SessionError::ReaderInactive)?;

        if self.swipe_in_flight || driver.is_swipe_armed() {
            driver.cancel_swipe();
        }
        self.swipe_in_flight = false;

        if !driver.start_auto_config(&config_path, true) {
            warn!("Driver refused to start auto-config");
            return Err(SessionError::AutoConfigStartFailed);
        }

        self.auto_config_in_flight = true;
        info!("Auto-config started with {}", config_path.display());
        Ok(())
    }

    /// Snapshot of the current state.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            activation: self.activation,
            suspended: self.suspended,
            connection: self.link.state(),
            reader_kind: self.reader_kind,
            swipe_in_flight: self.swipe_in_flight,
            auto_config_in_flight: self.auto_config_in_flight,
            verbose_logging: self.verbose_logging,
            has_profile: self.stored_profile.is_some(),
        }
    }

    /// Profile used when opening the reader, if any.
    pub fn stored_profile(&self) -> Option<&ConfigProfile> {
        self.stored_profile.as_ref()
    }

    /// Recorded link transitions, oldest first.
    pub fn link_history(&self) -> &VecDeque<LinkTransition> {
        self.link.history()
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// React to a jack plug change.
    ///
    /// Ignored unless active and not suspended.
    pub fn handle_plug_event(&mut self, event: PlugEvent) {
        if self.activation != Activation::Active || self.suspended {
            debug!("Ignoring plug event {:?} while not listening", event);
            return;
        }

        match event {
            PlugEvent::PluggedIn => {
                info!("Reader plugged in");
                self.open_reporting();
            }
            PlugEvent::Unplugged => {
                info!("Reader unplugged");
                self.close();
            }
        }
    }

    /// React to a driver notification.
    pub async fn handle_driver_notification(&mut self, envelope: DriverEnvelope) {
        let DriverEnvelope {
            generation,
            notification,
        } = envelope;

        if generation != self.generation || self.driver.is_none() {
            debug!(
                "Dropping {} notification from released driver (generation {})",
                notification.kind(),
                generation
            );
            return;
        }

        match notification {
            DriverNotification::Connecting => self.emit(SessionEvent::Connecting),
            DriverNotification::Connected => self.on_connected(),
            DriverNotification::Disconnected => self.on_disconnected(),
            DriverNotification::Timeout { message } => self.on_timeout(message),
            DriverNotification::ProcessingCardData => self.emit(SessionEvent::SwipeProcessing),
            DriverNotification::CardData { format, payload } => self.on_card_data(format, &payload),
            DriverNotification::FailureInfo { code, message } => {
                warn!("Driver failure {}: {}", code, message);
                self.emit(SessionEvent::XmlError(message));
            }
            DriverNotification::AutoConfigProgress { percent } => {
                debug!("Auto-config progress {}%", percent);
            }
            DriverNotification::AutoConfigCompleted(profile) => {
                self.on_auto_config_completed(profile).await;
            }
            DriverNotification::Grant(request) => {
                let granted = request.kind.is_recognized();
                debug!("Driver asked for {:?}: granted={}", request.kind, granted);
                request.respond(granted);
            }
            other => debug!("Ignoring driver notification {}", other.kind()),
        }
    }

    fn on_connected(&mut self) {
        self.set_link(ConnectionState::Connected);
        self.disconnect_reported = false;
        info!("Reader connected");
        self.emit(SessionEvent::Connected);
    }

    fn on_disconnected(&mut self) {
        self.set_link(ConnectionState::Closed);
        self.auto_config_in_flight = false;
        self.swipe_in_flight = false;

        if !self.disconnect_reported {
            self.disconnect_reported = true;
            info!("Reader disconnected");
            self.emit(SessionEvent::Disconnected);
        }
    }

    fn on_timeout(&mut self, message: String) {
        if self.auto_config_in_flight {
            self.auto_config_in_flight = false;
            warn!("Auto-config timed out: {}", message);
            self.emit(SessionEvent::AutoConfigError(message));
        } else {
            self.swipe_in_flight = false;
            debug!("Driver wait expired: {}", message);
            self.emit(SessionEvent::Timeout(message));
        }
    }

    fn on_card_data(&mut self, format: u8, payload: &[u8]) {
        if let Some(driver) = self.driver.as_mut()
            && driver.is_swipe_armed()
        {
            driver.cancel_swipe();
        }
        self.swipe_in_flight = false;

        match TrackParser::parse(payload) {
            Ok(record) => {
                info!("Swipe decoded (format {})", format);
                self.emit(SessionEvent::SwipeSuccess(record));
            }
            Err(_) => {
                info!("Swipe could not be decoded (format {})", format);
                self.emit(SessionEvent::SwipeError);
            }
        }
    }

    async fn on_auto_config_completed(&mut self, profile: ConfigProfile) {
        self.auto_config_in_flight = false;
        if !profile.is_persistable() {
            warn!("Auto-config profile has no input frequency; it will not load after a restart");
        }
        self.stored_profile = Some(profile);

        match self.store.save(&profile).await {
            Ok(()) => {
                info!("Auto-config profile saved, reopening reader");
                self.emit(SessionEvent::AutoConfigCompleted);
                self.close();
                self.open_reporting();
            }
            Err(e) => {
                warn!("Failed to save auto-config profile: {}", e);
                self.emit(SessionEvent::AutoConfigError(MSG_PROFILE_SAVE_FAILED.to_string()));
            }
        }
    }

    // ------------------------------------------------------------------
    // Driver lifecycle
    // ------------------------------------------------------------------

    /// Replace any driver handle with a new one.
    ///
    /// With `use_profile` and a stored profile the handle connects with the
    /// profile, otherwise with the standard configuration file.
    fn open(&mut self, use_profile: bool) -> Result<()> {
        self.close();

        let connect = match self.stored_profile {
            Some(profile) if use_profile => ConnectMode::Profile(profile),
            _ => ConnectMode::ConfigFile(
                self.config_files
                    .config_file_path()
                    .ok_or(SessionError::ConfigFileUnavailable)?,
            ),
        };

        self.generation += 1;
        let options = DriverOptions {
            generation: self.generation,
            reader_kind: self.reader_kind,
            verbose_logging: self.verbose_logging,
            swipe_timeout_secs: SWIPE_TIMEOUT_SECS,
            connect,
        };

        let driver = self.factory.open(options).map_err(SessionError::DriverOpen)?;
        self.driver = Some(driver);
        self.disconnect_reported = false;
        self.set_link(ConnectionState::Opening);

        info!("Reader driver opened (generation {})", self.generation);
        Ok(())
    }

    /// Open, reporting failure as `xml_error` instead of returning it.
    fn open_reporting(&mut self) {
        if let Err(e) = self.open(true) {
            warn!("Failed to open reader: {}", e);
            self.emit(SessionEvent::XmlError(e.to_string()));
        }
    }

    /// Release the driver handle, if any, and report the disconnection once.
    fn close(&mut self) {
        let Some(mut driver) = self.driver.take() else {
            return;
        };

        if self.swipe_in_flight || driver.is_swipe_armed() {
            driver.cancel_swipe();
        }
        driver.close();

        self.swipe_in_flight = false;
        self.auto_config_in_flight = false;
        self.set_link(ConnectionState::Closed);

        if !self.disconnect_reported {
            self.disconnect_reported = true;
            self.emit(SessionEvent::Disconnected);
        }
        info!("Reader driver released (generation {})", self.generation);
    }

    fn set_link(&mut self, target: ConnectionState) {
        if self.link.state() == target {
            return;
        }
        if let Err(e) = self.link.transition_to(target) {
            warn!("{}", e);
        }
    }

    fn subscribe(&mut self) -> Result<()> {
        match self.plug_detector.subscribe() {
            Ok(()) => Ok(()),
            Err(HardwareError::AlreadySubscribed) => {
                debug!("Plug detection already registered");
                Ok(())
            }
            Err(e) => Err(SessionError::Subscription(e)),
        }
    }

    fn unsubscribe(&mut self) {
        if let Err(e) = self.plug_detector.unsubscribe() {
            debug!("Ignoring plug detection unregistration failure: {}", e);
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        debug!("Event {}", event.name());
        self.events.emit(event);
    }
}

/// Builder for [`DeviceSession`].
///
/// # Examples
///
/// ```
/// use magswipe_hardware::mock::{MockDriverFactory, MockPlugDetector};
/// use magswipe_hardware::{notification_channel, plug_channel, DirectoryConfigFile};
/// use magswipe_session::{event_channel, DeviceSession, SessionConfig};
/// use magswipe_storage::MemoryProfileStore;
///
/// # #[tokio::main]
/// # async fn main() -> magswipe_session::Result<()> {
/// let (driver_tx, _driver_rx) = notification_channel();
/// let (plug_tx, _plug_rx) = plug_channel();
/// let (factory, _driver) = MockDriverFactory::new(driver_tx);
/// let (detector, _jack) = MockPlugDetector::new(plug_tx);
/// let (sink, _events) = event_channel();
///
/// let session = DeviceSession::builder(factory, MemoryProfileStore::new())
///     .plug_detector(detector)
///     .event_sink(sink)
///     .config_files(DirectoryConfigFile::new("."))
///     .config(SessionConfig::default())
///     .build()
///     .await?;
///
/// assert!(!session.status().has_profile);
/// # Ok(())
/// # }
/// ```
pub struct DeviceSessionBuilder<F: DriverFactory, S: ProfileStore> {
    factory: F,
    store: S,
    plug_detector: Option<Box<dyn PlugDetector>>,
    events: Option<Box<dyn EventSink>>,
    config_files: Option<Box<dyn ConfigFileProvider>>,
    config: SessionConfig,
}

impl<F: DriverFactory, S: ProfileStore> DeviceSessionBuilder<F, S> {
    pub fn plug_detector(mut self, detector: impl PlugDetector + 'static) -> Self {
        self.plug_detector = Some(Box::new(detector));
        self
    }

    pub fn event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.events = Some(Box::new(sink));
        self
    }

    pub fn config_files(mut self, provider: impl ConfigFileProvider + 'static) -> Self {
        self.config_files = Some(Box::new(provider));
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the stored profile and assemble the session.
    ///
    /// A profile that cannot be loaded is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] if a collaborator is missing.
    pub async fn build(self) -> Result<DeviceSession<F, S>> {
        let plug_detector = self
            .plug_detector
            .ok_or_else(|| SessionError::Configuration("plug detector not set".into()))?;
        let events = self
            .events
            .ok_or_else(|| SessionError::Configuration("event sink not set".into()))?;
        let config_files = self
            .config_files
            .ok_or_else(|| SessionError::Configuration("config file provider not set".into()))?;

        let stored_profile = match self.store.load().await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Failed to load auto-config profile: {}", e);
                None
            }
        };
        if stored_profile.is_some() {
            info!("Loaded auto-config profile");
        }

        Ok(DeviceSession {
            factory: self.factory,
            store: self.store,
            plug_detector,
            events,
            config_files,
            activation: Activation::Inactive,
            suspended: false,
            link: LinkStateMachine::new(self.config.history_size),
            driver: None,
            generation: 0,
            disconnect_reported: false,
            reader_kind: self.config.reader_kind,
            swipe_in_flight: false,
            auto_config_in_flight: false,
            verbose_logging: self.config.verbose_logging,
            stored_profile,
        })
    }
}
