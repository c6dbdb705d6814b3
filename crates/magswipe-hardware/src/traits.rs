//! Collaborator trait definitions.
//!
//! These traits are the contract between the session and everything
//! platform-specific: the vendor reader driver, the headset jack plug
//! detector and the lookup of the vendor configuration file. Mock
//! implementations live in [`crate::mock`].
//!
//! Driver and detector calls are plain synchronous methods. The vendor SDK
//! returns from every call immediately and reports outcomes later through
//! [`DriverNotification`](crate::types::DriverNotification)s, so nothing
//! here needs to be awaited.

use crate::error::Result;
use crate::types::DriverOptions;
use std::path::{Path, PathBuf};

/// Handle to an opened vendor driver instance.
///
/// A handle is created by a [`DriverFactory`] and released with
/// [`close`](Self::close). Notifications produced by the handle carry the
/// generation given in its [`DriverOptions`].
pub trait ReaderDriver: Send {
    /// Arm a swipe. The driver waits up to `timeout_secs` for a card.
    ///
    /// Returns `false` if the driver refused to start the swipe.
    fn arm_swipe(&mut self, timeout_secs: u16) -> bool;

    /// Cancel an armed swipe. No-op if none is armed.
    fn cancel_swipe(&mut self);

    /// Whether a swipe is currently armed on the driver.
    fn is_swipe_armed(&self) -> bool;

    /// Toggle vendor SDK logging on the live handle.
    fn set_verbose_logging(&mut self, enabled: bool);

    /// Start the auto-config routine using the configuration file at
    /// `config_path`.
    ///
    /// Returns `false` if the driver refused to start.
    fn start_auto_config(&mut self, config_path: &Path, allow_overwrite: bool) -> bool;

    /// Release the handle. The handle must not be used afterwards.
    fn close(&mut self);
}

/// Creates driver handles.
///
/// # Examples
///
/// ```
/// use magswipe_hardware::mock::MockDriverFactory;
/// use magswipe_hardware::traits::{DriverFactory, ReaderDriver};
/// use magswipe_hardware::types::{notification_channel, ConnectMode, DriverOptions};
///
/// let (tx, _rx) = notification_channel();
/// let (mut factory, handle) = MockDriverFactory::new(tx);
///
/// let mut driver = factory
///     .open(DriverOptions {
///         generation: 1,
///         reader_kind: None,
///         verbose_logging: false,
///         swipe_timeout_secs: 30,
///         connect: ConnectMode::ConfigFile("IDT_uniMagCfg.xml".into()),
///     })
///     .unwrap();
///
/// assert!(driver.arm_swipe(30));
/// assert!(handle.is_swipe_armed());
/// driver.close();
/// ```
pub trait DriverFactory: Send {
    /// Driver handle type produced by this factory.
    type Driver: ReaderDriver;

    /// Open a new handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver could not be created synchronously.
    /// Configuration problems discovered later arrive as
    /// [`FailureInfo`](crate::types::DriverNotification::FailureInfo).
    fn open(&mut self, options: DriverOptions) -> Result<Self::Driver>;
}

/// Headset jack plug detection.
pub trait PlugDetector: Send {
    /// Start delivering plug events.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::AlreadySubscribed`](crate::HardwareError::AlreadySubscribed)
    /// if already subscribed, or another error if registration failed.
    fn subscribe(&mut self) -> Result<()>;

    /// Stop delivering plug events.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::NotSubscribed`](crate::HardwareError::NotSubscribed)
    /// if not subscribed.
    fn unsubscribe(&mut self) -> Result<()>;

    /// Whether something is plugged into the jack right now.
    fn is_plugged(&self) -> bool;
}

/// Locates the vendor configuration file.
pub trait ConfigFileProvider: Send {
    /// Path to a usable configuration file, or `None` if there is none.
    fn config_file_path(&self) -> Option<PathBuf>;
}
