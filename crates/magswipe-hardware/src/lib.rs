//! Reader driver and plug detection abstractions for magswipe.
//!
//! This crate describes everything the session needs from the platform:
//!
//! - [`ReaderDriver`] and [`DriverFactory`]: the vendor SDK handle that arms
//!   swipes and runs auto-config.
//! - [`PlugDetector`]: headset jack plug notifications.
//! - [`ConfigFileProvider`]: lookup of the vendor configuration file.
//!
//! The driver reports asynchronously through [`DriverNotification`]s sent on
//! a channel created with [`notification_channel`]; each notification is
//! wrapped in a [`DriverEnvelope`] carrying the generation of the handle that
//! produced it, so reports from a closed handle can be recognized.
//!
//! # Mock Collaborators
//!
//! The [`mock`] module provides scriptable stand-ins for all collaborators:
//!
//! ```
//! use magswipe_hardware::mock::{MockDriverFactory, MockPlugDetector};
//! use magswipe_hardware::{notification_channel, plug_channel};
//!
//! let (driver_tx, driver_rx) = notification_channel();
//! let (plug_tx, plug_rx) = plug_channel();
//!
//! let (factory, driver) = MockDriverFactory::new(driver_tx);
//! let (detector, jack) = MockPlugDetector::new(plug_tx);
//! ```

pub mod config_file;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use config_file::DirectoryConfigFile;
pub use error::{HardwareError, Result};
pub use traits::{ConfigFileProvider, DriverFactory, PlugDetector, ReaderDriver};
pub use types::{
    ConnectMode, DriverEnvelope, DriverNotification, DriverNotifier, DriverOptions, GrantKind,
    GrantRequest, NotificationReceiver, NotificationSender, PlugEvent, PlugEventReceiver,
    PlugEventSender, notification_channel, plug_channel,
};
