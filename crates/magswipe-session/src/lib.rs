//! Reader session for audio-jack magnetic-stripe readers.
//!
//! This crate ties the driver, plug detection, track decoding and profile
//! persistence together:
//!
//! - [`DeviceSession`]: the connection, swipe and auto-config state machine
//! - [`SessionActor`] / [`SessionHandle`]: run a session on its own task and
//!   talk to it from anywhere
//! - [`SessionEvent`] / [`EventSink`]: everything reported to the application
//! - [`LinkStateMachine`]: reader link phases with a transition history
//!
//! # Example
//!
//! ```no_run
//! use magswipe_hardware::mock::{MockDriverFactory, MockPlugDetector};
//! use magswipe_hardware::{notification_channel, plug_channel, DirectoryConfigFile};
//! use magswipe_session::{event_channel, DeviceSession, SessionActor, SessionConfig};
//! use magswipe_storage::MemoryProfileStore;
//!
//! # async fn example() -> magswipe_session::Result<()> {
//! let (driver_tx, driver_rx) = notification_channel();
//! let (plug_tx, plug_rx) = plug_channel();
//! let (factory, _driver) = MockDriverFactory::new(driver_tx);
//! let (detector, _jack) = MockPlugDetector::new(plug_tx);
//! let (sink, mut events) = event_channel();
//! let config = SessionConfig::default();
//!
//! let session = DeviceSession::builder(factory, MemoryProfileStore::new())
//!     .plug_detector(detector)
//!     .event_sink(sink)
//!     .config_files(DirectoryConfigFile::new("/data/magswipe"))
//!     .config(config.clone())
//!     .build()
//!     .await?;
//!
//! let (handle, _task) =
//!     SessionActor::spawn(session, driver_rx, plug_rx, config.command_capacity);
//! handle.activate().await?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{}: {:?}", event.name(), event.payload());
//! }
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod error;
pub mod event;
pub mod link;
pub mod session;

pub use actor::{SessionActor, SessionCommand, SessionHandle};
pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use event::{ChannelEventSink, EventSink, SessionEvent, event_channel};
pub use link::{ConnectionState, LinkStateMachine, LinkTransition};
pub use session::{Activation, DeviceSession, DeviceSessionBuilder, LoggingStatus, SessionStatus};
