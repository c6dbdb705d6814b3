//! Persistence of the auto-config profile.
//!
//! Readers on unsupported phones only work with the signal parameters the
//! driver discovered during auto-config. This crate keeps that profile
//! across restarts.
//!
//! - [`Database`] - SQLite connection pool with embedded migrations
//! - [`ProfileStore`] - Load/save contract used by the session
//! - [`SqliteProfileStore`] - Key/value rows in `profile_parameters`
//! - [`MemoryProfileStore`] - Shared in-memory store for tests
//!
//! # Example
//!
//! ```no_run
//! use magswipe_core::ConfigProfile;
//! use magswipe_storage::{Database, DatabaseConfig, ProfileStore, SqliteProfileStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(DatabaseConfig::new("magswipe.db")).await?;
//! let store = SqliteProfileStore::new(db.pool().clone());
//!
//! if store.load().await?.is_none() {
//!     println!("No profile yet, the configuration file will be used");
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod profile;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use profile::{MemoryProfileStore, ProfileStore, SqliteProfileStore};
