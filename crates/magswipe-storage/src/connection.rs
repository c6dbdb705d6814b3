//! SQLite database holding the auto-config profile.
//!
//! The profile is tiny and written once per auto-config run, so the pool is
//! kept small. WAL journaling lets a reader load the profile while another
//! process saves one.

use crate::error::{StorageError, StorageResult};
use sqlx::ConnectOptions;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Where the profile database lives and how it is opened.
///
/// # Examples
///
/// ```
/// use magswipe_storage::DatabaseConfig;
/// use std::time::Duration;
///
/// let config = DatabaseConfig::new("data/magswipe.db")
///     .with_busy_timeout(Duration::from_secs(1))
///     .with_migrations(false);
///
/// assert_eq!(config.pool_size, 2);
/// assert!(!config.run_migrations);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub path: PathBuf,

    /// Pooled connections; two cover one load racing one save.
    pub pool_size: u32,

    /// Wait for a free pooled connection.
    pub acquire_timeout: Duration,

    /// Wait for a lock held by another process.
    pub busy_timeout: Duration,

    /// Create the file (not its directory) when absent.
    pub create_missing: bool,

    /// Apply embedded migrations on open.
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("magswipe.db"),
            pool_size: 2,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            create_missing: true,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn with_create_missing(mut self, create: bool) -> Self {
        self.create_missing = create;
        self
    }

    pub fn with_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }
}

/// Open profile database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (and by default create and migrate) the database file.
    ///
    /// The parent directory is created when `create_missing` is set.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Configuration`] if the directory cannot be created
    /// - [`StorageError::Database`] if SQLite refuses the file
    /// - [`StorageError::Migration`] if the schema cannot be applied
    ///
    /// # Example
    ///
    /// ```no_run
    /// use magswipe_storage::{Database, DatabaseConfig};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Database::open(DatabaseConfig::new("data/magswipe.db")).await?;
    /// db.ping().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open(config: DatabaseConfig) -> StorageResult<Self> {
        if config.create_missing {
            ensure_parent_dir(&config)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(config.create_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size.max(1))
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        info!("Opened profile database {}", config.path.display());

        let db = Self { pool };
        if config.run_migrations {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// Migrated database that disappears with the value. For tests.
    pub async fn open_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .disable_statement_logging();

        // Each connection would get its own in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the migrations embedded from `migrations/`. Already applied
    /// ones are skipped.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        debug!("Profile schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for checked-out connections and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Round trip to SQLite.
    pub async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn ensure_parent_dir(config: &DatabaseConfig) -> StorageResult<()> {
    let Some(dir) = config.path.parent() else {
        return Ok(());
    };
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| {
        StorageError::Configuration(format!("cannot create {}: {}", dir.display(), e))
    })
}
