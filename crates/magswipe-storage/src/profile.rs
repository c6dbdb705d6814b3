use crate::error::{StorageError, StorageResult};
use chrono::Utc;
use magswipe_core::ConfigProfile;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Persistent home of the auto-config profile
///
/// At most one profile is stored; saving replaces it. Both methods return
/// `Send` futures so stores can be driven from spawned tasks.
pub trait ProfileStore: Send + Sync {
    /// Replace the stored profile
    fn save(&self, profile: &ConfigProfile) -> impl Future<Output = StorageResult<()>> + Send;

    /// Read the stored profile
    ///
    /// Returns `None` when nothing usable is stored, including a store whose
    /// presence key reads back as zero.
    fn load(&self) -> impl Future<Output = StorageResult<Option<ConfigProfile>>> + Send;
}

/// SQLite implementation of [`ProfileStore`]
///
/// Each parameter is one row of `profile_parameters`, keyed by its
/// persisted name.
#[derive(Debug, Clone)]
pub struct SqliteProfileStore {
    pool: SqlitePool,
}

impl SqliteProfileStore {
    /// Create a store over an already migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Remove the stored profile
    pub async fn clear(&self) -> StorageResult<()> {
        sqlx::query("DELETE FROM profile_parameters")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl ProfileStore for SqliteProfileStore {
    async fn save(&self, profile: &ConfigProfile) -> StorageResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for (name, value) in profile.to_parameters() {
            sqlx::query(
                r#"
                INSERT INTO profile_parameters (name, value, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(name)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Saved auto-config profile");
        Ok(())
    }

    async fn load(&self) -> StorageResult<Option<ConfigProfile>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT name, value FROM profile_parameters")
                .fetch_all(&self.pool)
                .await?;

        let stored: HashMap<String, i64> = rows.into_iter().collect();
        Ok(ConfigProfile::from_parameters(|key| stored.get(key).copied()))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    parameters: HashMap<&'static str, i64>,
    fail_saves: bool,
    fail_loads: bool,
    save_count: usize,
}

/// In-memory [`ProfileStore`] for tests and ephemeral runs
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryProfileStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `profile`
    pub fn with_profile(profile: ConfigProfile) -> Self {
        let store = Self::new();
        store.lock().parameters = profile.to_parameters().into_iter().collect();
        store
    }

    /// Make `save` fail
    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    /// Make `load` fail
    pub fn fail_loads(&self, fail: bool) {
        self.lock().fail_loads = fail;
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Stored profile, read synchronously
    pub fn stored(&self) -> Option<ConfigProfile> {
        let state = self.lock();
        ConfigProfile::from_parameters(|key| state.parameters.get(key).copied())
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn save(&self, profile: &ConfigProfile) -> StorageResult<()> {
        let mut state = self.lock();
        if state.fail_saves {
            return Err(StorageError::Unavailable("profile store rejected write".into()));
        }
        state.parameters = profile.to_parameters().into_iter().collect();
        state.save_count += 1;
        Ok(())
    }

    async fn load(&self) -> StorageResult<Option<ConfigProfile>> {
        let state = self.lock();
        if state.fail_loads {
            return Err(StorageError::Unavailable("profile store rejected read".into()));
        }
        Ok(ConfigProfile::from_parameters(|key| {
            state.parameters.get(key).copied()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use magswipe_core::constants::PROFILE_PRESENCE_KEY;

    fn sample_profile() -> ConfigProfile {
        ConfigProfile {
            input_frequency: 4800,
            output_frequency: 48000,
            baud_rate: 9600,
            low_threshold: -210,
            shuttle_channel: 0xF1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_store_loads_none() {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteProfileStore::new(db.pool().clone());

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteProfileStore::new(db.pool().clone());

        store.save(&sample_profile()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(sample_profile()));
    }

    #[tokio::test]
    async fn test_save_replaces_previous_profile() {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteProfileStore::new(db.pool().clone());

        store.save(&sample_profile()).await.unwrap();
        let replacement = ConfigProfile {
            input_frequency: 2400,
            ..Default::default()
        };
        store.save(&replacement).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(replacement));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profile_parameters")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 16);
    }

    #[tokio::test]
    async fn test_zero_presence_key_reads_as_absent() {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteProfileStore::new(db.pool().clone());
        store.save(&sample_profile()).await.unwrap();

        sqlx::query("UPDATE profile_parameters SET value = 0 WHERE name = ?")
            .bind(PROFILE_PRESENCE_KEY)
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_partial_rows_default_to_zero() {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteProfileStore::new(db.pool().clone());

        sqlx::query("INSERT INTO profile_parameters (name, value, updated_at) VALUES (?, ?, ?)")
            .bind(PROFILE_PRESENCE_KEY)
            .bind(4800_i64)
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();

        let profile = store.load().await.unwrap().unwrap();
        assert_eq!(profile.input_frequency, 4800);
        assert_eq!(profile.baud_rate, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteProfileStore::new(db.pool().clone());
        store.save(&sample_profile()).await.unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryProfileStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save(&sample_profile()).await.unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.clone().load().await.unwrap(), Some(sample_profile()));
        assert_eq!(store.stored(), Some(sample_profile()));
    }

    #[tokio::test]
    async fn test_memory_store_failures() {
        let store = MemoryProfileStore::with_profile(sample_profile());

        store.fail_saves(true);
        assert!(matches!(
            store.save(&ConfigProfile::default()).await,
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(store.stored(), Some(sample_profile()));

        store.fail_loads(true);
        assert!(store.load().await.is_err());
    }
}
