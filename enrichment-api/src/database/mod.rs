pub mod contacts;
pub mod migrations;
pub mod store;

pub use contacts::SqliteContactStore;
pub use store::{
    ContactPage, ContactQuery, ContactStore, InsertOutcome, StatusGroup, StoreError,
};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Pooled SQLite access that keeps blocking calls off the async runtime
#[derive(Clone)]
pub struct AsyncDbConnection {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl AsyncDbConnection {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Run `f` on a pooled connection, giving up after `deadline`.
    ///
    /// A timed-out statement keeps running on the blocking pool; only the caller stops waiting.
    pub async fn run<T, F>(&self, deadline: Duration, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let task = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        });

        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(StoreError::Unavailable(format!("Store task failed: {e}"))),
            Err(_) => Err(StoreError::Unavailable(format!(
                "Store operation timed out after {}ms",
                deadline.as_millis()
            ))),
        }
    }
}

pub struct Database {
    pub async_connection: AsyncDbConnection,
}

impl Database {
    /// Open (or create) the database file, run migrations and build the pool
    pub fn new(db_path: &Path, pool_size: u32, busy_timeout: Duration) -> anyhow::Result<Self> {
        // Ensure directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Run migrations on a dedicated connection before the pool opens
        {
            let conn = Connection::open(db_path)?;
            migrations::run_migrations(&conn)?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(busy_timeout)
            .build(manager)?;

        Ok(Database {
            async_connection: AsyncDbConnection::new(pool),
        })
    }
}
