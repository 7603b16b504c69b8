//! Database layer for the support desk read core.
//!
//! Every query here is read-only: tickets, tracking records, users and the
//! side tables are owned by the ticket workflow and only counted or listed.

pub mod dashboard;
pub mod predicate;
pub mod scope;
pub mod tickets;

use crate::error::Result;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Default busy timeout applied to file-backed stores.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Default number of pooled connections for a file-backed store.
pub const DEFAULT_POOL_SIZE: u32 = 8;

/// Shared handle to the desk store. Clones share one connection pool; each
/// call checks out its own connection, so readers of a WAL file run side by
/// side.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open the store file, creating and migrating it as needed.
    pub fn open<P: AsRef<Path>>(path: P, busy_timeout_ms: u64, pool_size: u32) -> Result<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        migrate(&mut conn)?;
        drop(conn);

        let busy_timeout = Duration::from_millis(busy_timeout_ms);
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA foreign_keys=ON;")
        });
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;
        Ok(Self { pool })
    }

    /// Fresh migrated store in memory; used by tests and fixtures.
    ///
    /// An in-memory database lives on a single connection, so the pool holds
    /// exactly one that never expires and calls take turns on it.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys=ON;"));
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;
        migrate(&mut *pool.get()?)?;
        Ok(Self { pool })
    }

    fn checkout(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Run `f` on a pooled connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.checkout()?;
        f(&conn)
    }

    /// Run `f` inside one deferred transaction on its own connection: every
    /// read it issues sees the same snapshot, and other requests keep
    /// reading meanwhile.
    pub fn with_read_snapshot<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.checkout()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let out = f(&*tx)?;
        tx.commit()?;
        Ok(out)
    }
}

fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    let report = embedded::migrations::runner().run(conn)?;
    if !report.applied_migrations().is_empty() {
        tracing::info!(
            applied = report.applied_migrations().len(),
            "applied schema migrations"
        );
    }
    Ok(())
}

/// Wall clock in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// JSON array text of `ids`, bound as a single parameter and expanded in SQL
/// with `IN (SELECT value FROM json_each(?N))`.
pub(crate) fn id_array(ids: &[i64]) -> String {
    serde_json::Value::from(ids).to_string()
}
