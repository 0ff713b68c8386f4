mod seed;
mod store;

pub use seed::*;
pub use store::{ConflictScope, ScheduleStore};

use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{BookingError, Result};

const MIGRATION_001: &str = include_str!("migrations/001_initial.sql");

/// Database connection wrapper
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database at the given path.
    ///
    /// `busy_timeout` bounds how long a statement waits on another writer
    /// before failing with `StoreUnavailable`.
    pub fn open<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(MIGRATION_001)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| BookingError::StoreUnavailable("connection lock poisoned".to_string()))
    }

    /// Run `f` against a consistent snapshot of the store.
    ///
    /// The session lives only for the duration of the call.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Session<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let value = f(&Session { conn: &*tx })?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` inside an exclusive write transaction.
    ///
    /// Commits only when `f` succeeds; any error rolls back every write made
    /// through the session.
    pub fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Session<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&Session { conn: &*tx })?;
        tx.commit()?;
        Ok(value)
    }

    /// Load a business definition atomically
    pub fn apply_seed(&self, seed: &BusinessSeed) -> Result<()> {
        seed.validate()?;
        self.write(|session| session.apply_seed(seed))
    }
}

/// A store session scoped to one transaction
pub struct Session<'c> {
    conn: &'c Connection,
}
