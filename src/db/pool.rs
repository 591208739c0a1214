//! SQLite connection wrapper (lightweight, one connection per process).

use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

use crate::db::initialize::init_db;
use crate::errors::AppResult;

pub struct DbPool {
    pub conn: Connection,
}

impl DbPool {
    pub fn new(path: &str) -> AppResult<Self> {
        let conn = Connection::open(Path::new(path))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Open the database and bring the schema up to date.
    pub fn open(path: &str) -> AppResult<Self> {
        let pool = Self::new(path)?;
        init_db(&pool.conn)?;
        Ok(pool)
    }

    /// Run `func` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken up front, so concurrent writers queue on the
    /// busy timeout instead of failing halfway. Any error rolls back.
    pub fn immediate<F, T>(&mut self, func: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = func(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}
