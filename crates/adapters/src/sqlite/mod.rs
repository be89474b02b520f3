mod queries;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use pixatools_application::{ApplicationError, StateStore, StoreWrite};
use rusqlite::{Connection, TransactionBehavior};

use crate::migrations::MIGRATIONS;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Key-value state in a single SQLite file. Updates run inside
/// `BEGIN IMMEDIATE`, so they serialize across threads and processes.
#[derive(Debug, Clone)]
pub struct SqliteStateStore {
    path: PathBuf,
}

impl SqliteStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn initialize(&self) -> Result<(), ApplicationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ApplicationError::InvalidInput(
                "state path must not be empty".to_string(),
            ));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|error| ApplicationError::Io(error.to_string()))?;
            }
        }

        let conn = self.open_connection()?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(persistence)?;

        for migration in MIGRATIONS {
            conn.execute_batch(migration).map_err(persistence)?;
        }

        tracing::debug!(path = %self.path.display(), "state store initialized");
        Ok(())
    }

    fn open_connection(&self) -> Result<Connection, ApplicationError> {
        let conn = Connection::open(&self.path).map_err(persistence)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(persistence)?;
        Ok(conn)
    }
}

impl StateStore for SqliteStateStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError> {
        let conn = self.open_connection()?;
        queries::get_value(&conn, key).map_err(persistence)
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<StoreWrite, ApplicationError>,
    ) -> Result<(), ApplicationError> {
        let mut conn = self.open_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(persistence)?;

        let current = queries::get_value(&tx, key).map_err(persistence)?;
        if let StoreWrite::Put(value) = apply(current)? {
            queries::put_value(&tx, key, &value).map_err(persistence)?;
        }
        tx.commit().map_err(persistence)
    }

    fn remove(&self, key: &str) -> Result<(), ApplicationError> {
        let conn = self.open_connection()?;
        queries::delete_value(&conn, key).map_err(persistence)
    }
}

fn persistence(error: rusqlite::Error) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}
