//! `DuckDB` connection pool management.
//!
//! The pool opens the database once and hands out clones of that root
//! connection, so every pooled connection sees the same database, in-memory
//! ones included.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use ::duckdb::Connection;

struct PoolInner {
    db_path: PathBuf,
    max_pool_size: usize,
    root: Mutex<Connection>,
    idle: Mutex<Vec<Connection>>,
}

/// A connection pool manager for `DuckDB` connections.
#[derive(Clone)]
pub struct DuckDbConnectionManager {
    inner: Arc<PoolInner>,
}

impl DuckDbConnectionManager {
    /// Open the database at `path` and create a pool over it.
    ///
    /// # Errors
    /// Returns an error if the database file cannot be opened or configured.
    pub fn open(path: impl Into<PathBuf>, max_pool_size: usize) -> Result<Self, ::duckdb::Error> {
        let db_path = path.into();
        let root = Connection::open(db_path.as_path())?;
        configure_connection(&root)?;

        Ok(Self {
            inner: Arc::new(PoolInner {
                db_path,
                max_pool_size: max_pool_size.max(1),
                root: Mutex::new(root),
                idle: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Run `work` on a pooled connection, returning the connection to the
    /// pool afterwards whether or not `work` succeeded.
    ///
    /// # Errors
    /// Returns an error if a new connection cannot be cloned or configured,
    /// or whatever `work` returns.
    pub fn with_connection<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<::duckdb::Error>,
    {
        let connection = self.checkout()?;
        let result = work(&connection);
        self.checkin(connection);
        result
    }

    /// Number of idle connections currently held by the pool.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.inner.db_path.as_path()
    }

    fn checkout(&self) -> Result<Connection, ::duckdb::Error> {
        let idle = self
            .inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        if let Some(connection) = idle {
            return Ok(connection);
        }

        let connection = self
            .inner
            .root
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_clone()?;
        configure_connection(&connection)?;
        Ok(connection)
    }

    fn checkin(&self, connection: Connection) {
        let mut idle = self
            .inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.inner.max_pool_size {
            idle.push(connection);
        }
    }
}

/// Configure a database connection with appropriate settings.
///
/// # Errors
/// Returns an error if configuration SQL fails to execute.
fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_pool(max_pool_size: usize) -> (tempfile::TempDir, DuckDbConnectionManager) {
        let temp = tempdir().expect("tempdir");
        let manager = DuckDbConnectionManager::open(temp.path().join("pool.duckdb"), max_pool_size)
            .expect("open pool");
        (temp, manager)
    }

    #[test]
    fn pooled_connections_share_one_database() {
        let (_temp, manager) = open_pool(2);

        manager
            .with_connection(|writer| {
                writer.execute_batch("CREATE TABLE t (v INTEGER); INSERT INTO t VALUES (7);")
            })
            .expect("seed table");
        let value: i32 = manager
            .with_connection(|reader| reader.query_row("SELECT v FROM t", [], |row| row.get(0)))
            .expect("read value");

        assert_eq!(value, 7);
    }

    #[test]
    fn nested_work_uses_separate_connections_up_to_pool_size() {
        let (_temp, manager) = open_pool(1);

        manager
            .with_connection(|_outer| {
                manager.with_connection(|_inner| Ok::<_, ::duckdb::Error>(()))
            })
            .expect("nested work");
        assert_eq!(manager.idle_count(), 1);
    }

    #[test]
    fn failed_work_still_returns_its_connection() {
        let (_temp, manager) = open_pool(2);

        let result = manager.with_connection(|connection| {
            connection.execute_batch("SELECT * FROM missing_table")
        });

        assert!(result.is_err());
        assert_eq!(manager.idle_count(), 1);
    }
}
