use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::EtlError;

/// Handle to the SQLite file. Holds only the path; each call opens its own
/// connection and drops it when the closure returns, success or not.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Provides a read-write connection to the closure, creating the file
    /// (and its directory) if needed.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, EtlError>
    where
        F: FnOnce(&mut Connection) -> Result<T, EtlError>,
    {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                EtlError::StorageUnavailable(format!(
                    "cannot create database directory '{}': {e}",
                    dir.display()
                ))
            })?;
        }

        let mut conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| {
            EtlError::StorageUnavailable(format!(
                "open '{}' failed: {e}",
                self.path.display()
            ))
        })?;

        // Opening is lazy; a file that is not a database only fails on first read.
        conn.query_row("PRAGMA schema_version", [], |r| r.get::<_, i64>(0))
            .map_err(|e| {
                EtlError::StorageUnavailable(format!(
                    "'{}' is not a usable database: {e}",
                    self.path.display()
                ))
            })?;

        f(&mut conn)
    }

    /// Read-only connection. Never creates the file.
    pub fn with_read_only_conn<F, T>(&self, f: F) -> Result<T, EtlError>
    where
        F: FnOnce(&Connection) -> Result<T, EtlError>,
    {
        if !self.exists() {
            return Err(EtlError::NotPopulated(format!(
                "database '{}' not found, run the pipeline first",
                self.path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            EtlError::StorageUnavailable(format!(
                "open '{}' read-only failed: {e}",
                self.path.display()
            ))
        })?;

        f(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("nested/db/airbnb.db"));
        db.with_conn(|conn| {
            conn.execute_batch("CREATE TABLE t (x INTEGER)")
                .map_err(|e| EtlError::LoadFailure(e.to_string()))
        })
        .unwrap();
        assert!(db.exists());
    }

    #[test]
    fn unreachable_path_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"x").unwrap();

        let db = Database::new(blocker.join("airbnb.db"));
        match db.with_conn(|_| Ok(())) {
            Err(EtlError::StorageUnavailable(_)) => {}
            other => panic!("expected StorageUnavailable, got: {:?}", other),
        }
    }

    #[test]
    fn non_database_file_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("airbnb.db");
        fs::write(&path, vec![b'x'; 4096]).unwrap();

        let db = Database::new(&path);
        match db.with_conn(|_| Ok(())) {
            Err(EtlError::StorageUnavailable(msg)) => assert!(msg.contains("not a usable database"), "{msg}"),
            other => panic!("expected StorageUnavailable, got: {:?}", other),
        }
    }

    #[test]
    fn read_only_on_missing_file_is_not_populated() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("absent.db"));
        match db.with_read_only_conn(|_| Ok(())) {
            Err(EtlError::NotPopulated(_)) => {}
            other => panic!("expected NotPopulated, got: {:?}", other),
        }
        assert!(!db.exists());
    }
}
