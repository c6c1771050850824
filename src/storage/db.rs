//! Database connection management and migrations

use rusqlite::{ffi, Connection, ErrorCode};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Latest schema version this build knows how to read
pub const SCHEMA_VERSION: i32 = 1;

/// File name of the project database inside the data directory
pub const DB_FILE_NAME: &str = "blurr.sqlite";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
    #[error("Schema version {found} is newer than supported version {supported}")]
    SchemaMismatch { found: i32, supported: i32 },
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::QueryFailed(err.to_string())
    }
}

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    /// Private in-memory database, gone once the connection closes
    Memory,
}

impl DatabaseLocation {
    /// Database file inside a data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        DatabaseLocation::File(data_dir.join(DB_FILE_NAME))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            DatabaseLocation::File(path) => Some(path),
            DatabaseLocation::Memory => None,
        }
    }
}

/// Wrapper around SQLite connection
pub struct Database {
    pub conn: Connection,
    pub location: DatabaseLocation,
}

/// Open or create the database, bringing its schema up to date
pub fn open_database(location: &DatabaseLocation) -> Result<Database, DatabaseError> {
    let mut conn = match location {
        DatabaseLocation::File(path) => {
            info!("Opening database at {:?}", path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::ConnectionFailed(format!(
                        "Failed to create data directory {:?}: {}",
                        parent, e
                    ))
                })?;
            }
            Connection::open(path)
        }
        DatabaseLocation::Memory => {
            debug!("Opening in-memory database");
            Connection::open_in_memory()
        }
    }
    .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    configure(&conn)?;
    run_migrations(&mut conn)?;

    Ok(Database {
        conn,
        location: location.clone(),
    })
}

/// Commits must be on disk before a write returns
fn configure(conn: &Connection) -> Result<(), DatabaseError> {
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    let journal_mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(|e| DatabaseError::ConnectionFailed(format!("Failed to set journal mode: {}", e)))?;
    debug!("Journal mode: {}", journal_mode);

    conn.pragma_update(None, "synchronous", "FULL")
        .map_err(|e| DatabaseError::ConnectionFailed(format!("Failed to set synchronous: {}", e)))?;

    Ok(())
}

/// Current schema version, 0 for a fresh database
pub fn schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
    let has_table: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Run database schema migrations
fn run_migrations(conn: &mut Connection) -> Result<(), DatabaseError> {
    let current_version = schema_version(conn)
        .map_err(|e| DatabaseError::MigrationFailed(format!("Failed to read schema version: {}", e)))?;

    info!("Current schema version: {}", current_version);

    if current_version > SCHEMA_VERSION {
        return Err(DatabaseError::SchemaMismatch {
            found: current_version,
            supported: SCHEMA_VERSION,
        });
    }

    if current_version < 1 {
        info!("Applying migration v1: Projects");
        apply_v1_schema(conn)?;
    }

    Ok(())
}

/// Apply the initial v1 schema
fn apply_v1_schema(conn: &mut Connection) -> Result<(), DatabaseError> {
    let tx = conn
        .transaction()
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
    tx.execute_batch(include_str!("schema.sql"))
        .map_err(|e| DatabaseError::MigrationFailed(format!("Failed to apply v1 schema: {}", e)))?;
    tx.commit()
        .map_err(|e| DatabaseError::MigrationFailed(format!("Failed to commit v1 schema: {}", e)))?;
    Ok(())
}

/// Whether an insert was rejected because its key already exists
pub fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE)
        }
        _ => false,
    }
}
