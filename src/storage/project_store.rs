//! Async project store over a lazily opened SQLite handle
//!
//! The handle is opened on first use and then shared by every operation.
//! A failed open is not remembered: the next call tries again. SQLite work
//! runs on the blocking thread pool so callers never stall the runtime.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info};

use crate::models::project::Project;
use crate::models::settings::AppSettings;
use crate::utils::paths;
use super::db::{open_database, Database, DatabaseError, DatabaseLocation};
use super::ProjectRepo;

/// Errors surfaced by the project store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage engine could not be opened
    #[error("Storage engine unavailable: {0}")]
    EngineUnavailable(String),
    /// A read or write failed after the engine was open
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
    /// A project with this id already exists
    #[error("Project already exists: {0}")]
    DuplicateKey(String),
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::DuplicateKey(id) => StoreError::DuplicateKey(id),
            DatabaseError::QueryFailed(msg) => StoreError::TransactionFailed(msg),
            other @ (DatabaseError::ConnectionFailed(_)
            | DatabaseError::MigrationFailed(_)
            | DatabaseError::SchemaMismatch { .. }) => {
                StoreError::EngineUnavailable(other.to_string())
            }
        }
    }
}

/// Operations the rest of the application needs from project persistence
#[async_trait]
pub trait ProjectStorage: Send + Sync {
    /// Insert a new project. Fails with `DuplicateKey` if the id is taken.
    async fn create(&self, project: &Project) -> Result<(), StoreError>;

    /// Look up a project; `None` when it does not exist.
    async fn get(&self, id: &str) -> Result<Option<Project>, StoreError>;

    /// Every project, in no particular order.
    async fn get_all(&self) -> Result<Vec<Project>, StoreError>;

    /// Up to `limit` projects, most recently uploaded first.
    async fn get_recent(&self, limit: usize) -> Result<Vec<Project>, StoreError>;

    /// Replace the project with the same id, inserting it if absent.
    async fn update(&self, project: &Project) -> Result<(), StoreError>;

    /// Remove a project. Removing an unknown id succeeds.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Where the store keeps its database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: DatabaseLocation,
}

impl StoreConfig {
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            location: DatabaseLocation::in_dir(&data_dir.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: DatabaseLocation::Memory,
        }
    }

    /// Resolve the data directory from settings, defaulting to the app directory
    pub fn from_settings(settings: &AppSettings) -> Result<Self, String> {
        let data_dir = match &settings.data_dir {
            Some(dir) => dir.clone(),
            None => paths::app_data_dir()?,
        };
        Ok(Self::in_dir(data_dir))
    }
}

type SharedDatabase = Arc<Mutex<Database>>;

/// Durable store for project records
pub struct ProjectStore {
    config: StoreConfig,
    handle: AsyncMutex<Option<SharedDatabase>>,
}

impl ProjectStore {
    /// Create the store. Nothing is opened until the first operation.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            handle: AsyncMutex::new(None),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether the engine handle is currently open
    pub async fn is_open(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    /// Drop the cached handle. The next operation opens the database again.
    pub async fn close(&self) {
        if self.handle.lock().await.take().is_some() {
            info!("Closed project store");
        }
    }

    /// Number of stored projects
    pub async fn count(&self) -> Result<i64, StoreError> {
        self.with_repo(|repo| repo.count()).await
    }

    /// Return the cached handle, opening the database if there is none.
    /// Holding the lock across the open keeps concurrent first calls from
    /// opening twice.
    async fn database(&self) -> Result<SharedDatabase, StoreError> {
        let mut handle = self.handle.lock().await;
        if let Some(db) = handle.as_ref() {
            return Ok(Arc::clone(db));
        }

        let location = self.config.location.clone();
        let opened = tokio::task::spawn_blocking(move || open_database(&location))
            .await
            .map_err(|e| StoreError::EngineUnavailable(format!("Open task failed: {}", e)))?;

        match opened {
            Ok(db) => {
                debug!("Project store ready");
                let db = Arc::new(Mutex::new(db));
                *handle = Some(Arc::clone(&db));
                Ok(db)
            }
            Err(e) => {
                error!("Failed to open project store: {}", e);
                Err(StoreError::from(e))
            }
        }
    }

    /// Run `op` against the repository on the blocking pool
    async fn with_repo<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&ProjectRepo<'_>) -> Result<T, DatabaseError> + Send + 'static,
    {
        let db = self.database().await?;

        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;
            let repo = ProjectRepo::new(&guard.conn);
            op(&repo).map_err(StoreError::from)
        })
        .await
        .map_err(|e| StoreError::TransactionFailed(format!("Storage task failed: {}", e)))?
    }
}

#[async_trait]
impl ProjectStorage for ProjectStore {
    async fn create(&self, project: &Project) -> Result<(), StoreError> {
        let project = project.clone();
        self.with_repo(move |repo| repo.create(&project)).await
    }

    async fn get(&self, id: &str) -> Result<Option<Project>, StoreError> {
        let id = id.to_string();
        self.with_repo(move |repo| repo.get(&id)).await
    }

    async fn get_all(&self) -> Result<Vec<Project>, StoreError> {
        self.with_repo(|repo| repo.get_all()).await
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<Project>, StoreError> {
        self.with_repo(move |repo| repo.get_recent(limit)).await
    }

    async fn update(&self, project: &Project) -> Result<(), StoreError> {
        let project = project.clone();
        self.with_repo(move |repo| repo.update(&project)).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        self.with_repo(move |repo| repo.delete(&id).map(|_| ())).await
    }
}
