pub mod commands;
pub mod models;
pub mod storage;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::models::AppSettings;
use crate::storage::{ProjectStore, StoreConfig};

pub use crate::models::{ImageDataUrl, ImageFormat, Project};
pub use crate::storage::{ProjectStorage, StoreError};

/// State shared by every command for the life of the session
pub struct AppState {
    pub store: Arc<ProjectStore>,
    pub settings: AppSettings,
    pub log_dir: PathBuf,
}

impl AppState {
    /// Build the state. The project database is not opened until first use.
    pub fn new(settings: AppSettings, log_dir: PathBuf) -> Result<Self, String> {
        let config = StoreConfig::from_settings(&settings)?;
        Ok(Self {
            store: Arc::new(ProjectStore::new(config)),
            settings,
            log_dir,
        })
    }
}

/// Load settings, install logging and build the app state.
///
/// The returned guard flushes the log file when dropped.
pub async fn bootstrap() -> Result<(AppState, WorkerGuard), String> {
    let settings = commands::settings::get_settings(&utils::paths::settings_path()?).await?;
    let log_dir = utils::paths::log_dir()?;
    let guard = utils::init_logging(&log_dir, &utils::filter_directive(&settings))?;

    let state = AppState::new(settings, log_dir)?;
    info!(
        "Project store configured at {:?}",
        state.store.config().location
    );
    Ok((state, guard))
}
