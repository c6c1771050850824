//! Diagnostic commands
//!
//! Commands for troubleshooting and debugging.

use crate::AppState;
use std::fs;
use tracing::info;

/// Diagnostic result with system checks
#[derive(Debug, serde::Serialize)]
pub struct DiagnosticResult {
    /// Whether the store currently holds an open database handle
    pub store_open: bool,
    /// Database file, absent for an in-memory store
    pub db_path: Option<String>,
    /// Whether the data directory is writable
    pub data_dir_writable: bool,
    /// Database status, including the project count when reachable
    pub db_status: String,
    /// Log directory path
    pub log_path: String,
    /// Application version
    pub app_version: String,
}

/// Run diagnostic checks
pub async fn run_diagnostics(state: &AppState) -> Result<DiagnosticResult, String> {
    info!("Running diagnostics");

    let store_open = state.store.is_open().await;
    let db_path = state.store.config().location.path().map(|p| p.to_path_buf());

    let data_dir_writable = match db_path.as_ref().and_then(|p| p.parent()) {
        Some(dir) => {
            let test_file = dir.join(".blurr_test");
            let writable = fs::create_dir_all(dir).is_ok() && fs::write(&test_file, "test").is_ok();
            if writable {
                fs::remove_file(&test_file).ok();
            }
            writable
        }
        None => false,
    };

    let db_status = match state.store.count().await {
        Ok(count) => format!("Connected ({} projects)", count),
        Err(e) => format!("Error: {}", e),
    };

    Ok(DiagnosticResult {
        store_open,
        db_path: db_path.map(|p| p.to_string_lossy().to_string()),
        data_dir_writable,
        db_status,
        log_path: state.log_dir.to_string_lossy().to_string(),
        app_version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get the log directory path
pub async fn get_log_path(state: &AppState) -> Result<String, String> {
    Ok(state.log_dir.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppSettings;
    use crate::storage::{ProjectStore, StoreConfig};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_diagnostics_on_fresh_store() {
        let dir = tempdir().unwrap();
        let state = AppState {
            store: Arc::new(ProjectStore::new(StoreConfig::in_dir(dir.path().join("data")))),
            settings: AppSettings::default(),
            log_dir: dir.path().join("logs"),
        };

        let result = run_diagnostics(&state).await.unwrap();
        assert!(result.data_dir_writable);
        assert_eq!(result.db_status, "Connected (0 projects)");
        assert!(result.db_path.unwrap().ends_with("blurr.sqlite"));
        assert!(!result.store_open);
        assert!(state.store.is_open().await);
        assert_eq!(get_log_path(&state).await.unwrap(), result.log_path);
    }

    #[tokio::test]
    async fn test_diagnostics_reports_open_failure() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file").unwrap();
        let state = AppState {
            store: Arc::new(ProjectStore::new(StoreConfig::in_dir(blocker.join("data")))),
            settings: AppSettings::default(),
            log_dir: dir.path().join("logs"),
        };

        let result = run_diagnostics(&state).await.unwrap();
        assert!(!result.data_dir_writable);
        assert!(result.db_status.starts_with("Error: Storage engine unavailable"), "{}", result.db_status);
    }
}
