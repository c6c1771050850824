use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of projects shown on the home screen
pub const DEFAULT_RECENT_LIMIT: usize = 10;

fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Overrides the directory holding the project database
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    /// tracing filter directive, e.g. "info" or "blurr=debug"
    pub log_filter: Option<String>,
    pub theme: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            recent_limit: DEFAULT_RECENT_LIMIT,
            log_filter: None,
            theme: None,
        }
    }
}
