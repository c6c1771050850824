//! Application directories

use std::path::PathBuf;

/// Directory name under the platform data directory
pub const APP_DIR_NAME: &str = "com.blurr";

/// Platform app support directory, e.g. `~/Library/Application Support/com.blurr`
pub fn app_data_dir() -> Result<PathBuf, String> {
    let dir = dirs::data_dir()
        .ok_or("Could not find app support directory")?
        .join(APP_DIR_NAME);
    Ok(dir)
}

pub fn settings_path() -> Result<PathBuf, String> {
    Ok(app_data_dir()?.join("settings.json"))
}

pub fn log_dir() -> Result<PathBuf, String> {
    Ok(app_data_dir()?.join("logs"))
}
