//! Project commands: upload, view, list, rename, delete
//!
//! Every command reports failure as a message for the user and leaves the
//! caller's view of the projects untouched; nothing is half-applied.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::models::image::{validate_upload, ImageDataUrl};
use crate::models::project::Project;
use crate::storage::ProjectStorage;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub file_name: String,
    /// MIME type reported by the picker, if any
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameProjectRequest {
    pub id: String,
    pub name: String,
}

/// File name without its last extension, or the whole name if that is empty
pub fn default_project_name(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}

/// Validate an uploaded image and store it as a new project
pub async fn upload_image(
    request: UploadRequest,
    store: &dyn ProjectStorage,
) -> Result<Project, String> {
    let format = validate_upload(&request.file_name, request.mime_type.as_deref(), &request.bytes)
        .map_err(|e| {
            warn!("Rejected upload {:?}: {}", request.file_name, e);
            e.to_string()
        })?;

    let image = ImageDataUrl::from_bytes(format, &request.bytes);
    let project = Project::new(default_project_name(&request.file_name).to_string(), &image);

    store
        .create(&project)
        .await
        .map_err(|e| format!("Failed to save project: {}", e))?;

    info!("Created project: {} ({})", project.name, project.id);
    Ok(project)
}

/// Read an image from disk and store it as a new project
pub async fn import_image_file(path: &Path, store: &dyn ProjectStorage) -> Result<Project, String> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| format!("Not a file: {:?}", path))?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;

    upload_image(
        UploadRequest {
            file_name,
            mime_type: None,
            bytes,
        },
        store,
    )
    .await
}

/// Fetch one project; `None` means it does not exist
pub async fn get_project(id: &str, store: &dyn ProjectStorage) -> Result<Option<Project>, String> {
    store
        .get(id)
        .await
        .map_err(|e| format!("Failed to get project: {}", e))
}

/// Most recently uploaded projects, newest first
pub async fn list_recent_projects(
    limit: usize,
    store: &dyn ProjectStorage,
) -> Result<Vec<Project>, String> {
    store
        .get_recent(limit)
        .await
        .map_err(|e| format!("Failed to load projects: {}", e))
}

pub async fn list_all_projects(store: &dyn ProjectStorage) -> Result<Vec<Project>, String> {
    store
        .get_all()
        .await
        .map_err(|e| format!("Failed to load projects: {}", e))
}

/// Give a project a new name, keeping everything else
pub async fn rename_project(
    request: RenameProjectRequest,
    store: &dyn ProjectStorage,
) -> Result<Project, String> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err("Project name cannot be empty".to_string());
    }

    let existing = store
        .get(&request.id)
        .await
        .map_err(|e| format!("Failed to get project: {}", e))?
        .ok_or("Project not found")?;

    let updated = existing.renamed(name);
    store
        .update(&updated)
        .await
        .map_err(|e| format!("Failed to update project name: {}", e))?;

    info!("Renamed project {} to {}", updated.id, updated.name);
    Ok(updated)
}

/// Delete a project. Deleting one that is already gone succeeds.
pub async fn delete_project(id: &str, store: &dyn ProjectStorage) -> Result<(), String> {
    store
        .delete(id)
        .await
        .map_err(|e| format!("Failed to delete project: {}", e))?;

    info!("Deleted project: {}", id);
    Ok(())
}
