//! Project repository for the `projects` collection

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

use crate::models::project::Project;
use super::db::is_duplicate_key;
use super::DatabaseError;

const SELECT_COLUMNS: &str = "SELECT id, image_data, name, uploaded_at FROM projects";

/// Newest first, read straight off the recency index
const RECENT_SQL: &str = "SELECT id, image_data, name, uploaded_at
     FROM projects INDEXED BY idx_projects_uploaded_at
     ORDER BY uploaded_at DESC
     LIMIT ?";

/// Fixed-width RFC 3339 so that string order matches time order
pub fn timestamp_key(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Repository for project records
pub struct ProjectRepo<'a> {
    conn: &'a Connection,
}

impl<'a> ProjectRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new project; the id must not exist yet
    pub fn create(&self, project: &Project) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO projects (id, image_data, name, uploaded_at) VALUES (?, ?, ?, ?)",
                params![
                    project.id,
                    project.image_data,
                    project.name,
                    timestamp_key(&project.uploaded_at),
                ],
            )
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    DatabaseError::DuplicateKey(project.id.clone())
                } else {
                    DatabaseError::from(e)
                }
            })?;
        Ok(())
    }

    /// Get a project by ID
    pub fn get(&self, id: &str) -> Result<Option<Project>, DatabaseError> {
        let result = self.conn.query_row(
            &format!("{} WHERE id = ?", SELECT_COLUMNS),
            [id],
            row_to_project,
        );

        match result {
            Ok(project) => Ok(Some(project)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e)),
        }
    }

    /// Get every project, in storage order
    pub fn get_all(&self) -> Result<Vec<Project>, DatabaseError> {
        let mut stmt = self.conn.prepare(SELECT_COLUMNS)?;
        let rows = stmt.query_map([], row_to_project)?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    /// Up to `limit` projects, most recently uploaded first
    pub fn get_recent(&self, limit: usize) -> Result<Vec<Project>, DatabaseError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(RECENT_SQL)?;
        let rows = stmt.query_map([limit], row_to_project)?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    /// Replace the stored project with this one, inserting it if absent
    pub fn update(&self, project: &Project) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO projects (id, image_data, name, uploaded_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                image_data = excluded.image_data,
                name = excluded.name,
                uploaded_at = excluded.uploaded_at",
            params![
                project.id,
                project.image_data,
                project.name,
                timestamp_key(&project.uploaded_at),
            ],
        )?;
        Ok(())
    }

    /// Delete a project, returning whether it existed
    pub fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let count = self.conn.execute("DELETE FROM projects WHERE id = ?", [id])?;
        Ok(count > 0)
    }

    pub fn count(&self) -> Result<i64, DatabaseError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    let uploaded_at_str: String = row.get(3)?;
    let uploaded_at = DateTime::parse_from_rfc3339(&uploaded_at_str)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(Project {
        id: row.get(0)?,
        image_data: row.get(1)?,
        name: row.get(2)?,
        uploaded_at,
    })
}
