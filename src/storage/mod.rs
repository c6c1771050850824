//! Storage module for SQLite database operations
//!
//! This module provides:
//! - Database connection management
//! - Schema migrations
//! - The project repository and the async project store built on it

pub mod db;
pub mod project_repo;
pub mod project_store;

pub use db::{Database, DatabaseError, DatabaseLocation, open_database};
pub use project_repo::ProjectRepo;
pub use project_store::{ProjectStorage, ProjectStore, StoreConfig, StoreError};
