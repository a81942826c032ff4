//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the fleet schema
//! - Repository abstractions for data access
//! - Database migrations
//! - Row-level security context helpers

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod rls;

pub use repositories::{
    ActionLogRepository, SeaOrmAttachmentRepository, UserRepository, VehicleRepository,
    VehicleTypeRepository, WorkflowRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
