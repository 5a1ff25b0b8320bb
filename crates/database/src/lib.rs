//! Dewana Database Crate
//!
//! Connection management and embedded schema migrations for the Dewana
//! backend. Domain crates own their queries; this crate only hands out a
//! ready-to-use pool.

use sqlx::SqlitePool;
use thiserror::Error;
use dewana_config::DatabaseConfig;

pub mod connection;
pub mod migrations;

pub use connection::{prepare_database, DatabaseConnection};
pub use migrations::{run_migrations, MIGRATOR};
pub use sqlx::SqlitePool as Pool;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection failed: {0}")]
    ConnectionError(String),
    #[error("database migration failed: {0}")]
    MigrationError(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("init.db").display()),
            max_connections: 2,
        };

        let pool = initialize_database(&config).await.unwrap();
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_invalid_url_is_connection_error() {
        let config = DatabaseConfig {
            url: "postgres://nowhere/db".to_string(),
            max_connections: 1,
        };

        let error = initialize_database(&config).await.unwrap_err();
        assert!(matches!(error, DatabaseError::ConnectionError(_)));
    }
}
