//! Database context for managing connections and repository access.
//!
//! The DbContext is the entry point for database operations. It holds the
//! connection pool and hands out repositories.

use std::path::Path;

use super::items::ItemRepository;
use super::migrations::run_migrations;
use super::pool::{DbError, SqlitePool};

/// Database context that owns the connection pool.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url("/var/lib/march/march.db");
/// ctx.init_schema().await?;
/// let file_id = ctx.items().lookup_by_id("news", id).await?;
/// ```
#[derive(Clone, Debug)]
pub struct DbContext {
    pool: SqlitePool,
}

impl DbContext {
    /// Create a context from a database URL or file path.
    pub fn from_url(url: &str) -> Self {
        Self {
            pool: SqlitePool::new(url),
        }
    }

    /// Create a context from a database file path.
    pub fn from_path(db_path: &Path) -> Self {
        Self {
            pool: SqlitePool::from_path(db_path),
        }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the archive item repository.
    pub fn items(&self) -> ItemRepository {
        ItemRepository::new(self.pool.clone())
    }

    /// Bring the schema to the latest version.
    ///
    /// Returns the names of the steps applied by this call.
    pub async fn init_schema(&self) -> Result<Vec<String>, DbError> {
        run_migrations(self.pool.database_url()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_path(&dir.path().join("march.db"));

        let first = ctx.init_schema().await.unwrap();
        let second = ctx.init_schema().await.unwrap();

        assert_eq!(first.len(), 3);
        assert!(second.is_empty());
        assert_eq!(ctx.items().count("news").await.unwrap(), 0);
    }
}
