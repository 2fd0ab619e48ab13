//! Database migrations using cetane.
//!
//! Steps are resolved from the registry in dependency order and applied one
//! at a time inside a SQLite transaction together with their bookkeeping row,
//! so a step is either recorded and fully applied or not applied at all.

use rusqlite::Connection;
use tracing::{debug, info};

use super::pool::DbError;

/// Table recording every applied step by name.
pub const STATE_TABLE: &str = "__cetane_migrations";

fn migration_error(msg: impl std::fmt::Display) -> DbError {
    DbError::QueryBuilderError(msg.to_string().into())
}

/// Run pending migrations for a database URL.
///
/// Returns the names of the steps applied by this call, in order.
pub async fn run_migrations(database_url: &str) -> Result<Vec<String>, DbError> {
    let url = database_url
        .strip_prefix("sqlite:")
        .unwrap_or(database_url)
        .to_string();

    tokio::task::spawn_blocking(move || {
        let mut conn = Connection::open(&url).map_err(migration_error)?;
        let applied = migrate(&mut conn)?;

        for name in &applied {
            info!("Applied migration: {}", name);
        }
        if applied.is_empty() {
            info!("No pending migrations");
        }

        Ok(applied)
    })
    .await
    .map_err(|e| DbError::QueryBuilderError(Box::new(e)))?
}

/// Apply every pending step on an open connection.
pub fn migrate(conn: &mut Connection) -> Result<Vec<String>, DbError> {
    use cetane::backend::Sqlite;

    conn.execute_batch(&format!(
        "PRAGMA journal_mode = WAL;
         CREATE TABLE IF NOT EXISTS {STATE_TABLE} (
             name TEXT PRIMARY KEY NOT NULL,
             applied_at TEXT NOT NULL DEFAULT (datetime('now'))
         )"
    ))
    .map_err(migration_error)?;

    let registry = crate::migrations::registry();
    let backend = Sqlite;
    let order = registry.resolve_order().map_err(migration_error)?;
    let already = applied_migrations(conn)?;

    let mut applied = Vec::new();
    for name in order {
        let name = name.to_string();
        if already.contains(&name) {
            debug!("Migration already applied: {}", name);
            continue;
        }

        let migration = registry
            .get(&name)
            .ok_or_else(|| migration_error(format!("migration {name} missing from registry")))?;

        let tx = conn.transaction().map_err(migration_error)?;
        for stmt in migration.forward_sql(&backend) {
            if stmt.trim().is_empty() {
                continue;
            }
            tx.execute_batch(&stmt)
                .map_err(|e| migration_error(format!("migration {name} failed: {e}")))?;
        }
        tx.execute(
            &format!("INSERT INTO {STATE_TABLE} (name) VALUES (?1)"),
            [name.as_str()],
        )
        .map_err(migration_error)?;
        tx.commit().map_err(migration_error)?;

        applied.push(name);
    }

    Ok(applied)
}

/// Names of applied steps in the order they were applied.
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>, DbError> {
    let mut stmt = conn
        .prepare(&format!("SELECT name FROM {STATE_TABLE} ORDER BY rowid"))
        .map_err(migration_error)?;

    let names = stmt
        .query_map([], |row| row.get(0))
        .map_err(migration_error)?
        .collect::<Result<Vec<String>, _>>()
        .map_err(migration_error)?;

    Ok(names)
}

/// The most recently applied step, i.e. the schema version.
pub fn current_version(conn: &Connection) -> Result<Option<String>, DbError> {
    Ok(applied_migrations(conn)?.pop())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_order() -> Vec<String> {
        crate::migrations::registry()
            .resolve_order()
            .unwrap()
            .into_iter()
            .map(|n| n.to_string())
            .collect()
    }

    #[test]
    fn test_fresh_database_reaches_latest() {
        let mut conn = Connection::open_in_memory().unwrap();
        let applied = migrate(&mut conn).unwrap();

        assert_eq!(applied, expected_order());
        assert_eq!(
            current_version(&conn).unwrap().as_deref(),
            Some("0003_canonical_files")
        );
    }

    #[test]
    fn test_second_run_applies_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        let second = migrate(&mut conn).unwrap();

        assert!(second.is_empty());
        assert_eq!(applied_migrations(&conn).unwrap(), expected_order());
    }

    #[test]
    fn test_partially_migrated_database_resumes() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute_batch(&format!(
            "DROP TABLE archive_fingerprints;
             DELETE FROM {STATE_TABLE} WHERE name = '0003_canonical_files'"
        ))
        .unwrap();

        let applied = migrate(&mut conn).unwrap();
        assert_eq!(applied, vec!["0003_canonical_files".to_string()]);
    }

    #[test]
    fn test_canonical_backfill_keeps_earliest_row() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute_batch(&format!(
            "DROP TABLE archive_fingerprints;
             DELETE FROM {STATE_TABLE} WHERE name = '0003_canonical_files';
             INSERT INTO archive_items (id, file_id, archive, url, fingerprint, created_at) VALUES
                 ('b', 'a', 'news', 'https://example.com/b', 'ff', '2024-01-02T00:00:00+00:00'),
                 ('a', 'a', 'news', 'https://example.com/a', 'ff', '2024-01-01T00:00:00+00:00');"
        ))
        .unwrap();

        migrate(&mut conn).unwrap();

        let file_id: String = conn
            .query_row(
                "SELECT file_id FROM archive_fingerprints WHERE archive = 'news' AND fingerprint = 'ff'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(file_id, "a");
    }
}
