use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0003_canonical_files")
        .depends_on(&["0002_fingerprint_index"])
        // One canonical file per (archive, fingerprint); inserts race on this key.
        .operation(
            RunSql::portable()
                .for_backend(
                    "sqlite",
                    r#"CREATE TABLE archive_fingerprints (
    archive TEXT NOT NULL,
    fingerprint TEXT NOT NULL,
    file_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (archive, fingerprint)
)"#,
                )
                .for_backend(
                    "postgres",
                    r#"CREATE TABLE archive_fingerprints (
    archive TEXT NOT NULL,
    fingerprint TEXT NOT NULL,
    file_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (archive, fingerprint)
)"#,
                ),
        )
        // Backfill: the earliest visible row for each fingerprint owns the bytes.
        .operation(
            RunSql::portable()
                .for_backend(
                    "sqlite",
                    r#"INSERT OR IGNORE INTO archive_fingerprints (archive, fingerprint, file_id, created_at)
SELECT archive, fingerprint, file_id, created_at
FROM archive_items
WHERE deleted_at IS NULL
ORDER BY created_at, rowid"#,
                )
                .for_backend(
                    "postgres",
                    r#"INSERT INTO archive_fingerprints (archive, fingerprint, file_id, created_at)
SELECT DISTINCT ON (archive, fingerprint) archive, fingerprint, file_id, created_at
FROM archive_items
WHERE deleted_at IS NULL
ORDER BY archive, fingerprint, created_at
ON CONFLICT DO NOTHING"#,
                ),
        )
}
