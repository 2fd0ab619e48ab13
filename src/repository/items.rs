//! Archive item repository: the metadata store.
//!
//! Only three operations are needed by the ingest and retrieval paths:
//! point lookup by id, point lookup by fingerprint, and insert. Lookups only
//! see rows whose `deleted_at` is unset.

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{ArchiveItemRecord, NewArchiveItem, NewFingerprintClaim};
use super::pool::{DbError, SqlitePool};
use super::util::{parse_datetime, parse_datetime_opt};
use crate::models::ArchiveItem;
use crate::schema::{archive_fingerprints, archive_items};

/// Convert a database record to a domain model.
impl From<ArchiveItemRecord> for ArchiveItem {
    fn from(record: ArchiveItemRecord) -> Self {
        ArchiveItem {
            id: record.id,
            file_id: record.file_id,
            archive: record.archive,
            url: record.url,
            fingerprint: record.fingerprint,
            deleted_at: parse_datetime_opt(record.deleted_at),
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Metadata store for archive items.
#[derive(Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve a client-visible id to the canonical file id.
    pub async fn lookup_by_id(&self, archive: &str, id: &str) -> Result<Option<String>, DbError> {
        let mut conn = self.pool.get().await?;

        archive_items::table
            .filter(archive_items::archive.eq(archive))
            .filter(archive_items::id.eq(id))
            .filter(archive_items::deleted_at.is_null())
            .select(archive_items::file_id)
            .first::<String>(&mut conn)
            .await
            .optional()
    }

    /// Find the canonical file id already holding content with this fingerprint.
    pub async fn lookup_by_fingerprint(
        &self,
        archive: &str,
        fingerprint: &str,
    ) -> Result<Option<String>, DbError> {
        let mut conn = self.pool.get().await?;

        archive_items::table
            .filter(archive_items::archive.eq(archive))
            .filter(archive_items::fingerprint.eq(fingerprint))
            .filter(archive_items::deleted_at.is_null())
            .order((archive_items::created_at.asc(), archive_items::id.asc()))
            .select(archive_items::file_id)
            .first::<String>(&mut conn)
            .await
            .optional()
    }

    /// Append an item row.
    ///
    /// The fingerprint claim and the row are written in one transaction. The
    /// first claim for an `(archive, fingerprint)` pair wins; when another
    /// capture already claimed it, the row is pointed at that canonical file
    /// instead of `item.file_id`. Returns the file id actually recorded.
    pub async fn insert(&self, item: &ArchiveItem) -> Result<String, DbError> {
        let mut conn = self.pool.get().await?;
        let created_at = item.created_at.to_rfc3339();

        conn.transaction(|conn| {
            Box::pin(async move {
                diesel::insert_or_ignore_into(archive_fingerprints::table)
                    .values(NewFingerprintClaim {
                        archive: &item.archive,
                        fingerprint: &item.fingerprint,
                        file_id: &item.file_id,
                        created_at: &created_at,
                    })
                    .execute(conn)
                    .await?;

                let canonical = archive_fingerprints::table
                    .find((item.archive.as_str(), item.fingerprint.as_str()))
                    .select(archive_fingerprints::file_id)
                    .first::<String>(conn)
                    .await?;

                diesel::insert_into(archive_items::table)
                    .values(NewArchiveItem {
                        id: &item.id,
                        file_id: &canonical,
                        archive: &item.archive,
                        url: &item.url,
                        fingerprint: &item.fingerprint,
                        created_at: &created_at,
                    })
                    .execute(conn)
                    .await?;

                Ok(canonical)
            })
        })
        .await
    }

    /// Load a full visible item row.
    pub async fn get(&self, archive: &str, id: &str) -> Result<Option<ArchiveItem>, DbError> {
        let mut conn = self.pool.get().await?;

        archive_items::table
            .filter(archive_items::archive.eq(archive))
            .filter(archive_items::id.eq(id))
            .filter(archive_items::deleted_at.is_null())
            .select(ArchiveItemRecord::as_select())
            .first::<ArchiveItemRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(ArchiveItem::from))
    }

    /// Number of visible items in an archive.
    pub async fn count(&self, archive: &str) -> Result<i64, DbError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        archive_items::table
            .filter(archive_items::archive.eq(archive))
            .filter(archive_items::deleted_at.is_null())
            .select(count_star())
            .first(&mut conn)
            .await
    }
}
