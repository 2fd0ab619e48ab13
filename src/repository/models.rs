//! Diesel records for the metadata tables.

use diesel::prelude::*;

use crate::schema;

/// Archive item row from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::archive_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ArchiveItemRecord {
    pub id: String,
    pub file_id: String,
    pub archive: String,
    pub url: String,
    pub fingerprint: String,
    pub deleted_at: Option<String>,
    pub created_at: String,
}

/// New archive item for insertion.
#[derive(Insertable, Debug, Clone, Copy)]
#[diesel(table_name = schema::archive_items)]
pub struct NewArchiveItem<'a> {
    pub id: &'a str,
    pub file_id: &'a str,
    pub archive: &'a str,
    pub url: &'a str,
    pub fingerprint: &'a str,
    pub created_at: &'a str,
}

/// Canonical file claim for a fingerprint.
#[derive(Insertable, Debug, Clone, Copy)]
#[diesel(table_name = schema::archive_fingerprints)]
pub struct NewFingerprintClaim<'a> {
    pub archive: &'a str,
    pub fingerprint: &'a str,
    pub file_id: &'a str,
    pub created_at: &'a str,
}
