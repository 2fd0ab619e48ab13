use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0002_fingerprint_index")
        .depends_on(&["0001_archive_items"])
        .operation(AddIndex::new(
            "archive_items",
            Index::new("idx_archive_items_fingerprint")
                .column("archive")
                .column("fingerprint")
                .filter("deleted_at IS NULL"),
        ))
        .operation(AddIndex::new(
            "archive_items",
            Index::new("idx_archive_items_archive_id")
                .column("archive")
                .column("id"),
        ))
}
