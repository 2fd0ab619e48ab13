// Diesel table definitions for the metadata store.

diesel::table! {
    archive_items (id) {
        id -> Text,
        file_id -> Text,
        archive -> Text,
        url -> Text,
        fingerprint -> Text,
        deleted_at -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    archive_fingerprints (archive, fingerprint) {
        archive -> Text,
        fingerprint -> Text,
        file_id -> Text,
        created_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(archive_fingerprints, archive_items,);
