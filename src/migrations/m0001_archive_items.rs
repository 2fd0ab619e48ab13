use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0001_archive_items").operation(
        CreateTable::new("archive_items")
            .add_field(Field::new("id", FieldType::Text).primary_key())
            .add_field(Field::new("file_id", FieldType::Text).not_null())
            .add_field(Field::new("archive", FieldType::Text).not_null())
            .add_field(Field::new("url", FieldType::Text).not_null())
            .add_field(Field::new("fingerprint", FieldType::Text).not_null())
            .add_field(Field::new("deleted_at", FieldType::Text))
            .add_field(Field::new("created_at", FieldType::Text).not_null()),
    )
}
