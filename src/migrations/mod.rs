mod m0001_archive_items;
mod m0002_fingerprint_index;
mod m0003_canonical_files;

use cetane::prelude::MigrationRegistry;

pub fn registry() -> MigrationRegistry {
    let mut reg = MigrationRegistry::new();
    reg.register(m0001_archive_items::migration());
    reg.register(m0002_fingerprint_index::migration());
    reg.register(m0003_canonical_files::migration());
    reg
}
