//! Archive item model: one submission bound to a canonical stored file.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Metadata row binding a client-visible id to a canonical file.
///
/// Rows are append-only. Many ids may share one `file_id`; the id that first
/// captured a given fingerprint owns the physical bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveItem {
    pub id: String,
    pub file_id: String,
    pub archive: String,
    pub url: String,
    /// Hex-encoded 128-bit content fingerprint.
    pub fingerprint: String,
    /// Reserved soft-delete marker. Nothing sets it yet; reads skip rows where it is set.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ArchiveItem {
    pub fn new(
        id: impl Into<String>,
        file_id: impl Into<String>,
        archive: impl Into<String>,
        url: impl Into<String>,
        fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            file_id: file_id.into(),
            archive: archive.into(),
            url: url.into(),
            fingerprint: fingerprint.into(),
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this item's own id names the physical file.
    pub fn owns_file(&self) -> bool {
        self.id == self.file_id
    }
}

/// Generate a fresh item id (hyphenated lowercase UUIDv4).
pub fn new_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Check that `s` is a UUID in its 36-character hyphenated form.
pub fn is_item_id(s: &str) -> bool {
    s.len() == 36 && Uuid::try_parse(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_id_is_valid() {
        let id = new_item_id();
        assert!(is_item_id(&id));
        assert_ne!(id, new_item_id());
    }

    #[test]
    fn test_is_item_id_rejects_other_forms() {
        assert!(is_item_id("67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert!(!is_item_id("not-a-uuid"));
        assert!(!is_item_id(""));
        assert!(!is_item_id("67e5504410b1426f9247bb680e5fe0c8"));
        assert!(!is_item_id("{67e55044-10b1-426f-9247-bb680e5fe0c8}"));
    }

    #[test]
    fn test_owns_file() {
        let owner = ArchiveItem::new("a", "a", "news", "https://example.com", "ff");
        let alias = ArchiveItem::new("b", "a", "news", "https://example.com", "ff");
        assert!(owner.owns_file());
        assert!(!alias.owns_file());
        assert!(alias.deleted_at.is_none());
    }
}
