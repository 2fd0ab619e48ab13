//! Maps `/{archive}/{id}` retrieval paths to stored files.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::models::{is_item_id, ArchiveSet};
use crate::repository::{DbError, ItemRepository};

/// Why a retrieval path did not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Miss {
    /// Not exactly two non-empty path segments.
    BadPath,
    UnknownArchive,
    /// Second segment is not a hyphenated UUID.
    InvalidId,
    /// No visible row for the id.
    UnknownId,
}

/// An open canonical file ready to be streamed.
#[derive(Debug)]
pub struct ResolvedFile {
    pub file_id: String,
    pub path: PathBuf,
    pub file: tokio::fs::File,
    pub len: Option<u64>,
}

/// Result of resolving a retrieval path.
#[derive(Debug)]
pub enum Resolution {
    NotFound(Miss),
    /// Metadata exists but the canonical file cannot be opened.
    NoContent { file_id: String, path: PathBuf },
    Found(ResolvedFile),
}

/// Percent-decode one path segment. Segments that do not decode to UTF-8
/// are rejected.
pub fn decode_segment(segment: &str) -> Option<Cow<'_, str>> {
    urlencoding::decode(segment).ok()
}

/// Split a request path into decoded `(archive, id)` segments.
///
/// Exactly two non-empty segments are accepted; a trailing slash counts as
/// an extra empty segment. The path is split before decoding, so `%2F` stays
/// inside its segment.
pub fn parse_path(path: &str) -> Option<(Cow<'_, str>, Cow<'_, str>)> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    let mut segments = rest.split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(archive), Some(id), None) if !archive.is_empty() && !id.is_empty() => {
            Some((decode_segment(archive)?, decode_segment(id)?))
        }
        _ => None,
    }
}

/// Resolves retrieval paths against archives and the metadata store.
#[derive(Clone)]
pub struct Resolver {
    archives: Arc<ArchiveSet>,
    items: ItemRepository,
}

impl Resolver {
    pub fn new(archives: Arc<ArchiveSet>, items: ItemRepository) -> Self {
        Self { archives, items }
    }

    /// Resolve a request path.
    ///
    /// Only metadata store failures are errors; every client-side miss is a
    /// [`Resolution::NotFound`].
    pub async fn resolve(&self, path: &str) -> Result<Resolution, DbError> {
        let Some((archive_name, id)) = parse_path(path) else {
            return Ok(Resolution::NotFound(Miss::BadPath));
        };
        let Some(archive) = self.archives.get(&archive_name) else {
            return Ok(Resolution::NotFound(Miss::UnknownArchive));
        };
        if !is_item_id(&id) {
            return Ok(Resolution::NotFound(Miss::InvalidId));
        }
        let Some(file_id) = self.items.lookup_by_id(&archive_name, &id).await? else {
            return Ok(Resolution::NotFound(Miss::UnknownId));
        };

        let path = archive.file_path(&file_id);
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                warn!(archive = %archive_name, %id, %file_id, "Cannot open stored file: {}", e);
                return Ok(Resolution::NoContent { file_id, path });
            }
        };
        let len = file.metadata().await.ok().map(|m| m.len());

        Ok(Resolution::Found(ResolvedFile {
            file_id,
            path,
            file,
            len,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{new_item_id, Archive, ArchiveItem};
    use crate::repository::DbContext;
    use tempfile::{tempdir, TempDir};
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("/news/abc"), Some(("news".into(), "abc".into())));
        assert_eq!(
            parse_path("/my%20news/abc"),
            Some(("my news".into(), "abc".into()))
        );
        assert_eq!(
            parse_path("/a%2Fb/abc"),
            Some(("a/b".into(), "abc".into()))
        );
        assert_eq!(parse_path("/%FF/abc"), None);
        assert_eq!(parse_path("/news"), None);
        assert_eq!(parse_path("/"), None);
        assert_eq!(parse_path("/news/"), None);
        assert_eq!(parse_path("//abc"), None);
        assert_eq!(parse_path("/news/abc/"), None);
        assert_eq!(parse_path("/news/abc/def"), None);
    }

    async fn setup() -> (TempDir, Resolver, DbContext, Archive) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_path(&dir.path().join("march.db"));
        ctx.init_schema().await.unwrap();
        let archive = Archive::new("news", dir.path().join("news"));
        std::fs::create_dir_all(archive.storage_dir()).unwrap();
        let archives = ArchiveSet::from_archives([archive.clone()]).unwrap();
        let resolver = Resolver::new(Arc::new(archives), ctx.items());
        (dir, resolver, ctx, archive)
    }

    #[tokio::test]
    async fn test_resolve_found_follows_canonical_file() {
        let (_dir, resolver, ctx, archive) = setup().await;
        let owner = new_item_id();
        let dup = new_item_id();
        std::fs::write(archive.file_path(&owner), b"payload").unwrap();

        let items = ctx.items();
        items
            .insert(&ArchiveItem::new(&owner, &owner, "news", "u1", "fp"))
            .await
            .unwrap();
        items
            .insert(&ArchiveItem::new(&dup, &dup, "news", "u2", "fp"))
            .await
            .unwrap();

        let Resolution::Found(mut found) = resolver.resolve(&format!("/news/{dup}")).await.unwrap()
        else {
            panic!("expected file");
        };
        assert_eq!(found.file_id, owner);
        assert_eq!(found.len, Some(7));
        let mut body = Vec::new();
        found.file.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"payload");
    }

    #[tokio::test]
    async fn test_resolve_misses() {
        let (_dir, resolver, _ctx, _archive) = setup().await;
        let id = new_item_id();

        let cases = [
            ("/news".to_string(), Miss::BadPath),
            (format!("/blogs/{id}"), Miss::UnknownArchive),
            ("/news/not-a-uuid".to_string(), Miss::InvalidId),
            (format!("/news/{}", id.replace('-', "")), Miss::InvalidId),
            (format!("/news/{id}"), Miss::UnknownId),
        ];
        for (path, miss) in cases {
            match resolver.resolve(&path).await.unwrap() {
                Resolution::NotFound(m) => assert_eq!(m, miss, "{path}"),
                other => panic!("{path}: unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_resolve_missing_file_is_no_content() {
        let (_dir, resolver, ctx, _archive) = setup().await;
        let id = new_item_id();
        ctx.items()
            .insert(&ArchiveItem::new(&id, &id, "news", "u", "fp"))
            .await
            .unwrap();

        let resolution = resolver.resolve(&format!("/news/{id}")).await.unwrap();
        assert!(matches!(resolution, Resolution::NoContent { .. }));
    }
}
