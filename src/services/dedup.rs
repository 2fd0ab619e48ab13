//! Content fingerprinting and canonical file resolution.
//!
//! Fingerprints are 128-bit MD5 digests, hex-encoded. Two captures with the
//! same fingerprint in the same archive are treated as byte-identical; no
//! further comparison is made.

use std::io::ErrorKind;
use std::path::Path;

use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::repository::{DbError, ItemRepository};

/// Length of a hex-encoded fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = 32;

const READ_CHUNK: usize = 64 * 1024;

/// Fingerprint in-memory content.
pub fn fingerprint_bytes(content: &[u8]) -> String {
    hex::encode(md5::compute(content).0)
}

/// Fingerprint a file without loading it into memory.
pub async fn fingerprint_file(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut context = md5::Context::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        context.consume(&buf[..n]);
    }

    Ok(hex::encode(context.compute().0))
}

/// Remove a file that no metadata row points at. Missing files are fine.
pub(crate) async fn discard_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed unreferenced capture"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove capture: {}", e),
    }
}

/// Outcome of fingerprinting a fresh capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalFile {
    pub fingerprint: String,
    /// File id the new row should point at.
    pub file_id: String,
}

/// Errors while resolving a capture.
#[derive(Debug, thiserror::Error)]
pub enum DedupError {
    #[error("failed to fingerprint {path}: {source}")]
    Fingerprint {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("fingerprint lookup failed: {0}")]
    Lookup(#[from] DbError),
}

/// Maps freshly captured files onto canonical stored files.
#[derive(Clone)]
pub struct Deduplicator {
    items: ItemRepository,
}

impl Deduplicator {
    pub fn new(items: ItemRepository) -> Self {
        Self { items }
    }

    /// Fingerprint the file captured for `id` and pick its canonical file id.
    ///
    /// An existing visible row with the same fingerprint supplies the file id;
    /// otherwise `id` itself becomes the owner of the bytes.
    pub async fn resolve(
        &self,
        path: &Path,
        archive: &str,
        id: &str,
    ) -> Result<CanonicalFile, DedupError> {
        let fingerprint =
            fingerprint_file(path)
                .await
                .map_err(|source| DedupError::Fingerprint {
                    path: path.display().to_string(),
                    source,
                })?;

        let file_id = self
            .items
            .lookup_by_fingerprint(archive, &fingerprint)
            .await?
            .unwrap_or_else(|| id.to_string());

        Ok(CanonicalFile {
            fingerprint,
            file_id,
        })
    }

    /// Drop the captured copy once its row points at another canonical file.
    pub async fn settle(&self, path: &Path, id: &str, canonical: &str) {
        if canonical != id {
            discard_file(path).await;
        }
    }
}
