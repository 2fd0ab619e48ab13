//! Ingestion engine.
//!
//! A submission is accepted synchronously and processed in a detached task:
//! capture into the archive's storage directory, fingerprint, record the
//! item against its canonical file, then drop the capture if it duplicated
//! content already stored.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use super::dedup::{discard_file, DedupError, Deduplicator};
use crate::capture::{AgentRegistry, CaptureDispatcher, CaptureError};
use crate::models::{new_item_id, Archive, ArchiveItem};
use crate::repository::{DbError, ItemRepository};

/// Errors raised by a single ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Dedup(#[from] DedupError),
    #[error("failed to record item: {0}")]
    Store(#[from] DbError),
}

/// How an ingestion run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The capture introduced new content and its id owns the file.
    Stored(ArchiveItem),
    /// The content was already stored; the item points at the existing file.
    Deduplicated(ArchiveItem),
    /// No capture agent matched the URL. Nothing was written.
    NoAgent,
}

/// An accepted submission.
#[derive(Debug)]
pub struct Submission {
    pub id: String,
    /// Background ingestion task. Dropping the handle does not cancel it.
    pub handle: JoinHandle<()>,
}

/// Orchestrates capture, deduplication and metadata recording.
#[derive(Clone)]
pub struct IngestEngine {
    dispatcher: CaptureDispatcher,
    dedup: Deduplicator,
    items: ItemRepository,
    limit: Option<Arc<Semaphore>>,
    tasks: TaskTracker,
}

impl IngestEngine {
    /// Create an engine. `max_concurrent` of 0 leaves captures unbounded.
    pub fn new(
        agents: Arc<AgentRegistry>,
        items: ItemRepository,
        capture_timeout: Option<Duration>,
        max_concurrent: usize,
    ) -> Self {
        let limit = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));
        Self {
            dispatcher: CaptureDispatcher::new(agents, capture_timeout),
            dedup: Deduplicator::new(items.clone()),
            items,
            limit,
            tasks: TaskTracker::new(),
        }
    }

    /// Accept `url` for `archive` and start ingesting it in the background.
    ///
    /// The id is returned before any capture work starts. Failures in the
    /// background task are logged and leave no metadata row behind.
    pub fn submit(&self, archive: &Archive, url: &str) -> Submission {
        let id = new_item_id();
        let engine = self.clone();
        let archive = archive.clone();
        let url = url.to_string();
        let task_id = id.clone();

        let handle = self.tasks.spawn(async move {
            let _permit = match &engine.limit {
                Some(limit) => match limit.clone().acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };

            match engine.ingest(&archive, &url, &task_id).await {
                Ok(IngestOutcome::Stored(item)) => info!(
                    archive = %item.archive,
                    id = %item.id,
                    fingerprint = %item.fingerprint,
                    "Captured {}",
                    item.url
                ),
                Ok(IngestOutcome::Deduplicated(item)) => info!(
                    archive = %item.archive,
                    id = %item.id,
                    file_id = %item.file_id,
                    "Captured {} (duplicate content)",
                    item.url
                ),
                Ok(IngestOutcome::NoAgent) => warn!(
                    archive = %archive.name,
                    id = %task_id,
                    "No capture agent matches {}",
                    url
                ),
                Err(e) => error!(
                    archive = %archive.name,
                    id = %task_id,
                    "Failed to ingest {}: {}",
                    url,
                    e
                ),
            }
        });

        Submission { id, handle }
    }

    /// Wait until every background ingestion started so far has finished.
    pub async fn wait_idle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Run the ingestion pipeline for one id.
    ///
    /// On any failure the file written under `id` is removed, since no row
    /// can reference it.
    pub async fn ingest(
        &self,
        archive: &Archive,
        url: &str,
        id: &str,
    ) -> Result<IngestOutcome, IngestError> {
        let result = self.run(archive, url, id).await;
        if result.is_err() {
            discard_file(&archive.file_path(id)).await;
        }
        result
    }

    async fn run(
        &self,
        archive: &Archive,
        url: &str,
        id: &str,
    ) -> Result<IngestOutcome, IngestError> {
        let Some(captured) = self
            .dispatcher
            .dispatch(url, archive.storage_dir(), id)
            .await?
        else {
            return Ok(IngestOutcome::NoAgent);
        };

        let canonical = self.dedup.resolve(&captured.path, &archive.name, id).await?;

        let mut item = ArchiveItem::new(
            id,
            canonical.file_id,
            archive.name.as_str(),
            url,
            canonical.fingerprint,
        );
        // A concurrent capture may have claimed the fingerprint since the lookup.
        item.file_id = self.items.insert(&item).await?;

        self.dedup.settle(&captured.path, id, &item.file_id).await;

        if item.owns_file() {
            Ok(IngestOutcome::Stored(item))
        } else {
            Ok(IngestOutcome::Deduplicated(item))
        }
    }
}
