//! Selects the capture agent for a URL and runs it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::agent::CaptureError;
use super::registry::AgentRegistry;

/// A file written by a capture agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub agent: String,
    pub path: PathBuf,
}

/// Runs the first matching capture agent against `storage_dir/id`.
#[derive(Debug, Clone)]
pub struct CaptureDispatcher {
    registry: Arc<AgentRegistry>,
    timeout: Option<Duration>,
}

impl CaptureDispatcher {
    pub fn new(registry: Arc<AgentRegistry>, timeout: Option<Duration>) -> Self {
        Self { registry, timeout }
    }

    /// Capture `url` into `storage_dir/id`.
    ///
    /// Returns `Ok(None)` when no agent matches the URL; nothing is written in
    /// that case. Waits for the agent to finish, or for the timeout if one is
    /// configured, in which case the agent process is killed.
    pub async fn dispatch(
        &self,
        url: &str,
        storage_dir: &Path,
        id: &str,
    ) -> Result<Option<Captured>, CaptureError> {
        let Some(binding) = self.registry.select(url) else {
            return Ok(None);
        };

        let destination = storage_dir.join(id);
        debug!(agent = binding.name(), %url, path = %destination.display(), "Running capture agent");

        let capture = binding.agent().capture(url, &destination);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, capture).await.map_err(|_| {
                CaptureError::TimedOut {
                    agent: binding.name().to_string(),
                    timeout: limit,
                }
            })??,
            None => capture.await?,
        }

        Ok(Some(Captured {
            agent: binding.name().to_string(),
            path: destination,
        }))
    }
}
