//! Capture agent capability and the external-process implementation.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Why a capture did not produce a file.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to start capture agent {agent}: {source}")]
    Spawn {
        agent: String,
        #[source]
        source: std::io::Error,
    },
    #[error("capture agent {agent} exited with {status}: {stderr}")]
    Failed {
        agent: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("capture agent {agent} timed out after {}s", timeout.as_secs())]
    TimedOut { agent: String, timeout: Duration },
}

/// Something that can fetch a URL into a file.
///
/// Success means the destination file has been written completely.
#[async_trait]
pub trait CaptureAgent: Send + Sync {
    /// Agent name used in logs and errors.
    fn name(&self) -> &str;

    /// External program the agent runs, if it runs one.
    fn target(&self) -> Option<&Path> {
        None
    }

    async fn capture(&self, url: &str, destination: &Path) -> Result<(), CaptureError>;
}

/// Capture agent backed by an external program.
///
/// The program is invoked with exactly two arguments, the URL and the
/// destination path, and must exit with status zero once the destination
/// is written.
#[derive(Debug, Clone)]
pub struct ScriptAgent {
    name: String,
    program: PathBuf,
}

impl ScriptAgent {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
        }
    }
}

#[async_trait]
impl CaptureAgent for ScriptAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Option<&Path> {
        Some(&self.program)
    }

    async fn capture(&self, url: &str, destination: &Path) -> Result<(), CaptureError> {
        let output = Command::new(&self.program)
            .arg(url)
            .arg(destination)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| CaptureError::Spawn {
                agent: self.name.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CaptureError::Failed {
                agent: self.name.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(agent = %self.name, "agent output: {}", stdout.trim());
        }

        Ok(())
    }
}
