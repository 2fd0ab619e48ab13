//! Configuration loading for march.
//!
//! A single file describes the listening address, the metadata database,
//! the archives and the capture agents. JSON, TOML and YAML are accepted,
//! picked by file extension. The loaded [`Config`] is validated into an
//! immutable [`Settings`] snapshot shared by the rest of the program.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::capture::{AgentBinding, AgentRegistry, ScriptAgent};
use crate::models::{Archive, ArchiveSet};

/// Port used when the config does not name one.
pub const DEFAULT_PORT: u16 = 8080;

/// Host used when the config does not name one.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("no database configured")]
    MissingDatabase,
    #[error("invalid port: {0}")]
    InvalidPort(String),
    #[error("invalid bind address {0}")]
    InvalidBind(String),
    #[error("archive name must not be empty")]
    EmptyArchiveName,
    #[error("archive name {0:?} must not contain '/'")]
    InvalidArchiveName(String),
    #[error("duplicate archive name: {0}")]
    DuplicateArchive(String),
    #[error("archive {0} has no storage directory")]
    MissingStorage(String),
    #[error("capture agent {0} has no script")]
    MissingScript(String),
    #[error("invalid pattern for capture agent {agent}: {source}")]
    InvalidPattern {
        agent: String,
        #[source]
        source: regex::Error,
    },
}

/// Listening port, accepted as a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(u16),
    Text(String),
}

impl PortValue {
    pub fn to_port(&self) -> Result<u16, ConfigError> {
        match self {
            PortValue::Number(n) => Ok(*n),
            PortValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(s.clone())),
        }
    }
}

/// An external capture program and the URLs it handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiverConfig {
    pub name: String,
    /// Program path, or a bare name looked up on `PATH`.
    pub script: String,
    /// Unanchored pattern tested against submitted URLs.
    #[serde(alias = "pattern")]
    pub regexp: String,
}

/// Raw configuration as read from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortValue>,
    /// Host or IP to listen on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// SQLite database file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Capture agents in priority order; the first matching pattern wins.
    #[serde(default, alias = "Archivers")]
    pub archivers: Vec<ArchiverConfig>,
    #[serde(default, alias = "Archives")]
    pub archives: Vec<Archive>,
    /// Upper bound on captures running at once. 0 means unbounded.
    #[serde(default)]
    pub max_concurrent_captures: usize,
    /// Kill capture agents running longer than this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_timeout_secs: Option<u64>,
    /// Path the config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// Validated, immutable runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: SocketAddr,
    pub database_url: String,
    pub archives: Arc<ArchiveSet>,
    pub agents: Arc<AgentRegistry>,
    pub max_concurrent_captures: usize,
    pub capture_timeout: Option<Duration>,
}

impl Settings {
    /// Create every archive storage directory that does not exist yet.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for archive in self.archives.iter() {
            std::fs::create_dir_all(archive.storage_dir())?;
        }
        if let Some(parent) = Path::new(&self.database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a file.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse configuration text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| format!("invalid TOML: {}", e)),
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|e| format!("invalid YAML: {}", e))
            }
            _ => serde_json::from_str(contents).map_err(|e| format!("invalid JSON: {}", e)),
        }
    }

    /// Directory relative paths are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Expand `~` and resolve relative paths against `base_dir`.
    pub fn resolve_path(path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Validate into runtime settings.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let base_dir = self.base_dir();

        let database = self
            .database
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(ConfigError::MissingDatabase)?;
        let database_url = Self::resolve_path(database, &base_dir)
            .display()
            .to_string();

        let port = match &self.port {
            Some(port) => port.to_port()?,
            None => DEFAULT_PORT,
        };
        let host = self.bind.as_deref().unwrap_or(DEFAULT_BIND_HOST);
        let bind = parse_bind(host, port)?;

        let mut archives = Vec::with_capacity(self.archives.len());
        for mut archive in self.archives {
            if archive.name.is_empty() {
                return Err(ConfigError::EmptyArchiveName);
            }
            if archive.name.contains('/') {
                return Err(ConfigError::InvalidArchiveName(archive.name));
            }
            let storage = archive.storage.display().to_string();
            if storage.trim().is_empty() {
                return Err(ConfigError::MissingStorage(archive.name));
            }
            archive.storage = Self::resolve_path(&storage, &base_dir);
            if archive.users.is_empty() {
                warn!(archive = %archive.name, "Archive has no users; submissions will be rejected");
            }
            archives.push(archive);
        }
        let archives = ArchiveSet::from_archives(archives).map_err(ConfigError::DuplicateArchive)?;

        let mut agents = AgentRegistry::new();
        for archiver in self.archivers {
            if archiver.script.trim().is_empty() {
                return Err(ConfigError::MissingScript(archiver.name));
            }
            let pattern = Regex::new(&archiver.regexp).map_err(|source| {
                ConfigError::InvalidPattern {
                    agent: archiver.name.clone(),
                    source,
                }
            })?;
            let program = resolve_program(&archiver.script, &base_dir);
            if which::which(&program).is_err() {
                warn!(
                    agent = %archiver.name,
                    program = %program.display(),
                    "Capture agent program not found or not executable"
                );
            }
            let agent = Arc::new(ScriptAgent::new(archiver.name.clone(), program));
            agents.push(AgentBinding::new(archiver.name, pattern, agent));
        }
        if agents.is_empty() {
            warn!("No capture agents configured; submissions will never be captured");
        }

        Ok(Settings {
            bind,
            database_url,
            archives: Arc::new(archives),
            agents: Arc::new(agents),
            max_concurrent_captures: self.max_concurrent_captures,
            capture_timeout: self
                .capture_timeout_secs
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
        })
    }
}

/// Load and validate the config file at `path`.
pub async fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    Config::load_from_path(path).await?.into_settings()
}

/// Combine a host and port into a socket address.
pub fn parse_bind(host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    let host = match host.trim() {
        "" => DEFAULT_BIND_HOST,
        "localhost" => "127.0.0.1",
        h => h.trim_start_matches('[').trim_end_matches(']'),
    };
    let ip = host
        .parse()
        .map_err(|_| ConfigError::InvalidBind(host.to_string()))?;
    Ok(SocketAddr::new(ip, port))
}

/// Scripts given as paths resolve against the config directory; bare names stay
/// bare so they are looked up on `PATH` at spawn time.
fn resolve_program(script: &str, base_dir: &Path) -> PathBuf {
    if script.contains('/') || script.starts_with('~') {
        Config::resolve_path(script, base_dir)
    } else {
        PathBuf::from(script)
    }
}
