//! Ingestion and retrieval services.

pub mod access;
pub mod dedup;
pub mod ingest;
pub mod resolver;

pub use access::AccessGuard;
pub use dedup::{fingerprint_bytes, fingerprint_file, CanonicalFile, DedupError, Deduplicator};
pub use ingest::{IngestEngine, IngestError, IngestOutcome, Submission};
pub use resolver::{Miss, Resolution, ResolvedFile, Resolver};
