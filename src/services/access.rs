//! HTTP Basic credential checks for archive submissions.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::models::{Archive, ArchiveSet};

/// Realm advertised in `WWW-Authenticate` challenges.
pub const REALM: &str = "Restricted";

/// Split a Basic `Authorization` header value into username and password.
///
/// The value must be exactly two space-separated tokens; the scheme token is
/// not inspected. The payload is standard base64 of `username:password`,
/// split on the first colon so passwords may contain colons.
pub fn parse_basic(header: &str) -> Option<(String, String)> {
    let mut tokens = header.split(' ');
    let (_scheme, payload) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(scheme), Some(payload), None) => (scheme, payload),
        _ => return None,
    };

    let decoded = STANDARD.decode(payload).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (username, password) = text.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Resolves the target archive of a submission and checks its credentials.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    archives: Arc<ArchiveSet>,
}

impl AccessGuard {
    pub fn new(archives: Arc<ArchiveSet>) -> Self {
        Self { archives }
    }

    /// Return the archive if `header` carries credentials it accepts.
    ///
    /// Unknown archives, missing or malformed headers, and wrong credentials
    /// all yield `None` so callers cannot tell them apart.
    pub fn authorize(&self, archive: &str, header: Option<&str>) -> Option<&Archive> {
        let archive = self.archives.get(archive)?;
        let (username, password) = parse_basic(header?)?;
        archive
            .accepts(&username, &password)
            .then_some(archive)
    }
}
