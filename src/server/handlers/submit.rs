//! URL submission handler.

use std::borrow::Cow;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::info;

use super::super::AppState;
use crate::services::access::REALM;
use crate::services::resolver::decode_segment;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Queue a capture of the submitted `url` and return the new item id.
///
/// The archive is the first path segment. Authorization is checked before
/// the body is looked at.
pub async fn submit(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let archive_name = archive_segment(uri.path());
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(archive) = state.guard.authorize(&archive_name, authorization) else {
        return unauthorized();
    };

    let Some(url) = submitted_url(&headers, &body) else {
        return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
    };

    let submission = state.engine.submit(archive, &url);
    info!(archive = %archive.name, id = %submission.id, %url, "Accepted submission");

    (StatusCode::OK, format!("{}\n", submission.id)).into_response()
}

/// First path segment, percent-decoded. Undecodable segments name no archive.
fn archive_segment(path: &str) -> Cow<'_, str> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    let first = rest.split('/').next().unwrap_or("");
    decode_segment(first).unwrap_or(Cow::Borrowed(""))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(
            header::WWW_AUTHENTICATE,
            format!("Basic realm=\"{}\"", REALM),
        )],
        "Unauthorized",
    )
        .into_response()
}

/// Extract a non-blank `url` field from a form-encoded body.
fn submitted_url(headers: &HeaderMap, body: &[u8]) -> Option<String> {
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        let essence = content_type
            .to_str()
            .ok()?
            .split(';')
            .next()
            .unwrap_or("")
            .trim();
        if !essence.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
            return None;
        }
    }

    std::str::from_utf8(body).ok()?;
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.trim().is_empty())
}
