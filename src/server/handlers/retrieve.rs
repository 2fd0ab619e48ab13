//! Artifact retrieval handler.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

use super::super::AppState;
use crate::services::Resolution;

/// Stream the canonical file behind `/{archive}/{id}`.
pub async fn retrieve(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();

    match state.resolver.resolve(path).await {
        Ok(Resolution::Found(found)) => {
            debug!(%path, file_id = %found.file_id, "Serving stored file");
            let body = Body::from_stream(ReaderStream::new(found.file));
            let mut response = (
                [(header::CONTENT_TYPE, "application/octet-stream")],
                body,
            )
                .into_response();
            if let Some(len) = found.len {
                response
                    .headers_mut()
                    .insert(header::CONTENT_LENGTH, len.into());
            }
            response
        }
        Ok(Resolution::NoContent { file_id, path: file_path }) => {
            warn!(%path, %file_id, file = %file_path.display(), "Metadata points at a missing file");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(Resolution::NotFound(miss)) => {
            debug!(%path, ?miss, "Lookup miss");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
        Err(e) => {
            error!(%path, "Metadata lookup failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
