//! File-upload proxy route
//!
//! - POST /api/upload - Stream a raw file body to document storage
//!
//! The file goes up as the raw request body with its name in the
//! X-File-Name header, so the storage bearer token stays server-side.

use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;
use tracing::info;

use crate::auth::Role;
use crate::routes::helpers::{
    authenticate_with_role, collect_raw_body, error_response, get_auth_header, internal_error,
    json_response, BoxBody,
};
use crate::server::AppState;

/// Dispatch /api/upload requests
pub async fn handle_upload_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    if req.method() != Method::POST || req.uri().path() != "/api/upload" {
        return None;
    }
    Some(handle_upload(req, state).await)
}

async fn handle_upload(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Member) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    if !state.drive.enabled() {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "File uploads are not configured",
            "STORAGE_UNAVAILABLE",
        );
    }

    let file_name = match req
        .headers()
        .get("x-file-name")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(name) => sanitize_file_name(name),
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "X-File-Name header is required",
                "MISSING_FILE_NAME",
            )
        }
    };

    let content_type = req
        .headers()
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = match collect_raw_body(req, state.args.max_upload_bytes).await {
        Ok(b) => b,
        Err(e) => return internal_error(&e),
    };
    if data.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Empty upload body", "EMPTY_BODY");
    }

    match state.drive.upload(&file_name, &content_type, data).await {
        Ok(uploaded) => {
            info!(
                member_id = %claims.sub,
                file_id = %uploaded.file_id,
                name = %uploaded.file_name,
                "File uploaded"
            );
            json_response(StatusCode::CREATED, &uploaded)
        }
        Err(e) => internal_error(&e),
    }
}

/// Strip path separators and control characters from client file names
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && *c != '/' && *c != '\\')
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("deck.pdf"), "deck.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitize_file_name("a\\b/c.txt"), "abc.txt");
        assert_eq!(sanitize_file_name("///"), "upload");
    }
}
