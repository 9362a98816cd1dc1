//! Shared plumbing for route handlers
//!
//! JSON response builders, CORS headers, body parsing with a size cap,
//! and the token-to-claims authentication step every protected route
//! goes through.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{extract_token_from_header, is_operation_allowed, AdminOperation, Claims, Role};
use crate::db::MongoClient;
use crate::server::AppState;
use crate::types::WilbeError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Standard JSON error body: {"error": ..., "code": ...}
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization, X-File-Name")
        .body(full_body(json))
        .unwrap()
}

pub fn error_response(status: StatusCode, error: impl Into<String>, code: &str) -> Response<BoxBody> {
    json_response(
        status,
        &ErrorResponse {
            error: error.into(),
            code: Some(code.to_string()),
        },
    )
}

pub fn not_found(path: &str) -> Response<BoxBody> {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Not found: {}", path),
        "NOT_FOUND",
    )
}

pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization, X-File-Name")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

/// JSON bodies are capped at 64KB; uploads go through collect_raw_body.
const MAX_JSON_BODY: usize = 65536;

pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, WilbeError> {
    let body = req
        .collect()
        .await
        .map_err(|e| WilbeError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > MAX_JSON_BODY {
        return Err(WilbeError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| WilbeError::Http(format!("Invalid JSON: {}", e)))
}

/// Read a raw request body up to the configured upload limit
pub async fn collect_raw_body(
    req: Request<hyper::body::Incoming>,
    max_bytes: usize,
) -> Result<Bytes, WilbeError> {
    let body = req
        .collect()
        .await
        .map_err(|e| WilbeError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > max_bytes {
        return Err(WilbeError::Http(format!(
            "Upload exceeds {} byte limit",
            max_bytes
        )));
    }
    Ok(bytes)
}

pub fn get_auth_header(req: &Request<hyper::body::Incoming>) -> Option<String> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Verify the bearer token and return its claims, or the 401 to send back
pub fn authenticate(
    auth_header: Option<&str>,
    state: &Arc<AppState>,
) -> Result<Claims, Response<BoxBody>> {
    let token = extract_token_from_header(auth_header).ok_or_else(|| {
        error_response(StatusCode::UNAUTHORIZED, "No token provided", "NO_TOKEN")
    })?;

    let result = state.jwt.verify_token(token);
    if !result.valid {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            result.error.unwrap_or_else(|| "Invalid token".into()),
            "INVALID_TOKEN",
        ));
    }

    result.claims.ok_or_else(|| {
        error_response(StatusCode::UNAUTHORIZED, "Invalid token", "INVALID_TOKEN")
    })
}

/// Authenticate and require at least the given role
pub fn authenticate_with_role(
    auth_header: Option<&str>,
    state: &Arc<AppState>,
    required: Role,
) -> Result<Claims, Response<BoxBody>> {
    let claims = authenticate(auth_header, state)?;
    if claims.role < required {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "Insufficient permissions",
            "FORBIDDEN",
        ));
    }
    Ok(claims)
}

/// Check the caller against the admin-operation table, returning the 403
/// to send back when the operation is not allowed for their role
pub fn require_operation(role: Role, op: AdminOperation) -> Option<Response<BoxBody>> {
    if is_operation_allowed(op, role) {
        None
    } else {
        Some(error_response(
            StatusCode::FORBIDDEN,
            "Insufficient permissions",
            "FORBIDDEN",
        ))
    }
}

/// Get the MongoDB client, or the 503 to send back
pub fn require_mongo(state: &Arc<AppState>) -> Result<&MongoClient, Response<BoxBody>> {
    state.mongo.as_ref().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Database not available",
            "DB_UNAVAILABLE",
        )
    })
}

/// Map an internal error onto the matching HTTP status
pub fn internal_error(e: &WilbeError) -> Response<BoxBody> {
    match e {
        WilbeError::Validation(msg) => {
            error_response(StatusCode::BAD_REQUEST, msg.clone(), "VALIDATION_ERROR")
        }
        WilbeError::Http(msg) => {
            error_response(StatusCode::BAD_REQUEST, msg.clone(), "BAD_REQUEST")
        }
        WilbeError::Auth(msg) => {
            error_response(StatusCode::UNAUTHORIZED, msg.clone(), "AUTH_ERROR")
        }
        WilbeError::Storage(msg) => {
            error_response(StatusCode::BAD_GATEWAY, msg.clone(), "STORAGE_ERROR")
        }
        WilbeError::Notify(msg) => {
            error_response(StatusCode::BAD_GATEWAY, msg.clone(), "NOTIFY_ERROR")
        }
        _ => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal error: {}", e),
            "INTERNAL_ERROR",
        ),
    }
}
