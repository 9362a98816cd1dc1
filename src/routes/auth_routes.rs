//! HTTP routes for authentication
//!
//! - POST /auth/register - Create a member account
//! - POST /auth/login    - Authenticate and get a JWT
//! - POST /auth/logout   - Stateless logout acknowledgement
//! - POST /auth/refresh  - Re-issue a token before expiry
//! - GET  /auth/me       - Current member info from the token

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{hash_password, validate_new_password, verify_password, Role};
use crate::db::schemas::{MemberDoc, MEMBER_COLLECTION};
use crate::routes::helpers::{
    authenticate, error_response, get_auth_header, json_response, parse_json_body, require_mongo,
    BoxBody, ErrorResponse, SuccessResponse,
};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub identifier: String,
    pub password: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub member_id: String,
    pub identifier: String,
    pub role: Role,
    pub expires_at: u64,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub member_id: String,
    pub identifier: String,
    pub display_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Dispatch /auth/* requests. Returns None for paths under /auth that
/// don't exist, so the caller can 404.
pub async fn handle_auth_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::OPTIONS, _) => Some(crate::routes::helpers::cors_preflight()),
        (Method::POST, "/auth/register") => Some(handle_register(req, state).await),
        (Method::POST, "/auth/login") => Some(handle_login(req, state).await),
        (Method::POST, "/auth/logout") => Some(handle_logout()),
        (Method::POST, "/auth/refresh") => Some(handle_refresh(req, state).await),
        (Method::GET, "/auth/me") => Some(handle_me(req, state).await),
        _ => None,
    }
}

fn auth_response(
    state: &Arc<AppState>,
    member: &MemberDoc,
    status: StatusCode,
) -> Response<BoxBody> {
    match state.jwt.generate_token(
        &member.member_id,
        &member.identifier,
        member.role,
        member.token_version,
    ) {
        Ok((token, expires_at)) => json_response(
            status,
            &AuthResponse {
                token,
                member_id: member.member_id.clone(),
                identifier: member.identifier.clone(),
                role: member.role,
                expires_at,
            },
        ),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to issue token: {}", e),
            "TOKEN_ERROR",
        ),
    }
}

async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "BAD_REQUEST",
            )
        }
    };

    let identifier = body.identifier.trim().to_lowercase();
    if identifier.is_empty() || body.password.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields: identifier, password",
            "MISSING_FIELDS",
        );
    }
    if !identifier.contains('@') {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Identifier must be an email address",
            "INVALID_IDENTIFIER",
        );
    }
    if let Err(e) = validate_new_password(&body.password) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string(), "WEAK_PASSWORD");
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let collection = match mongo.collection::<MemberDoc>(MEMBER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                "DB_ERROR",
            )
        }
    };

    match collection.find_one(doc! { "identifier": &identifier }).await {
        Ok(Some(_)) => {
            return error_response(
                StatusCode::CONFLICT,
                "An account with this email already exists",
                "MEMBER_EXISTS",
            )
        }
        Ok(None) => {}
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                "DB_ERROR",
            )
        }
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to hash password: {}", e),
                "HASH_ERROR",
            )
        }
    };

    let display_name = if body.display_name.trim().is_empty() {
        identifier
            .split('@')
            .next()
            .unwrap_or("Member")
            .to_string()
    } else {
        body.display_name.trim().to_string()
    };

    let mut member = MemberDoc::new(
        identifier.clone(),
        password_hash,
        uuid::Uuid::new_v4().to_string(),
        display_name,
    );
    member.bio = body.bio.clone();
    member.field = body.field.clone();

    if let Err(e) = collection.insert_one(member.clone()).await {
        if e.is_duplicate_key() {
            return error_response(
                StatusCode::CONFLICT,
                "An account with this email already exists",
                "MEMBER_EXISTS",
            );
        }
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to create member: {}", e),
            "DB_ERROR",
        );
    }

    info!("Registered new member: {}", identifier);
    auth_response(&state, &member, StatusCode::CREATED)
}

async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "BAD_REQUEST",
            )
        }
    };

    if body.identifier.is_empty() || body.password.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields: identifier, password",
            "MISSING_FIELDS",
        );
    }
    let identifier = body.identifier.trim().to_lowercase();

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let collection = match mongo.collection::<MemberDoc>(MEMBER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                "DB_ERROR",
            )
        }
    };

    let member = match collection
        .find_one(doc! { "identifier": &identifier, "is_active": true })
        .await
    {
        Ok(Some(m)) => m,
        Ok(None) => {
            warn!("Login failed - member not found: {}", identifier);
            // Generic error prevents account enumeration
            return error_response(
                StatusCode::UNAUTHORIZED,
                "Invalid credentials",
                "INVALID_CREDENTIALS",
            );
        }
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                "DB_ERROR",
            )
        }
    };

    let password_valid = match verify_password(&body.password, &member.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            warn!("Password verification error: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication error",
                "AUTH_ERROR",
            );
        }
    };

    if !password_valid {
        warn!("Login failed - invalid password: {}", identifier);
        return error_response(
            StatusCode::UNAUTHORIZED,
            "Invalid credentials",
            "INVALID_CREDENTIALS",
        );
    }

    info!("Login successful: {}", identifier);
    auth_response(&state, &member, StatusCode::OK)
}

fn handle_logout() -> Response<BoxBody> {
    // Tokens are stateless; clients drop the token. Force-logout bumps
    // token_version via the admin console instead.
    json_response(
        StatusCode::OK,
        &SuccessResponse {
            success: true,
            message: "Logged out successfully".into(),
        },
    )
}

async fn handle_refresh(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate(auth_header.as_deref(), &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    // Token version is re-checked against the store so a force-logout
    // cannot be outrun by refreshing.
    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let collection = match mongo.collection::<MemberDoc>(MEMBER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                "DB_ERROR",
            )
        }
    };

    let member = match collection
        .find_one(doc! { "member_id": &claims.sub, "is_active": true })
        .await
    {
        Ok(Some(m)) => m,
        Ok(None) => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "Account not found or deactivated",
                "ACCOUNT_INACTIVE",
            )
        }
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                "DB_ERROR",
            )
        }
    };

    if member.token_version != claims.token_version {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "Token has been revoked",
            "TOKEN_REVOKED",
        );
    }

    auth_response(&state, &member, StatusCode::OK)
}

async fn handle_me(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate(auth_header.as_deref(), &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let collection = match mongo.collection::<MemberDoc>(MEMBER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                "DB_ERROR",
            )
        }
    };

    match collection.find_one(doc! { "member_id": &claims.sub }).await {
        Ok(Some(member)) => json_response(
            StatusCode::OK,
            &MeResponse {
                member_id: member.member_id,
                identifier: member.identifier,
                display_name: member.display_name,
                role: member.role,
                bio: member.bio,
                field: member.field,
            },
        ),
        Ok(None) => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse {
                error: "Member not found".into(),
                code: Some("MEMBER_NOT_FOUND".into()),
            },
        ),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Database error: {}", e),
            "DB_ERROR",
        ),
    }
}
