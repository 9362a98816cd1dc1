//! Member directory and knowledge-center routes
//!
//! - GET    /api/members            - Member directory (member)
//! - GET    /api/videos             - Video catalog, grouped by category (member)
//! - POST   /api/admin/videos       - Add a catalog entry (admin)
//! - DELETE /api/admin/videos/{id}  - Remove a catalog entry (admin)

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::{AdminOperation, Role};
use crate::db::schemas::{
    MemberDoc, Metadata, VideoDoc, MEMBER_COLLECTION, VIDEO_COLLECTION,
};
use crate::routes::helpers::{
    authenticate_with_role, error_response, get_auth_header, internal_error, json_response,
    parse_json_body, require_mongo, require_operation, BoxBody, SuccessResponse,
};
use crate::server::AppState;

/// Directory row: public-facing member fields only
#[derive(Debug, Serialize)]
struct DirectoryEntry {
    member_id: String,
    display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateVideoRequest {
    title: String,
    #[serde(default)]
    description: Option<String>,
    url: String,
    category: String,
    #[serde(default)]
    order: i32,
}

/// Dispatch directory and video routes
pub async fn handle_content_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::GET, "/api/members") => Some(handle_directory(req, state).await),
        (Method::GET, "/api/videos") => Some(handle_list_videos(req, state).await),
        (Method::POST, "/api/admin/videos") => Some(handle_create_video(req, state).await),
        (Method::DELETE, p) => {
            let video_id = p.strip_prefix("/api/admin/videos/")?;
            if video_id.is_empty() || video_id.contains('/') {
                return None;
            }
            Some(handle_delete_video(req, state, video_id).await)
        }
        _ => None,
    }
}

/// GET /api/members
async fn handle_directory(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    if let Err(resp) = authenticate_with_role(auth_header.as_deref(), &state, Role::Member) {
        return resp;
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let members = match mongo.collection::<MemberDoc>(MEMBER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let options = FindOptions::builder()
        .sort(doc! { "display_name": 1 })
        .build();
    match members
        .find_many_with(doc! { "is_active": true }, Some(options))
        .await
    {
        Ok(list) => {
            let entries: Vec<DirectoryEntry> = list
                .into_iter()
                .map(|m| DirectoryEntry {
                    member_id: m.member_id,
                    display_name: m.display_name,
                    bio: m.bio,
                    field: m.field,
                })
                .collect();
            json_response(StatusCode::OK, &entries)
        }
        Err(e) => internal_error(&e),
    }
}

/// GET /api/videos
async fn handle_list_videos(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    if let Err(resp) = authenticate_with_role(auth_header.as_deref(), &state, Role::Member) {
        return resp;
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let videos = match mongo.collection::<VideoDoc>(VIDEO_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let options = FindOptions::builder()
        .sort(doc! { "category": 1, "order": 1 })
        .build();
    match videos.find_many_with(doc! {}, Some(options)).await {
        Ok(list) => json_response(StatusCode::OK, &list),
        Err(e) => internal_error(&e),
    }
}

/// POST /api/admin/videos
async fn handle_create_video(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Admin) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Some(resp) = require_operation(claims.role, AdminOperation::CreateVideo) {
        return resp;
    }

    let body: CreateVideoRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "BAD_REQUEST",
            )
        }
    };

    if body.title.trim().is_empty() || body.url.trim().is_empty() || body.category.trim().is_empty()
    {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Title, url, and category are required",
            "MISSING_FIELDS",
        );
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let videos = match mongo.collection::<VideoDoc>(VIDEO_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let video = VideoDoc {
        _id: None,
        metadata: Metadata::new(),
        video_id: uuid::Uuid::new_v4().to_string(),
        title: body.title.trim().to_string(),
        description: body.description.clone(),
        url: body.url.trim().to_string(),
        category: body.category.trim().to_lowercase(),
        order: body.order,
    };

    if let Err(e) = videos.insert_one(video.clone()).await {
        return internal_error(&e);
    }

    info!(video_id = %video.video_id, admin = %claims.sub, "Video added to catalog");
    json_response(StatusCode::CREATED, &video)
}

/// DELETE /api/admin/videos/{id}
async fn handle_delete_video(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    video_id: &str,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Admin) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Some(resp) = require_operation(claims.role, AdminOperation::DeleteVideo) {
        return resp;
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let videos = match mongo.collection::<VideoDoc>(VIDEO_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    match videos.soft_delete(doc! { "video_id": video_id }).await {
        Ok(result) if result.matched_count > 0 => {
            info!(video_id = %video_id, admin = %claims.sub, "Video removed from catalog");
            json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    message: "Video removed".into(),
                },
            )
        }
        Ok(_) => error_response(StatusCode::NOT_FOUND, "Video not found", "VIDEO_NOT_FOUND"),
        Err(e) => internal_error(&e),
    }
}
