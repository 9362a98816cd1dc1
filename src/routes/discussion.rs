//! HTTP routes for the discussion forum
//!
//! - GET    /api/threads                 - List threads, newest first
//! - POST   /api/threads                 - Create a thread
//! - GET    /api/threads/{id}            - One thread with its comments
//! - POST   /api/threads/{id}/comments   - Comment on a thread
//! - DELETE /api/threads/{id}            - Remove a thread (admin)

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::{AdminOperation, Role};
use crate::db::schemas::{
    CommentDoc, MemberDoc, Metadata, TaskKey, ThreadDoc, COMMENT_COLLECTION, MEMBER_COLLECTION,
    THREAD_COLLECTION,
};
use crate::routes::helpers::{
    authenticate_with_role, error_response, get_auth_header, internal_error, json_response,
    parse_json_body, require_mongo, require_operation, BoxBody, SuccessResponse,
};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
struct CreateThreadRequest {
    title: String,
    content: String,
    #[serde(default)]
    challenge_task: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateCommentRequest {
    content: String,
}

#[derive(Debug, Serialize)]
struct ThreadWithComments {
    #[serde(flatten)]
    thread: ThreadDoc,
    comments: Vec<CommentDoc>,
}

/// Dispatch /api/threads* requests
pub async fn handle_discussion_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::GET, "/api/threads") => Some(handle_list_threads(req, state).await),
        (Method::POST, "/api/threads") => Some(handle_create_thread(req, state).await),
        (Method::POST, p) => {
            let thread_id = p
                .strip_prefix("/api/threads/")
                .and_then(|rest| rest.strip_suffix("/comments"))?
                .to_string();
            Some(handle_create_comment(req, state, &thread_id).await)
        }
        (Method::GET, p) => {
            let thread_id = p.strip_prefix("/api/threads/")?;
            if thread_id.is_empty() || thread_id.contains('/') {
                return None;
            }
            Some(handle_get_thread(req, state, thread_id).await)
        }
        (Method::DELETE, p) => {
            let thread_id = p.strip_prefix("/api/threads/")?;
            if thread_id.is_empty() || thread_id.contains('/') {
                return None;
            }
            Some(handle_delete_thread(req, state, thread_id).await)
        }
        _ => None,
    }
}

/// GET /api/threads
async fn handle_list_threads(
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
    let threads = match mongo.collection::<ThreadDoc>(THREAD_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let options = FindOptions::builder()
        .sort(doc! { "metadata.created_at": -1 })
        .limit(100)
        .build();
    match threads.find_many_with(doc! {}, Some(options)).await {
        Ok(list) => json_response(StatusCode::OK, &list),
        Err(e) => internal_error(&e),
    }
}

/// POST /api/threads
async fn handle_create_thread(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Member) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: CreateThreadRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "BAD_REQUEST",
            )
        }
    };

    if body.title.trim().is_empty() || body.content.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Title and content are required",
            "MISSING_FIELDS",
        );
    }

    // A challenge link must name a real catalog task
    if let Some(task) = &body.challenge_task {
        if TaskKey::parse(task).is_none() {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Unknown challenge task: {}", task),
                "UNKNOWN_TASK",
            );
        }
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let author_name = match lookup_display_name(&state, &claims.sub).await {
        Ok(name) => name,
        Err(resp) => return resp,
    };

    let threads = match mongo.collection::<ThreadDoc>(THREAD_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let thread = ThreadDoc {
        _id: None,
        metadata: Metadata::new(),
        thread_id: uuid::Uuid::new_v4().to_string(),
        author_id: claims.sub.clone(),
        author_name,
        challenge_task: body.challenge_task.clone(),
        title: body.title.trim().to_string(),
        content: body.content.trim().to_string(),
    };

    if let Err(e) = threads.insert_one(thread.clone()).await {
        return internal_error(&e);
    }

    info!(thread_id = %thread.thread_id, author = %claims.sub, "Thread created");
    json_response(StatusCode::CREATED, &thread)
}

/// GET /api/threads/{id}
async fn handle_get_thread(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    thread_id: &str,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    if let Err(resp) = authenticate_with_role(auth_header.as_deref(), &state, Role::Member) {
        return resp;
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let threads = match mongo.collection::<ThreadDoc>(THREAD_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let thread = match threads.find_one(doc! { "thread_id": thread_id }).await {
        Ok(Some(t)) => t,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Thread not found", "THREAD_NOT_FOUND")
        }
        Err(e) => return internal_error(&e),
    };

    let comments_collection = match mongo.collection::<CommentDoc>(COMMENT_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let options = FindOptions::builder()
        .sort(doc! { "metadata.created_at": 1 })
        .build();
    let comments = match comments_collection
        .find_many_with(doc! { "thread_id": thread_id }, Some(options))
        .await
    {
        Ok(list) => list,
        Err(e) => return internal_error(&e),
    };

    json_response(StatusCode::OK, &ThreadWithComments { thread, comments })
}

/// POST /api/threads/{id}/comments
async fn handle_create_comment(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    thread_id: &str,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Member) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: CreateCommentRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "BAD_REQUEST",
            )
        }
    };

    if body.content.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Comment content is required",
            "MISSING_FIELDS",
        );
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let threads = match mongo.collection::<ThreadDoc>(THREAD_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };
    match threads.find_one(doc! { "thread_id": thread_id }).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Thread not found", "THREAD_NOT_FOUND")
        }
        Err(e) => return internal_error(&e),
    }

    let author_name = match lookup_display_name(&state, &claims.sub).await {
        Ok(name) => name,
        Err(resp) => return resp,
    };

    let comments = match mongo.collection::<CommentDoc>(COMMENT_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let comment = CommentDoc {
        _id: None,
        metadata: Metadata::new(),
        thread_id: thread_id.to_string(),
        author_id: claims.sub.clone(),
        author_name,
        content: body.content.trim().to_string(),
    };

    if let Err(e) = comments.insert_one(comment.clone()).await {
        return internal_error(&e);
    }

    json_response(StatusCode::CREATED, &comment)
}

/// DELETE /api/threads/{id}
///
/// Soft delete; comments stay in place but become unreachable through
/// the thread view.
async fn handle_delete_thread(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    thread_id: &str,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Admin) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Some(resp) = require_operation(claims.role, AdminOperation::DeleteThread) {
        return resp;
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let threads = match mongo.collection::<ThreadDoc>(THREAD_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    match threads.soft_delete(doc! { "thread_id": thread_id }).await {
        Ok(result) if result.matched_count > 0 => {
            info!(thread_id = %thread_id, admin = %claims.sub, "Thread removed");
            json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    message: "Thread removed".into(),
                },
            )
        }
        Ok(_) => error_response(StatusCode::NOT_FOUND, "Thread not found", "THREAD_NOT_FOUND"),
        Err(e) => internal_error(&e),
    }
}

async fn lookup_display_name(
    state: &Arc<AppState>,
    member_id: &str,
) -> Result<String, Response<BoxBody>> {
    let mongo = require_mongo(state)?;
    let members = mongo
        .collection::<MemberDoc>(MEMBER_COLLECTION)
        .await
        .map_err(|e| internal_error(&e))?;

    let member = members
        .find_one(doc! { "member_id": member_id })
        .await
        .map_err(|e| internal_error(&e))?
        .ok_or_else(|| {
            error_response(
                StatusCode::UNAUTHORIZED,
                "Member account not found",
                "MEMBER_NOT_FOUND",
            )
        })?;

    Ok(member.display_name)
}
