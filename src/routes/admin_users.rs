//! Admin console routes for member management
//!
//! - GET    /api/admin/members              - List members
//! - PUT    /api/admin/members/{id}/role    - Change a member's role
//! - PUT    /api/admin/members/{id}/status  - Activate or deactivate
//! - DELETE /api/admin/members/{id}         - Soft-delete a member
//!
//! Role and status changes bump token_version so outstanding tokens die
//! at the next refresh.

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::{AdminOperation, Role};
use crate::db::schemas::{MemberDoc, MEMBER_COLLECTION};
use crate::routes::helpers::{
    authenticate_with_role, error_response, get_auth_header, internal_error, json_response,
    parse_json_body, require_mongo, require_operation, BoxBody, SuccessResponse,
};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
struct ChangeRoleRequest {
    role: Role,
}

#[derive(Debug, Deserialize)]
struct ChangeStatusRequest {
    is_active: bool,
}

/// Member row in admin listings (no password hash)
#[derive(Debug, Serialize)]
struct AdminMemberView {
    member_id: String,
    identifier: String,
    display_name: String,
    role: Role,
    is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl From<MemberDoc> for AdminMemberView {
    fn from(m: MemberDoc) -> Self {
        Self {
            member_id: m.member_id,
            identifier: m.identifier,
            display_name: m.display_name,
            role: m.role,
            is_active: m.is_active,
            field: m.field,
        }
    }
}

/// Dispatch /api/admin/members* requests
pub async fn handle_admin_members_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::GET, "/api/admin/members") => Some(handle_list_members(req, state).await),
        (Method::PUT, p) => {
            if let Some(id) = p
                .strip_prefix("/api/admin/members/")
                .and_then(|rest| rest.strip_suffix("/role"))
            {
                let id = id.to_string();
                return Some(handle_change_role(req, state, &id).await);
            }
            let id = p
                .strip_prefix("/api/admin/members/")
                .and_then(|rest| rest.strip_suffix("/status"))?
                .to_string();
            Some(handle_change_status(req, state, &id).await)
        }
        (Method::DELETE, p) => {
            let id = p.strip_prefix("/api/admin/members/")?;
            if id.is_empty() || id.contains('/') {
                return None;
            }
            Some(handle_delete_member(req, state, id).await)
        }
        _ => None,
    }
}

/// GET /api/admin/members
async fn handle_list_members(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Admin) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Some(resp) = require_operation(claims.role, AdminOperation::ListMembers) {
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
        .sort(doc! { "metadata.created_at": -1 })
        .build();
    match members.find_many_with(doc! {}, Some(options)).await {
        Ok(list) => {
            let views: Vec<AdminMemberView> = list.into_iter().map(Into::into).collect();
            json_response(StatusCode::OK, &views)
        }
        Err(e) => internal_error(&e),
    }
}

/// PUT /api/admin/members/{id}/role
async fn handle_change_role(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    member_id: &str,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Admin) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Some(resp) = require_operation(claims.role, AdminOperation::ChangeRole) {
        return resp;
    }

    // Admins cannot change their own role; another admin must do it.
    if claims.sub == member_id {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Cannot change your own role",
            "SELF_CHANGE",
        );
    }

    let body: ChangeRoleRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "BAD_REQUEST",
            )
        }
    };

    if body.role == Role::Public {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Members cannot be demoted to public",
            "INVALID_ROLE",
        );
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let members = match mongo.collection::<MemberDoc>(MEMBER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let role_str = body.role.to_string();
    match members
        .update_one(
            doc! { "member_id": member_id },
            doc! {
                "$set": {
                    "role": &role_str,
                    "metadata.updated_at": bson::DateTime::now(),
                },
                "$inc": { "token_version": 1 },
            },
        )
        .await
    {
        Ok(result) if result.matched_count > 0 => {
            info!(member_id = %member_id, role = %role_str, admin = %claims.sub, "Role changed");
            json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    message: format!("Role changed to {}", role_str),
                },
            )
        }
        Ok(_) => error_response(StatusCode::NOT_FOUND, "Member not found", "MEMBER_NOT_FOUND"),
        Err(e) => internal_error(&e),
    }
}

/// PUT /api/admin/members/{id}/status
async fn handle_change_status(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    member_id: &str,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Admin) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Some(resp) = require_operation(claims.role, AdminOperation::ChangeStatus) {
        return resp;
    }

    if claims.sub == member_id {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Cannot change your own status",
            "SELF_CHANGE",
        );
    }

    let body: ChangeStatusRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "BAD_REQUEST",
            )
        }
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let members = match mongo.collection::<MemberDoc>(MEMBER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    match members
        .update_one(
            doc! { "member_id": member_id },
            doc! {
                "$set": {
                    "is_active": body.is_active,
                    "metadata.updated_at": bson::DateTime::now(),
                },
                "$inc": { "token_version": 1 },
            },
        )
        .await
    {
        Ok(result) if result.matched_count > 0 => {
            info!(
                member_id = %member_id,
                is_active = body.is_active,
                admin = %claims.sub,
                "Member status changed"
            );
            json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    message: if body.is_active {
                        "Member activated".into()
                    } else {
                        "Member deactivated".into()
                    },
                },
            )
        }
        Ok(_) => error_response(StatusCode::NOT_FOUND, "Member not found", "MEMBER_NOT_FOUND"),
        Err(e) => internal_error(&e),
    }
}

/// DELETE /api/admin/members/{id}
async fn handle_delete_member(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    member_id: &str,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Admin) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Some(resp) = require_operation(claims.role, AdminOperation::DeleteMember) {
        return resp;
    }

    if claims.sub == member_id {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Cannot delete your own account",
            "SELF_CHANGE",
        );
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let members = match mongo.collection::<MemberDoc>(MEMBER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    match members.soft_delete(doc! { "member_id": member_id }).await {
        Ok(result) if result.matched_count > 0 => {
            info!(member_id = %member_id, admin = %claims.sub, "Member deleted");
            json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    message: "Member deleted".into(),
                },
            )
        }
        Ok(_) => error_response(StatusCode::NOT_FOUND, "Member not found", "MEMBER_NOT_FOUND"),
        Err(e) => internal_error(&e),
    }
}
