//! Admin re-send endpoints for outbound notifications
//!
//! - POST /api/send-merch-confirmation   - Re-fire notifications for an order
//! - POST /api/send-waitlist-notification - Re-send the team waitlist email
//!
//! Used by the ops console when a delivery bounced or the provider was
//! down at write time.

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::Role;
use crate::db::schemas::{MerchOrderDoc, MERCH_ORDER_COLLECTION};
use crate::notify::{waitlist_slack_text, waitlist_team_email};
use crate::routes::helpers::{
    authenticate_with_role, error_response, get_auth_header, internal_error, json_response,
    parse_json_body, require_mongo, BoxBody,
};
use crate::routes::merch::send_order_notifications;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
struct ResendOrderRequest {
    order_id: String,
}

/// Delivery acknowledgement: {"status": "sent"}
#[derive(Debug, Serialize)]
struct SendResponse {
    status: &'static str,
}

#[derive(Debug, Deserialize)]
struct ResendWaitlistRequest {
    name: String,
    email: String,
    #[serde(default)]
    referred_by: Option<String>,
}

/// Dispatch the notification re-send endpoints
pub async fn handle_notifications_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::POST, "/api/send-merch-confirmation") => {
            Some(handle_resend_order(req, state).await)
        }
        (Method::POST, "/api/send-waitlist-notification") => {
            Some(handle_resend_waitlist(req, state).await)
        }
        _ => None,
    }
}

/// POST /api/send-merch-confirmation
async fn handle_resend_order(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Admin) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: ResendOrderRequest = match parse_json_body(req).await {
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
    let orders = match mongo.collection::<MerchOrderDoc>(MERCH_ORDER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let order = match orders.find_one(doc! { "order_id": &body.order_id }).await {
        Ok(Some(o)) => o,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Order not found", "ORDER_NOT_FOUND")
        }
        Err(e) => return internal_error(&e),
    };

    let sent = send_order_notifications(&state, &order).await;
    info!(order_id = %order.order_id, admin = %claims.sub, sent, "Order notifications re-fired");

    if sent {
        json_response(StatusCode::OK, &SendResponse { status: "sent" })
    } else {
        error_response(
            StatusCode::BAD_GATEWAY,
            "Order found but confirmation delivery failed",
            "NOTIFY_ERROR",
        )
    }
}

/// POST /api/send-waitlist-notification
async fn handle_resend_waitlist(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    if let Err(resp) = authenticate_with_role(auth_header.as_deref(), &state, Role::Admin) {
        return resp;
    }

    let body: ResendWaitlistRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "BAD_REQUEST",
            )
        }
    };

    // The Slack ping rides along best-effort; the email result decides
    // the response.
    let text = waitlist_slack_text(&body.name, &body.email, body.referred_by.as_deref());
    if let Err(e) = state.slack.post(&text).await {
        warn!("Failed to post waitlist Slack ping: {}", e);
    }

    let (subject, html) = waitlist_team_email(&body.name, &body.email, body.referred_by.as_deref());
    match state
        .email
        .send(&state.args.team_notify_email, &subject, &html)
        .await
    {
        Ok(()) => json_response(StatusCode::OK, &SendResponse { status: "sent" }),
        Err(e) => internal_error(&e),
    }
}
