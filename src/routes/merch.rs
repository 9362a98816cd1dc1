//! HTTP routes for merch orders
//!
//! - POST /api/merch/orders - Place an order (member)
//! - GET  /api/merch/orders - The member's own orders
//!
//! Order placement fires the confirmation email, a team email, and a
//! Slack ping. The order row is committed first; notification failures
//! are reported in the response but never roll the order back.

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::Role;
use crate::db::schemas::{MerchOrderDoc, Metadata, MERCH_ORDER_COLLECTION};
use crate::notify::{merch_confirmation_email, merch_slack_text, merch_team_email};
use crate::routes::helpers::{
    authenticate_with_role, error_response, get_auth_header, internal_error, json_response,
    parse_json_body, require_mongo, BoxBody,
};
use crate::server::AppState;

const MERCH_ITEMS: &[&str] = &["lab-hoodie", "founder-tee", "wilbe-mug", "field-notebook"];
const MERCH_SIZES: &[&str] = &["XS", "S", "M", "L", "XL", "XXL", "one-size"];

#[derive(Debug, Deserialize)]
struct CreateOrderRequest {
    name: String,
    email: String,
    item: String,
    size: String,
    address: String,
}

#[derive(Debug, Serialize)]
struct OrderResponse {
    order_id: String,
    status: String,
    confirmation_sent: bool,
}

/// Dispatch /api/merch/* requests
pub async fn handle_merch_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::POST, "/api/merch/orders") => Some(handle_create_order(req, state).await),
        (Method::GET, "/api/merch/orders") => Some(handle_list_orders(req, state).await),
        _ => None,
    }
}

/// POST /api/merch/orders
async fn handle_create_order(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Member) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: CreateOrderRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "BAD_REQUEST",
            )
        }
    };

    if body.name.trim().is_empty() || body.address.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Name and shipping address are required",
            "MISSING_FIELDS",
        );
    }
    if !body.email.contains('@') {
        return error_response(
            StatusCode::BAD_REQUEST,
            "A valid email is required",
            "INVALID_EMAIL",
        );
    }
    if !MERCH_ITEMS.contains(&body.item.as_str()) {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Unknown item: {}", body.item),
            "UNKNOWN_ITEM",
        );
    }
    if !MERCH_SIZES.contains(&body.size.as_str()) {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Unknown size: {}", body.size),
            "UNKNOWN_SIZE",
        );
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let orders = match mongo.collection::<MerchOrderDoc>(MERCH_ORDER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let order = MerchOrderDoc {
        _id: None,
        metadata: Metadata::new(),
        order_id: uuid::Uuid::new_v4().to_string(),
        member_id: claims.sub.clone(),
        name: body.name.trim().to_string(),
        email: body.email.trim().to_lowercase(),
        item: body.item.clone(),
        size: body.size.clone(),
        address: body.address.trim().to_string(),
        status: "received".to_string(),
    };

    if let Err(e) = orders.insert_one(order.clone()).await {
        return internal_error(&e);
    }
    info!(order_id = %order.order_id, member = %claims.sub, item = %order.item, "Merch order placed");

    let confirmation_sent = send_order_notifications(&state, &order).await;

    json_response(
        StatusCode::CREATED,
        &OrderResponse {
            order_id: order.order_id,
            status: order.status,
            confirmation_sent,
        },
    )
}

/// Fire the three order notifications. Returns whether the customer
/// confirmation went out.
pub async fn send_order_notifications(state: &Arc<AppState>, order: &MerchOrderDoc) -> bool {
    let (subject, html) = merch_confirmation_email(order);
    let confirmation_sent = match state.email.send(&order.email, &subject, &html).await {
        Ok(()) => true,
        Err(e) => {
            warn!(order_id = %order.order_id, "Failed to send order confirmation: {}", e);
            false
        }
    };

    let (team_subject, team_html) = merch_team_email(order);
    if let Err(e) = state
        .email
        .send(&state.args.team_notify_email, &team_subject, &team_html)
        .await
    {
        warn!(order_id = %order.order_id, "Failed to send team order email: {}", e);
    }

    if let Err(e) = state.slack.post(&merch_slack_text(order)).await {
        warn!(order_id = %order.order_id, "Failed to post order to Slack: {}", e);
    }

    confirmation_sent
}

/// GET /api/merch/orders
async fn handle_list_orders(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match authenticate_with_role(auth_header.as_deref(), &state, Role::Member) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let orders = match mongo.collection::<MerchOrderDoc>(MERCH_ORDER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let options = FindOptions::builder()
        .sort(doc! { "metadata.created_at": -1 })
        .build();
    match orders
        .find_many_with(doc! { "member_id": &claims.sub }, Some(options))
        .await
    {
        Ok(list) => json_response(StatusCode::OK, &list),
        Err(e) => internal_error(&e),
    }
}
