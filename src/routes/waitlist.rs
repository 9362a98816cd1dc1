//! HTTP routes for the public waitlist funnel
//!
//! - POST /api/waitlist        - Sign up (no auth)
//! - GET  /api/waitlist/{code} - Referral standing for a code (no auth)

use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;
use tracing::warn;

use crate::db::schemas::{WaitlistSignupDoc, WAITLIST_COLLECTION};
use crate::notify::{waitlist_slack_text, waitlist_team_email};
use crate::routes::helpers::{
    error_response, internal_error, json_response, parse_json_body, require_mongo, BoxBody,
};
use crate::server::AppState;
use crate::waitlist::{referral_status, register_signup, SignupRequest};

/// Dispatch /api/waitlist* requests
pub async fn handle_waitlist_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::POST, "/api/waitlist") => Some(handle_signup(req, state).await),
        (Method::GET, p) => {
            let code = p.strip_prefix("/api/waitlist/")?;
            if code.is_empty() || code.contains('/') {
                return None;
            }
            Some(handle_referral_status(state, code).await)
        }
        _ => None,
    }
}

/// POST /api/waitlist
async fn handle_signup(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: SignupRequest = match parse_json_body(req).await {
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

    let collection = match mongo
        .collection::<WaitlistSignupDoc>(WAITLIST_COLLECTION)
        .await
    {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    let outcome = match register_signup(&collection, &body, |code| state.args.referral_link(code))
        .await
    {
        Ok(o) => o,
        Err(e) => return internal_error(&e),
    };

    // Team notifications are best-effort; a delivery failure never fails
    // the signup itself.
    if !outcome.already_signed_up {
        let (subject, html) =
            waitlist_team_email(body.name.trim(), body.email.trim(), body.referred_by.as_deref());
        if let Err(e) = state
            .email
            .send(&state.args.team_notify_email, &subject, &html)
            .await
        {
            warn!("Failed to send waitlist notification: {}", e);
        }

        let text =
            waitlist_slack_text(body.name.trim(), body.email.trim(), body.referred_by.as_deref());
        if let Err(e) = state.slack.post(&text).await {
            warn!("Failed to post waitlist Slack ping: {}", e);
        }
    }

    let status = if outcome.already_signed_up {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    json_response(status, &outcome)
}

/// GET /api/waitlist/{code}
async fn handle_referral_status(state: Arc<AppState>, code: &str) -> Response<BoxBody> {
    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let collection = match mongo
        .collection::<WaitlistSignupDoc>(WAITLIST_COLLECTION)
        .await
    {
        Ok(c) => c,
        Err(e) => return internal_error(&e),
    };

    match referral_status(&collection, code, |c| state.args.referral_link(c)).await {
        Ok(Some(status)) => json_response(StatusCode::OK, &status),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "Unknown referral code",
            "CODE_NOT_FOUND",
        ),
        Err(e) => internal_error(&e),
    }
}
