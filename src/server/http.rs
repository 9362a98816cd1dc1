//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection. Routing is a
//! method/path match that hands whole prefixes to per-module
//! dispatchers.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::MongoClient;
use crate::notify::{EmailClient, SlackNotifier};
use crate::routes;
use crate::storage::DriveClient;
use crate::types::WilbeError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub jwt: JwtValidator,
    /// None only in dev mode; every data route 503s without it
    pub mongo: Option<MongoClient>,
    pub email: EmailClient,
    pub slack: SlackNotifier,
    pub drive: DriveClient,
    pub started_at: Instant,
}

impl AppState {
    /// Build state from config. MongoDB is connected separately and
    /// attached via with_mongo so dev mode can run without it.
    pub fn new(args: Args) -> Result<Self, WilbeError> {
        let jwt = JwtValidator::new(args.jwt_secret(), args.jwt_expiry_seconds)?;
        let email = EmailClient::new(
            args.email_api_url.clone(),
            args.email_api_key.clone(),
            args.email_from.clone(),
        )?;
        let slack = SlackNotifier::new(args.slack_webhook_url.clone())?;
        let drive = DriveClient::new(
            args.drive_api_url.clone(),
            args.drive_api_key.clone(),
            args.drive_folder_id.clone(),
        )?;

        Ok(Self {
            args,
            jwt,
            mongo: None,
            email,
            slack,
            drive,
            started_at: Instant::now(),
        })
    }

    pub fn with_mongo(mut self, mongo: MongoClient) -> Self {
        self.mongo = Some(mongo);
        self
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), WilbeError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Wilbe listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - insecure defaults in use");
    }
    if !state.email.enabled() {
        warn!("Email delivery disabled (no EMAIL_API_KEY)");
    }
    if !state.slack.enabled() {
        debug!("Slack notifications disabled (no SLACK_WEBHOOK_URL)");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    // CORS preflight for any path
    if method == Method::OPTIONS {
        return Ok(routes::helpers::cors_preflight());
    }

    // Probes and version info
    match (&method, path.as_str()) {
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => {
            return Ok(to_boxed(routes::health_check(state)));
        }
        (&Method::GET, "/ready") | (&Method::GET, "/readyz") => {
            return Ok(to_boxed(routes::readiness_check(state)));
        }
        (&Method::GET, "/version") => {
            return Ok(to_boxed(routes::version_info()));
        }
        _ => {}
    }

    // Auth routes
    if path.starts_with("/auth") {
        if let Some(response) = routes::handle_auth_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(routes::helpers::not_found(&path));
    }

    // API routes, by prefix
    let response = if path.starts_with("/api/sprint") {
        routes::handle_sprint_request(req, Arc::clone(&state)).await
    } else if path.starts_with("/api/waitlist") {
        routes::handle_waitlist_request(req, Arc::clone(&state)).await
    } else if path.starts_with("/api/threads") {
        routes::handle_discussion_request(req, Arc::clone(&state)).await
    } else if path.starts_with("/api/admin/members") {
        routes::handle_admin_members_request(req, Arc::clone(&state)).await
    } else if path.starts_with("/api/merch") {
        routes::handle_merch_request(req, Arc::clone(&state)).await
    } else if path.starts_with("/api/send-") {
        routes::handle_notifications_request(req, Arc::clone(&state)).await
    } else if path == "/api/upload" {
        routes::handle_upload_request(req, Arc::clone(&state)).await
    } else if path.starts_with("/api/members")
        || path.starts_with("/api/videos")
        || path.starts_with("/api/admin/videos")
    {
        routes::handle_content_request(req, Arc::clone(&state)).await
    } else {
        None
    };

    Ok(response.unwrap_or_else(|| routes::helpers::not_found(&path)))
}

fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}
