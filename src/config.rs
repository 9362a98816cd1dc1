//! Configuration for the wilbe server
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Wilbe - membership platform backend for the scientist-founder community
#[derive(Parser, Debug, Clone)]
#[command(name = "wilbe")]
#[command(about = "Membership, sprint onboarding, and waitlist backend for Wilbe")]
pub struct Args {
    /// Unique node identifier for this server instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (relaxed auth secrets, optional external services)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "wilbe")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "86400")]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Transactional email API endpoint
    #[arg(long, env = "EMAIL_API_URL", default_value = "https://api.resend.com/emails")]
    pub email_api_url: String,

    /// Transactional email API key (email delivery disabled when absent)
    #[arg(long, env = "EMAIL_API_KEY")]
    pub email_api_key: Option<String>,

    /// From address for outbound email
    #[arg(long, env = "EMAIL_FROM", default_value = "Wilbe <hello@wilbe.com>")]
    pub email_from: String,

    /// Recipient for internal order/waitlist notifications
    #[arg(long, env = "TEAM_NOTIFY_EMAIL", default_value = "team@wilbe.com")]
    pub team_notify_email: String,

    /// Slack incoming-webhook URL (Slack pings disabled when absent)
    #[arg(long, env = "SLACK_WEBHOOK_URL")]
    pub slack_webhook_url: Option<String>,

    /// Document-storage API endpoint for member file uploads
    #[arg(long, env = "DRIVE_API_URL", default_value = "https://www.googleapis.com/upload/drive/v3/files")]
    pub drive_api_url: String,

    /// Document-storage API bearer token (uploads disabled when absent)
    #[arg(long, env = "DRIVE_API_KEY")]
    pub drive_api_key: Option<String>,

    /// Document-storage folder to place uploads in
    #[arg(long, env = "DRIVE_FOLDER_ID")]
    pub drive_folder_id: Option<String>,

    /// Public base URL of the web app (used to build referral share links)
    #[arg(long, env = "APP_BASE_URL", default_value = "https://wilbe.com")]
    pub app_base_url: String,

    /// Maximum accepted upload size in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value = "10485760")]
    pub max_upload_bytes: usize,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> String {
        if self.dev_mode {
            self.jwt_secret
                .clone()
                .unwrap_or_else(|| "dev-only-insecure-secret".to_string())
        } else {
            // validate() rejects production configs without a secret; an
            // empty string here is refused again by the JWT validator.
            self.jwt_secret.clone().unwrap_or_default()
        }
    }

    /// Build the public share link for a waitlist referral code
    pub fn referral_link(&self, code: &str) -> String {
        format!(
            "{}/waitlist?ref={}",
            self.app_base_url.trim_end_matches('/'),
            code
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.jwt_secret.is_none() {
                return Err("JWT_SECRET is required in production mode".to_string());
            }
            if self.email_api_key.is_none() {
                return Err("EMAIL_API_KEY is required in production mode".to_string());
            }
        }

        if self.max_upload_bytes == 0 {
            return Err("MAX_UPLOAD_BYTES must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_args() -> Args {
        Args::parse_from(["wilbe", "--dev-mode"])
    }

    #[test]
    fn test_dev_mode_defaults() {
        let args = dev_args();
        assert!(args.validate().is_ok());
        assert_eq!(args.jwt_secret(), "dev-only-insecure-secret");
    }

    #[test]
    fn test_production_requires_secrets() {
        let args = Args::parse_from(["wilbe"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_referral_link_trims_trailing_slash() {
        let mut args = dev_args();
        args.app_base_url = "https://wilbe.com/".to_string();
        assert_eq!(
            args.referral_link("AB12CD34"),
            "https://wilbe.com/waitlist?ref=AB12CD34"
        );
    }
}
