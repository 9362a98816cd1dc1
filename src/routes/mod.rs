//! HTTP routes for Wilbe

pub mod admin_users;
pub mod auth_routes;
pub mod content;
pub mod discussion;
pub mod health;
pub mod helpers;
pub mod merch;
pub mod notifications;
pub mod sprint;
pub mod upload;
pub mod waitlist;

pub use admin_users::handle_admin_members_request;
pub use auth_routes::handle_auth_request;
pub use content::handle_content_request;
pub use discussion::handle_discussion_request;
pub use health::{health_check, readiness_check, version_info};
pub use merch::handle_merch_request;
pub use notifications::handle_notifications_request;
pub use sprint::handle_sprint_request;
pub use upload::handle_upload_request;
pub use waitlist::handle_waitlist_request;
