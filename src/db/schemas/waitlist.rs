//! Waitlist signup document schema
//!
//! Pre-authentication funnel: signups carry a generated referral code and
//! an optional link to the referrer. The successful_referrals counter is
//! incremented by a single $inc update per successful referred signup.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for waitlist signups
pub const WAITLIST_COLLECTION: &str = "waitlist";

/// Waitlist signup document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct WaitlistSignupDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Signup name
    pub name: String,

    /// Signup email (unique)
    pub email: String,

    /// Generated short referral code (unique)
    pub referral_code: String,

    /// Referral code of the signup that referred this one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,

    /// Count of successful referred signups
    #[serde(default)]
    pub successful_referrals: i64,

    /// Acquisition source tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,

    /// Acquisition medium tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
}

impl IntoIndexes for WaitlistSignupDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Email uniqueness is enforced by the store
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("waitlist_email_unique".to_string())
                        .build(),
                ),
            ),
            // Referral codes are resolved by exact match
            (
                doc! { "referral_code": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("waitlist_code_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for WaitlistSignupDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
