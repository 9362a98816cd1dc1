//! Member document schema
//!
//! Stores member credentials, display profile, and platform role.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for members
pub const MEMBER_COLLECTION: &str = "members";

/// Member document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct MemberDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Member identifier (email)
    pub identifier: String,

    /// Argon2 password hash
    pub password_hash: String,

    /// Stable member ID used in JWT claims and cross-collection references
    pub member_id: String,

    /// Display name shown in the member directory
    pub display_name: String,

    /// Short bio for the member directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    /// Research field / scientific background
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Platform role (member or admin)
    #[serde(default)]
    pub role: Role,

    /// Token version for invalidation (increment to invalidate all tokens)
    #[serde(default)]
    pub token_version: i32,

    /// Whether the member account is active
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl MemberDoc {
    /// Create a new member document
    pub fn new(
        identifier: String,
        password_hash: String,
        member_id: String,
        display_name: String,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            identifier,
            password_hash,
            member_id,
            display_name,
            bio: None,
            field: None,
            role: Role::Member,
            token_version: 1,
            is_active: true,
        }
    }
}

impl IntoIndexes for MemberDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on identifier (email)
            (
                doc! { "identifier": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("identifier_unique".to_string())
                        .build(),
                ),
            ),
            // Index on member_id for lookups from JWT claims
            (
                doc! { "member_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("member_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for MemberDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
