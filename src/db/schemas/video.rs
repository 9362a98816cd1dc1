//! Knowledge-center video document schema
//!
//! Catalog entries managed by admins and listed to members.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for knowledge-center videos
pub const VIDEO_COLLECTION: &str = "videos";

/// Video catalog entry stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct VideoDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Stable video ID used in URLs
    pub video_id: String,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Hosted video URL (external player)
    pub url: String,

    /// Catalog category (e.g. "fundraising", "ip")
    pub category: String,

    /// Fixed display ordering within a category
    #[serde(default)]
    pub order: i32,
}

impl IntoIndexes for VideoDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "video_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("video_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "category": 1, "order": 1 },
                Some(
                    IndexOptions::builder()
                        .name("video_category_order".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for VideoDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
