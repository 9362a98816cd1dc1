//! Discussion forum document schemas
//!
//! Threads may optionally link to a sprint task acting as a "challenge".
//! No referential integrity beyond ad hoc existence checks at read time.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for discussion threads
pub const THREAD_COLLECTION: &str = "threads";

/// Collection name for thread comments
pub const COMMENT_COLLECTION: &str = "comments";

/// Discussion thread document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ThreadDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Stable thread ID used in URLs
    pub thread_id: String,

    /// Authoring member
    pub author_id: String,

    /// Author display name, denormalized at write time
    pub author_name: String,

    /// Optional sprint task this thread discusses as a challenge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_task: Option<String>,

    pub title: String,

    pub content: String,
}

impl IntoIndexes for ThreadDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "thread_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("thread_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "author_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("thread_author_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ThreadDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// Comment on a discussion thread
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CommentDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Thread this comment belongs to
    pub thread_id: String,

    /// Authoring member
    pub author_id: String,

    /// Author display name, denormalized at write time
    pub author_name: String,

    pub content: String,
}

impl IntoIndexes for CommentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "thread_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("comment_thread_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for CommentDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
