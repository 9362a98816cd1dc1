//! Sprint task and task-progress document schemas
//!
//! Tasks are generated once per member from their founder profile.
//! Progress rows are created lazily on first interaction and mutated via
//! upsert; they are never deleted.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for generated sprint tasks
pub const TASK_COLLECTION: &str = "sprint_tasks";

/// Collection name for task progress rows
pub const TASK_PROGRESS_COLLECTION: &str = "task_progress";

/// Catalog key identifying a sprint task. Every generated task row stores
/// one of these; the generator decides inclusion from the founder profile.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskKey {
    VisionStatement,
    DeckReview,
    HiringPlan,
    TtoEngagement,
    FundingDetails,
    MarketLandscape,
    PeerSession,
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKey::VisionStatement => "vision_statement",
            TaskKey::DeckReview => "deck_review",
            TaskKey::HiringPlan => "hiring_plan",
            TaskKey::TtoEngagement => "tto_engagement",
            TaskKey::FundingDetails => "funding_details",
            TaskKey::MarketLandscape => "market_landscape",
            TaskKey::PeerSession => "peer_session",
        };
        write!(f, "{}", s)
    }
}

impl TaskKey {
    /// Parse a catalog key from its wire form (path segments, stored rows)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vision_statement" => Some(TaskKey::VisionStatement),
            "deck_review" => Some(TaskKey::DeckReview),
            "hiring_plan" => Some(TaskKey::HiringPlan),
            "tto_engagement" => Some(TaskKey::TtoEngagement),
            "funding_details" => Some(TaskKey::FundingDetails),
            "market_landscape" => Some(TaskKey::MarketLandscape),
            "peer_session" => Some(TaskKey::PeerSession),
            _ => None,
        }
    }
}

/// Optional single/multi-choice question attached to a task
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ChoiceQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub multiple: bool,
}

/// Generated sprint task row (one per member per catalog entry)
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SprintTaskDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Owning member
    pub member_id: String,

    /// Catalog key (stored in wire form)
    pub task: String,

    /// Display title
    pub title: String,

    /// Display description, parameterized by profile answers
    pub description: String,

    /// Fixed ordering index from the catalog
    pub order: i32,

    /// Whether completing this task requires a file upload
    #[serde(default)]
    pub requires_upload: bool,

    /// Optional choice question payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<ChoiceQuestion>,
}

impl IntoIndexes for SprintTaskDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One row per (member, task): makes a duplicate generation
            // trigger a harmless duplicate-key error instead of doubled tasks.
            (
                doc! { "member_id": 1, "task": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("task_member_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "member_id": 1, "order": 1 },
                Some(
                    IndexOptions::builder()
                        .name("task_member_order".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for SprintTaskDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// Per-member, per-task progress row
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TaskProgressDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Owning member
    pub member_id: String,

    /// Catalog key of the task this row tracks
    pub task: String,

    /// Completion flag
    #[serde(default)]
    pub completed: bool,

    /// Free-form answer payload (text or selected choices)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<serde_json::Value>,

    /// Uploaded-file reference from the document store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,

    /// Public view link for the uploaded file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_link: Option<String>,

    /// Set when the row first transitions to completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime>,
}

impl IntoIndexes for TaskProgressDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One progress row per (member, task); upserts key on this pair
            (
                doc! { "member_id": 1, "task": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("progress_member_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for TaskProgressDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_key_round_trip() {
        for key in [
            TaskKey::VisionStatement,
            TaskKey::DeckReview,
            TaskKey::HiringPlan,
            TaskKey::TtoEngagement,
            TaskKey::FundingDetails,
            TaskKey::MarketLandscape,
            TaskKey::PeerSession,
        ] {
            assert_eq!(TaskKey::parse(&key.to_string()), Some(key));
        }
        assert_eq!(TaskKey::parse("not_a_task"), None);
    }
}
