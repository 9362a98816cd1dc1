//! Founder profile document schema
//!
//! One row per member, written once when the Sprint signup questionnaire
//! completes. Treated as an immutable input to task generation afterward.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for founder profiles
pub const PROFILE_COLLECTION: &str = "founder_profiles";

/// Team composition at signup time
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    /// Founding alone, no hires yet
    #[default]
    Solo,
    /// Has employees but no co-founders
    Employees,
    /// Has one or more co-founders
    Cofounders,
}

impl fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamStatus::Solo => write!(f, "solo"),
            TeamStatus::Employees => write!(f, "employees"),
            TeamStatus::Cofounders => write!(f, "cofounders"),
        }
    }
}

/// Self-reported familiarity with the target market
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MarketKnowledge {
    #[default]
    None,
    Some,
    Deep,
}

/// Founder profile document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FounderProfileDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Owning member
    pub member_id: String,

    /// Team composition
    #[serde(default)]
    pub team_status: TeamStatus,

    /// Whether the founder already has a pitch deck
    #[serde(default)]
    pub has_deck: bool,

    /// Whether the venture has received any funding
    #[serde(default)]
    pub received_funding: bool,

    /// Free-text funding detail, only collected when received_funding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_details: Option<String>,

    /// Whether the core IP is owned by a university
    #[serde(default)]
    pub university_ip: bool,

    /// Whether the tech-transfer office has been engaged already
    #[serde(default)]
    pub tto_engaged: bool,

    /// Self-reported market familiarity
    #[serde(default)]
    pub market_knowledge: MarketKnowledge,

    /// Free-text note about the underlying science
    #[serde(skip_serializing_if = "Option::is_none")]
    pub science_summary: Option<String>,
}

impl IntoIndexes for FounderProfileDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // At most one profile per member
            (
                doc! { "member_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("profile_member_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for FounderProfileDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
