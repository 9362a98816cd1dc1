//! Merch order document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for merch orders
pub const MERCH_ORDER_COLLECTION: &str = "merch_orders";

/// Merch order document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct MerchOrderDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Stable order ID used in confirmation email
    pub order_id: String,

    /// Ordering member
    pub member_id: String,

    /// Contact name for the shipment
    pub name: String,

    /// Contact email for the confirmation
    pub email: String,

    /// Catalog item (e.g. "lab-hoodie")
    pub item: String,

    /// Garment size
    pub size: String,

    /// Free-text shipping address
    pub address: String,

    /// Order status: "received" on creation, mutated by ops out of band
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "received".to_string()
}

impl IntoIndexes for MerchOrderDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "order_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("order_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "member_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("order_member_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for MerchOrderDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
