//! Task progress updates
//!
//! Progress writes are idempotent upserts keyed on (member_id, task):
//! repeating the same submission leaves the row in the same state.
//! `completed_at` records the first completion: it goes through `$min`,
//! so re-submitting a completed task cannot move it forward, and a later
//! non-completing edit cannot clear it.

use bson::{doc, Bson, DateTime, Document};
use serde::Deserialize;

/// Client-submitted progress payload for one task
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressUpdate {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub answer: Option<serde_json::Value>,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub file_link: Option<String>,
}

/// Build the upsert document for a progress submission.
///
/// `$set` carries the submitted fields; `$setOnInsert` seeds the row
/// identity and creation metadata so a first-time write produces a
/// complete document.
pub fn progress_update_doc(member_id: &str, task: &str, update: &ProgressUpdate) -> Document {
    let mut set = doc! {
        "completed": update.completed,
        "metadata.updated_at": DateTime::now(),
        "metadata.is_deleted": false,
    };

    if let Some(answer) = &update.answer {
        match bson::to_bson(answer) {
            Ok(b) => {
                set.insert("answer", b);
            }
            Err(_) => {
                set.insert("answer", Bson::Null);
            }
        }
    }
    if let Some(file_id) = &update.file_id {
        set.insert("file_id", file_id);
    }
    if let Some(file_link) = &update.file_link {
        set.insert("file_link", file_link);
    }
    let mut update_doc = doc! {
        "$set": set,
        "$setOnInsert": {
            "member_id": member_id,
            "task": task,
            "metadata.created_at": DateTime::now(),
        },
    };

    // $min keeps the earliest completion time across repeated
    // completed:true submissions (and sets it when the field is absent).
    if update.completed {
        update_doc.insert("$min", doc! { "completed_at": DateTime::now() });
    }

    update_doc
}

/// Filter selecting the single progress row a submission targets
pub fn progress_filter(member_id: &str, task: &str) -> Document {
    doc! { "member_id": member_id, "task": task }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(completed: bool) -> ProgressUpdate {
        ProgressUpdate {
            completed,
            answer: Some(serde_json::json!({"text": "done"})),
            file_id: None,
            file_link: None,
        }
    }

    #[test]
    fn test_set_on_insert_seeds_identity() {
        let doc = progress_update_doc("mem-1", "deck_review", &update(false));
        let on_insert = doc.get_document("$setOnInsert").unwrap();
        assert_eq!(on_insert.get_str("member_id").unwrap(), "mem-1");
        assert_eq!(on_insert.get_str("task").unwrap(), "deck_review");
        assert!(on_insert.contains_key("metadata.created_at"));
    }

    #[test]
    fn test_completed_at_only_on_completion() {
        let incomplete = progress_update_doc("mem-1", "deck_review", &update(false));
        assert!(!incomplete.contains_key("$min"));
        assert!(!incomplete
            .get_document("$set")
            .unwrap()
            .contains_key("completed_at"));

        let complete = progress_update_doc("mem-1", "deck_review", &update(true));
        assert!(complete
            .get_document("$min")
            .unwrap()
            .contains_key("completed_at"));
    }

    #[test]
    fn test_first_completion_time_is_preserved() {
        // completed_at rides in $min, never $set, so a repeat completion
        // cannot overwrite the timestamp the first one recorded
        let repeat = progress_update_doc("mem-1", "deck_review", &update(true));
        assert!(!repeat
            .get_document("$set")
            .unwrap()
            .contains_key("completed_at"));
        assert!(repeat
            .get_document("$min")
            .unwrap()
            .contains_key("completed_at"));
    }

    #[test]
    fn test_absent_fields_not_touched() {
        let u = ProgressUpdate {
            completed: false,
            answer: None,
            file_id: None,
            file_link: None,
        };
        let set = progress_update_doc("mem-1", "vision_statement", &u);
        let set = set.get_document("$set").unwrap();
        assert!(!set.contains_key("answer"));
        assert!(!set.contains_key("file_id"));
        assert!(!set.contains_key("file_link"));
        assert_eq!(set.get_bool("completed").unwrap(), false);
    }

    #[test]
    fn test_file_fields_carried_through() {
        let u = ProgressUpdate {
            completed: true,
            answer: None,
            file_id: Some("file-9".to_string()),
            file_link: Some("https://drive.example/file-9".to_string()),
        };
        let set = progress_update_doc("mem-1", "deck_review", &u);
        let set = set.get_document("$set").unwrap();
        assert_eq!(set.get_str("file_id").unwrap(), "file-9");
        assert_eq!(set.get_str("file_link").unwrap(), "https://drive.example/file-9");
    }

    #[test]
    fn test_filter_keys_on_member_and_task() {
        let f = progress_filter("mem-2", "peer_session");
        assert_eq!(f.get_str("member_id").unwrap(), "mem-2");
        assert_eq!(f.get_str("task").unwrap(), "peer_session");
        assert_eq!(f.len(), 2);
    }
}
