//! Sprint task generation
//!
//! `generate_tasks` is a pure function of the founder profile: the same
//! profile always yields the same task rows in the same order. The DB
//! side (`ensure_tasks_generated`) runs it at most once per member,
//! backed by the unique (member_id, task) index.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::mongo::MongoCollection;
use crate::db::schemas::{
    ChoiceQuestion, FounderProfileDoc, MarketKnowledge, Metadata, SprintTaskDoc, TaskKey,
    TeamStatus,
};
use crate::types::WilbeError;

fn task(
    profile: &FounderProfileDoc,
    key: TaskKey,
    order: i32,
    title: &str,
    description: String,
    requires_upload: bool,
    question: Option<ChoiceQuestion>,
) -> SprintTaskDoc {
    SprintTaskDoc {
        _id: None,
        metadata: Metadata::new(),
        member_id: profile.member_id.clone(),
        task: key.to_string(),
        title: title.to_string(),
        description,
        order,
        requires_upload,
        question,
    }
}

/// Expand a founder profile into its personalized sprint task list.
///
/// Inclusion rules:
/// - vision statement and peer session for everyone
/// - deck review for everyone, copy depends on whether a deck exists
/// - hiring plan only for solo founders
/// - TTO engagement only when the IP sits with a university and the
///   tech-transfer office has not been engaged yet
/// - funding details only when funding was received
/// - market landscape unless market knowledge is already deep
pub fn generate_tasks(profile: &FounderProfileDoc) -> Vec<SprintTaskDoc> {
    let mut tasks = Vec::new();
    let mut order = 0;
    let mut next_order = || {
        order += 1;
        order
    };

    tasks.push(task(
        profile,
        TaskKey::VisionStatement,
        next_order(),
        "Write your vision statement",
        "Summarize, in one page, what your company will look like in five years and why \
         the science makes that future possible."
            .to_string(),
        false,
        None,
    ));

    let deck_description = if profile.has_deck {
        "Upload your current pitch deck for review by the Wilbe team.".to_string()
    } else {
        "Draft a first pitch deck using the Wilbe template and upload it for review."
            .to_string()
    };
    tasks.push(task(
        profile,
        TaskKey::DeckReview,
        next_order(),
        "Pitch deck review",
        deck_description,
        true,
        None,
    ));

    if profile.team_status == TeamStatus::Solo {
        tasks.push(task(
            profile,
            TaskKey::HiringPlan,
            next_order(),
            "Sketch your first hires",
            "List the first three roles you would hire for and what each unlocks."
                .to_string(),
            false,
            None,
        ));
    }

    if profile.university_ip && !profile.tto_engaged {
        tasks.push(task(
            profile,
            TaskKey::TtoEngagement,
            next_order(),
            "Engage the tech-transfer office",
            "Open the licensing conversation with your university's tech-transfer office \
             and record where the negotiation stands."
                .to_string(),
            false,
            Some(ChoiceQuestion {
                prompt: "Where does the TTO conversation stand?".to_string(),
                options: vec![
                    "not started".to_string(),
                    "first meeting booked".to_string(),
                    "terms under discussion".to_string(),
                    "license agreed".to_string(),
                ],
                multiple: false,
            }),
        ));
    }

    if profile.received_funding {
        tasks.push(task(
            profile,
            TaskKey::FundingDetails,
            next_order(),
            "Map your funding runway",
            "Lay out what you have raised, what it buys you, and the milestone the next \
             round depends on."
                .to_string(),
            false,
            None,
        ));
    }

    if profile.market_knowledge != MarketKnowledge::Deep {
        tasks.push(task(
            profile,
            TaskKey::MarketLandscape,
            next_order(),
            "Map the market landscape",
            "Identify the customers, incumbents, and adjacent technologies competing for \
             the same budget."
                .to_string(),
            false,
            None,
        ));
    }

    tasks.push(task(
        profile,
        TaskKey::PeerSession,
        next_order(),
        "Book a peer session",
        "Schedule a session with another sprint member and pressure-test each other's \
         plans."
            .to_string(),
        false,
        None,
    ));

    tasks
}

/// Store operations the generator needs. The Mongo collection is the
/// production implementation; tests substitute an in-memory one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_for_member(&self, member_id: &str) -> Result<Vec<SprintTaskDoc>, WilbeError>;
    async fn insert(&self, task: SprintTaskDoc) -> Result<(), WilbeError>;
}

#[async_trait]
impl TaskStore for MongoCollection<SprintTaskDoc> {
    async fn list_for_member(&self, member_id: &str) -> Result<Vec<SprintTaskDoc>, WilbeError> {
        self.find_many(bson::doc! { "member_id": member_id }).await
    }

    async fn insert(&self, task: SprintTaskDoc) -> Result<(), WilbeError> {
        self.insert_one(task).await.map(|_| ())
    }
}

/// Generate and persist the task list for a member, at most once.
///
/// Existing rows short-circuit. A concurrent duplicate submission loses
/// the insert race on the unique (member_id, task) index; that is treated
/// as already-generated, not an error. A failed run leaves nothing behind
/// that blocks a later call: the next invocation picks up where the
/// inserts stopped.
pub async fn ensure_tasks_generated(
    store: &impl TaskStore,
    profile: &FounderProfileDoc,
) -> Result<Vec<SprintTaskDoc>, WilbeError> {
    let existing = store.list_for_member(&profile.member_id).await?;
    let full_set = generate_tasks(profile);
    if existing.len() >= full_set.len() {
        info!(
            member_id = %profile.member_id,
            count = existing.len(),
            "Sprint tasks already generated"
        );
        return Ok(existing);
    }

    for task in full_set {
        if existing.iter().any(|t| t.task == task.task) {
            continue;
        }
        let key = task.task.clone();
        match store.insert(task).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate_key() => {
                // Lost the race to a concurrent generation; the winner's
                // rows are authoritative.
                warn!(
                    member_id = %profile.member_id,
                    task = %key,
                    "Task already generated by a concurrent request"
                );
            }
            Err(e) => return Err(e),
        }
    }

    store.list_for_member(&profile.member_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory TaskStore mirroring the unique (member_id, task) index.
    /// `fail_next` makes the next N inserts return a transient error;
    /// `race_on` makes one insert lose to a "concurrent" writer whose
    /// identical row lands first.
    #[derive(Default)]
    struct MemStore {
        rows: Mutex<Vec<SprintTaskDoc>>,
        fail_next: Mutex<usize>,
        race_on: Mutex<Option<String>>,
        inserts: Mutex<usize>,
    }

    #[async_trait]
    impl TaskStore for MemStore {
        async fn list_for_member(
            &self,
            member_id: &str,
        ) -> Result<Vec<SprintTaskDoc>, WilbeError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.member_id == member_id)
                .cloned()
                .collect())
        }

        async fn insert(&self, task: SprintTaskDoc) -> Result<(), WilbeError> {
            *self.inserts.lock().unwrap() += 1;
            let mut fail_next = self.fail_next.lock().unwrap();
            if *fail_next > 0 {
                *fail_next -= 1;
                return Err(WilbeError::Database("connection reset".into()));
            }
            let mut rows = self.rows.lock().unwrap();
            let raced = *self.race_on.lock().unwrap() == Some(task.task.clone());
            if raced {
                *self.race_on.lock().unwrap() = None;
                rows.push(task);
                return Err(WilbeError::Database("E11000 duplicate key error".into()));
            }
            if rows
                .iter()
                .any(|t| t.member_id == task.member_id && t.task == task.task)
            {
                return Err(WilbeError::Database("E11000 duplicate key error".into()));
            }
            rows.push(task);
            Ok(())
        }
    }

    fn profile() -> FounderProfileDoc {
        FounderProfileDoc {
            member_id: "mem-1".to_string(),
            team_status: TeamStatus::Cofounders,
            has_deck: true,
            received_funding: true,
            funding_details: Some("seed round".to_string()),
            university_ip: true,
            tto_engaged: false,
            market_knowledge: MarketKnowledge::Some,
            ..Default::default()
        }
    }

    fn keys(tasks: &[SprintTaskDoc]) -> Vec<String> {
        tasks.iter().map(|t| t.task.clone()).collect()
    }

    #[test]
    fn test_generation_is_deterministic() {
        let p = profile();
        let a = generate_tasks(&p);
        let b = generate_tasks(&p);
        assert_eq!(keys(&a), keys(&b));
        assert_eq!(
            a.iter().map(|t| t.order).collect::<Vec<_>>(),
            b.iter().map(|t| t.order).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_orders_are_strictly_increasing() {
        let tasks = generate_tasks(&profile());
        for pair in tasks.windows(2) {
            assert!(pair[0].order < pair[1].order);
        }
    }

    #[test]
    fn test_solo_founder_gets_hiring_plan() {
        let mut p = profile();
        p.team_status = TeamStatus::Solo;
        assert!(keys(&generate_tasks(&p)).contains(&"hiring_plan".to_string()));

        p.team_status = TeamStatus::Cofounders;
        assert!(!keys(&generate_tasks(&p)).contains(&"hiring_plan".to_string()));
    }

    #[test]
    fn test_unfunded_solo_without_university_ip() {
        let p = FounderProfileDoc {
            member_id: "mem-2".to_string(),
            team_status: TeamStatus::Solo,
            has_deck: false,
            received_funding: false,
            university_ip: false,
            tto_engaged: false,
            market_knowledge: MarketKnowledge::None,
            ..Default::default()
        };

        let task_keys = keys(&generate_tasks(&p));
        assert!(task_keys.contains(&"hiring_plan".to_string()));
        assert!(!task_keys.contains(&"tto_engagement".to_string()));
        assert!(!task_keys.contains(&"funding_details".to_string()));
        assert!(task_keys.contains(&"market_landscape".to_string()));
    }

    #[test]
    fn test_tto_task_only_when_not_yet_engaged() {
        let mut p = profile();
        assert!(keys(&generate_tasks(&p)).contains(&"tto_engagement".to_string()));

        p.tto_engaged = true;
        assert!(!keys(&generate_tasks(&p)).contains(&"tto_engagement".to_string()));

        p.tto_engaged = false;
        p.university_ip = false;
        assert!(!keys(&generate_tasks(&p)).contains(&"tto_engagement".to_string()));
    }

    #[test]
    fn test_deep_market_knowledge_skips_landscape() {
        let mut p = profile();
        p.market_knowledge = MarketKnowledge::Deep;
        assert!(!keys(&generate_tasks(&p)).contains(&"market_landscape".to_string()));
    }

    #[test]
    fn test_baseline_tasks_always_present() {
        let mut p = profile();
        p.team_status = TeamStatus::Employees;
        p.received_funding = false;
        p.university_ip = false;
        p.market_knowledge = MarketKnowledge::Deep;

        let task_keys = keys(&generate_tasks(&p));
        assert_eq!(
            task_keys,
            vec!["vision_statement", "deck_review", "peer_session"]
        );
    }

    #[tokio::test]
    async fn test_generation_runs_once() {
        let store = MemStore::default();
        let p = profile();

        let first = ensure_tasks_generated(&store, &p).await.unwrap();
        let inserts_after_first = *store.inserts.lock().unwrap();
        let second = ensure_tasks_generated(&store, &p).await.unwrap();

        assert_eq!(keys(&first), keys(&second));
        // Second call short-circuits without touching the store
        assert_eq!(*store.inserts.lock().unwrap(), inserts_after_first);
    }

    #[tokio::test]
    async fn test_failed_generation_completes_on_retry() {
        let store = MemStore::default();
        let p = profile();
        let expected = generate_tasks(&p).len();

        // First run dies partway through its inserts
        *store.fail_next.lock().unwrap() = 2;
        assert!(ensure_tasks_generated(&store, &p).await.is_err());
        assert!(store.rows.lock().unwrap().len() < expected);

        // A later trigger fills in the missing rows without duplicating
        // the ones that landed
        let tasks = ensure_tasks_generated(&store, &p).await.unwrap();
        assert_eq!(tasks.len(), expected);
        assert_eq!(store.rows.lock().unwrap().len(), expected);
    }

    #[tokio::test]
    async fn test_duplicate_key_on_insert_is_tolerated() {
        let store = MemStore::default();
        let p = profile();

        // One insert loses the race to a concurrent generation
        *store.race_on.lock().unwrap() = Some("deck_review".to_string());

        let tasks = ensure_tasks_generated(&store, &p).await.unwrap();
        assert_eq!(tasks.len(), generate_tasks(&p).len());
    }

    #[test]
    fn test_deck_copy_tracks_has_deck() {
        let mut p = profile();
        p.has_deck = true;
        let with_deck = generate_tasks(&p);
        p.has_deck = false;
        let without_deck = generate_tasks(&p);

        let find = |tasks: &[SprintTaskDoc]| {
            tasks
                .iter()
                .find(|t| t.task == "deck_review")
                .map(|t| t.description.clone())
                .unwrap()
        };
        assert_ne!(find(&with_deck), find(&without_deck));
    }
}
