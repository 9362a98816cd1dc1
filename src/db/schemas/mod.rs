//! Database schemas for Wilbe
//!
//! Defines MongoDB document structures for members, founder profiles,
//! sprint tasks, waitlist signups, discussions, merch orders, and videos.

mod discussion;
mod member;
mod merch;
mod metadata;
mod profile;
mod task;
mod video;
mod waitlist;

pub use discussion::{CommentDoc, ThreadDoc, COMMENT_COLLECTION, THREAD_COLLECTION};
pub use member::{MemberDoc, MEMBER_COLLECTION};
pub use merch::{MerchOrderDoc, MERCH_ORDER_COLLECTION};
pub use metadata::Metadata;
pub use profile::{FounderProfileDoc, MarketKnowledge, TeamStatus, PROFILE_COLLECTION};
pub use task::{
    ChoiceQuestion, SprintTaskDoc, TaskKey, TaskProgressDoc, TASK_COLLECTION,
    TASK_PROGRESS_COLLECTION,
};
pub use video::{VideoDoc, VIDEO_COLLECTION};
pub use waitlist::{WaitlistSignupDoc, WAITLIST_COLLECTION};
