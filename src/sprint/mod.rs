//! Sprint onboarding and task generation
//!
//! The Sprint signup flow walks an applicant through an ordered
//! questionnaire with conditional branches, persists the answers as a
//! founder profile, then expands that profile into a fixed, personalized
//! set of sprint tasks. Progress on each task is tracked per member with
//! upsert semantics.

pub mod navigation;
pub mod profile;
pub mod progress;
pub mod steps;
pub mod tasks;

pub use navigation::{AnswerSheet, NextStep};
pub use profile::build_profile;
pub use progress::{progress_filter, progress_update_doc, ProgressUpdate};
pub use steps::{next_step, signup_steps, Answer, BranchRule, Expected, StepDef, StepId, StepInput};
pub use tasks::{ensure_tasks_generated, generate_tasks, TaskStore};
