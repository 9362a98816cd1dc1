//! In-progress answer state for the signup questionnaire
//!
//! The client may keep this state itself and submit the finished sheet in
//! one request; the server uses the same structure to validate that the
//! submitted answers actually reach the end of the questionnaire under
//! the branch rules (answers for skipped steps are rejected).

use std::collections::HashMap;

use crate::sprint::steps::{next_step, Answer, StepDef, StepId};

/// Result of recording an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Advance to this step index
    Step(usize),
    /// The questionnaire is complete
    Complete,
}

/// Holds the in-progress answer map and the current step index
#[derive(Debug, Clone, Default)]
pub struct AnswerSheet {
    answers: HashMap<StepId, Answer>,
    current: usize,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step index
    pub fn current(&self) -> usize {
        self.current
    }

    /// Look up the answer recorded for a step
    pub fn answer(&self, id: StepId) -> Option<&Answer> {
        self.answers.get(&id)
    }

    /// Record the answer for the current step and advance
    pub fn record(&mut self, steps: &[StepDef], answer: Answer) -> NextStep {
        let Some(step) = steps.get(self.current) else {
            return NextStep::Complete;
        };

        let next = next_step(steps, self.current, &answer);
        self.answers.insert(step.id, answer);

        match next {
            Some(idx) => {
                self.current = idx;
                NextStep::Step(idx)
            }
            None => NextStep::Complete,
        }
    }

    /// Replay a submitted answer list from the first step, enforcing the
    /// branch rules. Returns the completed sheet or the reason it is not
    /// a valid walk of the questionnaire.
    pub fn replay(steps: &[StepDef], answers: &[Answer]) -> Result<Self, String> {
        let mut sheet = Self::new();

        for (i, answer) in answers.iter().enumerate() {
            match sheet.record(steps, answer.clone()) {
                NextStep::Step(_) => {}
                NextStep::Complete => {
                    if i + 1 < answers.len() {
                        return Err(format!(
                            "questionnaire complete after {} answers, {} submitted",
                            i + 1,
                            answers.len()
                        ));
                    }
                    return Ok(sheet);
                }
            }
        }

        Err("answers end before the questionnaire does".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprint::steps::signup_steps;

    #[test]
    fn test_record_advances_and_stores() {
        let steps = signup_steps();
        let mut sheet = AnswerSheet::new();

        let next = sheet.record(&steps, Answer::Text("synbio platform".into()));
        assert_eq!(next, NextStep::Step(1));
        assert_eq!(
            sheet.answer(StepId::ScienceSummary),
            Some(&Answer::Text("synbio platform".into()))
        );
    }

    #[test]
    fn test_replay_full_path() {
        let steps = signup_steps();
        let answers = vec![
            Answer::Text("protein folding".into()),
            Answer::Choice("solo".into()),
            Answer::YesNo(false),        // no deck
            Answer::YesNo(true),         // received funding
            Answer::Text("SBIR grant".into()),
            Answer::YesNo(true),         // university IP
            Answer::YesNo(false),        // TTO not engaged
            Answer::Choice("some".into()),
        ];

        let sheet = AnswerSheet::replay(&steps, &answers).unwrap();
        assert_eq!(sheet.answer(StepId::FundingDetails), Some(&Answer::Text("SBIR grant".into())));
        assert_eq!(sheet.answer(StepId::TtoEngaged), Some(&Answer::YesNo(false)));
    }

    #[test]
    fn test_replay_branched_path_skips_steps() {
        let steps = signup_steps();
        let answers = vec![
            Answer::Text("quantum sensing".into()),
            Answer::Choice("cofounders".into()),
            Answer::YesNo(true),          // has deck
            Answer::YesNo(false),         // no funding -> skips details
            Answer::YesNo(false),         // no university IP -> skips TTO
            Answer::Choice("deep".into()),
        ];

        let sheet = AnswerSheet::replay(&steps, &answers).unwrap();
        assert_eq!(sheet.answer(StepId::FundingDetails), None);
        assert_eq!(sheet.answer(StepId::TtoEngaged), None);
    }

    #[test]
    fn test_replay_rejects_short_walk() {
        let steps = signup_steps();
        let answers = vec![Answer::Text("just one".into())];
        assert!(AnswerSheet::replay(&steps, &answers).is_err());
    }

    #[test]
    fn test_replay_rejects_extra_answers() {
        let steps = signup_steps();
        let mut answers = vec![
            Answer::Text("materials".into()),
            Answer::Choice("solo".into()),
            Answer::YesNo(false),
            Answer::YesNo(false),
            Answer::YesNo(false),
            Answer::Choice("none".into()),
        ];
        answers.push(Answer::Text("stray".into()));
        assert!(AnswerSheet::replay(&steps, &answers).is_err());
    }
}
