//! Sprint signup step catalog and conditional navigation
//!
//! Steps are an ordered, static catalog. Branch rules are a typed
//! decision table attached to individual steps: when the submitted answer
//! matches a rule, navigation jumps to the rule's target instead of
//! advancing sequentially. All shipped targets are forward jumps; the
//! catalog test below checks that property since next_step itself does
//! not reject backward targets.

use serde::{Deserialize, Serialize};

/// Identifies a questionnaire step
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    ScienceSummary,
    TeamStatus,
    HasDeck,
    ReceivedFunding,
    FundingDetails,
    UniversityIp,
    TtoEngaged,
    MarketKnowledge,
}

/// Input widget a step renders
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepInput {
    FreeText,
    YesNo,
    Choice { options: Vec<&'static str> },
}

/// A submitted answer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Text(String),
    YesNo(bool),
    Choice(String),
}

/// The answer shape a branch rule matches against
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expected {
    Yes,
    No,
    Choice(&'static str),
}

impl Expected {
    fn matches(&self, answer: &Answer) -> bool {
        match (self, answer) {
            (Expected::Yes, Answer::YesNo(v)) => *v,
            (Expected::No, Answer::YesNo(v)) => !*v,
            (Expected::Choice(want), Answer::Choice(got)) => *want == got.as_str(),
            _ => false,
        }
    }
}

/// A conditional jump: when the step's answer matches, go to the target
#[derive(Clone, Copy, Debug)]
pub struct BranchRule {
    pub when: Expected,
    pub go_to: StepId,
}

/// One step of the signup questionnaire
#[derive(Clone, Debug)]
pub struct StepDef {
    pub id: StepId,
    pub prompt: &'static str,
    pub input: StepInput,
    pub branches: &'static [BranchRule],
}

const NO_BRANCHES: &[BranchRule] = &[];

/// The ordered signup step catalog
pub fn signup_steps() -> Vec<StepDef> {
    vec![
        StepDef {
            id: StepId::ScienceSummary,
            prompt: "Tell us about the science behind your venture",
            input: StepInput::FreeText,
            branches: NO_BRANCHES,
        },
        StepDef {
            id: StepId::TeamStatus,
            prompt: "Who is building this with you?",
            input: StepInput::Choice {
                options: vec!["solo", "employees", "cofounders"],
            },
            branches: NO_BRANCHES,
        },
        StepDef {
            id: StepId::HasDeck,
            prompt: "Do you have a pitch deck?",
            input: StepInput::YesNo,
            branches: NO_BRANCHES,
        },
        StepDef {
            id: StepId::ReceivedFunding,
            prompt: "Have you received any funding?",
            input: StepInput::YesNo,
            // No funding: the detail question is irrelevant, skip past it
            branches: &[BranchRule {
                when: Expected::No,
                go_to: StepId::UniversityIp,
            }],
        },
        StepDef {
            id: StepId::FundingDetails,
            prompt: "What funding have you received so far?",
            input: StepInput::FreeText,
            branches: NO_BRANCHES,
        },
        StepDef {
            id: StepId::UniversityIp,
            prompt: "Is the core IP owned by a university?",
            input: StepInput::YesNo,
            // No university IP: TTO engagement does not apply
            branches: &[BranchRule {
                when: Expected::No,
                go_to: StepId::MarketKnowledge,
            }],
        },
        StepDef {
            id: StepId::TtoEngaged,
            prompt: "Have you engaged the tech-transfer office?",
            input: StepInput::YesNo,
            branches: NO_BRANCHES,
        },
        StepDef {
            id: StepId::MarketKnowledge,
            prompt: "How well do you know the market you are entering?",
            input: StepInput::Choice {
                options: vec!["none", "some", "deep"],
            },
            branches: NO_BRANCHES,
        },
    ]
}

/// Compute the next step index after answering `current`.
///
/// Default is sequential advance; a matching branch rule overrides the
/// target. Returns None when the questionnaire is complete.
pub fn next_step(steps: &[StepDef], current: usize, answer: &Answer) -> Option<usize> {
    let step = steps.get(current)?;

    for rule in step.branches {
        if rule.when.matches(answer) {
            return steps.iter().position(|s| s.id == rule.go_to);
        }
    }

    if current + 1 < steps.len() {
        Some(current + 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(steps: &[StepDef], id: StepId) -> usize {
        steps.iter().position(|s| s.id == id).unwrap()
    }

    #[test]
    fn test_sequential_advance_without_matching_rule() {
        let steps = signup_steps();
        // Free-text step: always sequential
        assert_eq!(
            next_step(&steps, 0, &Answer::Text("enzymes".into())),
            Some(1)
        );
        // Branching step with a non-matching answer: sequential
        let funding = index_of(&steps, StepId::ReceivedFunding);
        assert_eq!(
            next_step(&steps, funding, &Answer::YesNo(true)),
            Some(index_of(&steps, StepId::FundingDetails))
        );
    }

    #[test]
    fn test_branch_overrides_sequential_advance() {
        let steps = signup_steps();
        let funding = index_of(&steps, StepId::ReceivedFunding);
        assert_eq!(
            next_step(&steps, funding, &Answer::YesNo(false)),
            Some(index_of(&steps, StepId::UniversityIp))
        );

        let ip = index_of(&steps, StepId::UniversityIp);
        assert_eq!(
            next_step(&steps, ip, &Answer::YesNo(false)),
            Some(index_of(&steps, StepId::MarketKnowledge))
        );
    }

    #[test]
    fn test_last_step_completes() {
        let steps = signup_steps();
        let last = steps.len() - 1;
        assert_eq!(next_step(&steps, last, &Answer::Choice("deep".into())), None);
    }

    #[test]
    fn test_out_of_range_step() {
        let steps = signup_steps();
        assert_eq!(next_step(&steps, 99, &Answer::YesNo(true)), None);
    }

    #[test]
    fn test_expected_does_not_match_wrong_answer_shape() {
        assert!(!Expected::Yes.matches(&Answer::Text("yes".into())));
        assert!(!Expected::Choice("solo").matches(&Answer::YesNo(true)));
        assert!(Expected::Choice("solo").matches(&Answer::Choice("solo".into())));
    }

    #[test]
    fn test_shipped_catalog_branches_are_forward_only() {
        let steps = signup_steps();
        for (i, step) in steps.iter().enumerate() {
            for rule in step.branches {
                let target = index_of(&steps, rule.go_to);
                assert!(
                    target > i,
                    "branch on {:?} jumps backward to {:?}",
                    step.id,
                    rule.go_to
                );
            }
        }
    }
}
