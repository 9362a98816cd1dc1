//! Answer-sheet to founder-profile coercion
//!
//! Maps the UI-level answers (yes/no, choice strings) onto the typed
//! fields of the persisted profile. Missing required answers are
//! validation errors; answers for branched-over steps are simply absent.

use crate::db::schemas::{FounderProfileDoc, MarketKnowledge, Metadata, TeamStatus};
use crate::sprint::navigation::AnswerSheet;
use crate::sprint::steps::{Answer, StepId};
use crate::types::WilbeError;

fn require_yes_no(sheet: &AnswerSheet, id: StepId) -> Result<bool, WilbeError> {
    match sheet.answer(id) {
        Some(Answer::YesNo(v)) => Ok(*v),
        Some(_) => Err(WilbeError::Validation(format!(
            "expected a yes/no answer for {:?}",
            id
        ))),
        None => Err(WilbeError::Validation(format!("missing answer for {:?}", id))),
    }
}

fn optional_text(sheet: &AnswerSheet, id: StepId) -> Option<String> {
    match sheet.answer(id) {
        Some(Answer::Text(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Build the persisted profile from a completed answer sheet
pub fn build_profile(sheet: &AnswerSheet, member_id: &str) -> Result<FounderProfileDoc, WilbeError> {
    let team_status = match sheet.answer(StepId::TeamStatus) {
        Some(Answer::Choice(c)) => match c.as_str() {
            "solo" => TeamStatus::Solo,
            "employees" => TeamStatus::Employees,
            "cofounders" => TeamStatus::Cofounders,
            other => {
                return Err(WilbeError::Validation(format!(
                    "unknown team status '{}'",
                    other
                )))
            }
        },
        _ => return Err(WilbeError::Validation("missing answer for TeamStatus".into())),
    };

    let market_knowledge = match sheet.answer(StepId::MarketKnowledge) {
        Some(Answer::Choice(c)) => match c.as_str() {
            "none" => MarketKnowledge::None,
            "some" => MarketKnowledge::Some,
            "deep" => MarketKnowledge::Deep,
            other => {
                return Err(WilbeError::Validation(format!(
                    "unknown market knowledge '{}'",
                    other
                )))
            }
        },
        _ => {
            return Err(WilbeError::Validation(
                "missing answer for MarketKnowledge".into(),
            ))
        }
    };

    let has_deck = require_yes_no(sheet, StepId::HasDeck)?;
    let received_funding = require_yes_no(sheet, StepId::ReceivedFunding)?;
    let university_ip = require_yes_no(sheet, StepId::UniversityIp)?;

    // Branch-dependent answers: required only when their branch was taken
    let funding_details = if received_funding {
        let details = optional_text(sheet, StepId::FundingDetails);
        if details.is_none() {
            return Err(WilbeError::Validation(
                "funding details required when funding was received".into(),
            ));
        }
        details
    } else {
        None
    };

    let tto_engaged = if university_ip {
        require_yes_no(sheet, StepId::TtoEngaged)?
    } else {
        false
    };

    Ok(FounderProfileDoc {
        _id: None,
        metadata: Metadata::new(),
        member_id: member_id.to_string(),
        team_status,
        has_deck,
        received_funding,
        funding_details,
        university_ip,
        tto_engaged,
        market_knowledge,
        science_summary: optional_text(sheet, StepId::ScienceSummary),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprint::steps::signup_steps;

    fn sheet_from(answers: Vec<Answer>) -> AnswerSheet {
        AnswerSheet::replay(&signup_steps(), &answers).unwrap()
    }

    #[test]
    fn test_full_path_coercion() {
        let sheet = sheet_from(vec![
            Answer::Text("gene circuits".into()),
            Answer::Choice("cofounders".into()),
            Answer::YesNo(true),
            Answer::YesNo(true),
            Answer::Text("angel round".into()),
            Answer::YesNo(true),
            Answer::YesNo(true),
            Answer::Choice("deep".into()),
        ]);

        let profile = build_profile(&sheet, "mem-1").unwrap();
        assert_eq!(profile.team_status, TeamStatus::Cofounders);
        assert!(profile.has_deck);
        assert!(profile.received_funding);
        assert_eq!(profile.funding_details.as_deref(), Some("angel round"));
        assert!(profile.university_ip);
        assert!(profile.tto_engaged);
        assert_eq!(profile.market_knowledge, MarketKnowledge::Deep);
        assert_eq!(profile.science_summary.as_deref(), Some("gene circuits"));
    }

    #[test]
    fn test_branched_path_defaults() {
        let sheet = sheet_from(vec![
            Answer::Text("".into()),
            Answer::Choice("solo".into()),
            Answer::YesNo(false),
            Answer::YesNo(false), // no funding -> skip details
            Answer::YesNo(false), // no university IP -> skip TTO
            Answer::Choice("none".into()),
        ]);

        let profile = build_profile(&sheet, "mem-2").unwrap();
        assert_eq!(profile.team_status, TeamStatus::Solo);
        assert!(!profile.received_funding);
        assert_eq!(profile.funding_details, None);
        assert!(!profile.university_ip);
        assert!(!profile.tto_engaged);
        assert_eq!(profile.science_summary, None);
    }

    #[test]
    fn test_missing_funding_details_rejected() {
        // Funded but the details answer is blank
        let sheet = sheet_from(vec![
            Answer::Text("diagnostics".into()),
            Answer::Choice("solo".into()),
            Answer::YesNo(false),
            Answer::YesNo(true),
            Answer::Text("   ".into()),
            Answer::YesNo(false),
            Answer::Choice("some".into()),
        ]);

        assert!(build_profile(&sheet, "mem-3").is_err());
    }

    #[test]
    fn test_unknown_choice_rejected() {
        let steps = signup_steps();
        let mut sheet = AnswerSheet::new();
        sheet.record(&steps, Answer::Text("x".into()));
        sheet.record(&steps, Answer::Choice("committee".into()));

        assert!(build_profile(&sheet, "mem-4").is_err());
    }
}
