use serde::{Deserialize, Serialize};

use super::answers::{AnswerError, AnswerStore};
use super::questionnaire::Questionnaire;

/// What to do with a submission that leaves questions unanswered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncompletePolicy {
    /// Refuse to score until every question has an answer.
    #[default]
    Reject,
    /// Score unanswered questions as weight 0.
    ScoreMissingAsZero,
}

impl IncompletePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "score_missing_as_zero" | "zero" => Some(Self::ScoreMissingAsZero),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningPolicy {
    pub incomplete: IncompletePolicy,
}

impl ScreeningPolicy {
    /// Gate applied before a set of answers may become a result.
    pub fn admit(
        &self,
        questionnaire: &Questionnaire,
        answers: &AnswerStore,
    ) -> Result<(), SessionError> {
        questionnaire.validate_all(answers)?;

        let missing = answers.missing(questionnaire);
        if !missing.is_empty() && self.incomplete == IncompletePolicy::Reject {
            return Err(SessionError::Incomplete { missing });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error("questionnaire incomplete, unanswered: {}", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },
}
