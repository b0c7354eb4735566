use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::questionnaire::Questionnaire;

/// Selected choice per question for one screening session. Later selections overwrite earlier
/// ones; nothing of the earlier choice is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerStore {
    answers: BTreeMap<String, String>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validated selection. Returns the value that was replaced, if any.
    pub fn select(
        &mut self,
        questionnaire: &Questionnaire,
        question_id: &str,
        value: &str,
    ) -> Result<Option<String>, AnswerError> {
        questionnaire.validate(question_id, value)?;
        Ok(self
            .answers
            .insert(question_id.to_string(), value.to_string()))
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers
            .iter()
            .map(|(question, value)| (question.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Question ids of the instrument that have no answer yet, in instrument order.
    pub fn missing(&self, questionnaire: &Questionnaire) -> Vec<&'static str> {
        questionnaire
            .questions
            .iter()
            .filter(|question| !self.answers.contains_key(question.id))
            .map(|question| question.id)
            .collect()
    }

    pub fn is_complete(&self, questionnaire: &Questionnaire) -> bool {
        self.missing(questionnaire).is_empty()
    }
}

/// Unvalidated bulk construction; pair with [`Questionnaire::validate_all`].
impl<K, V> FromIterator<(K, V)> for AnswerStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            answers: iter
                .into_iter()
                .map(|(question, value)| (question.into(), value.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
    #[error("question '{question_id}' is not part of the questionnaire")]
    UnknownQuestion { question_id: String },
    #[error("'{value}' is not an option for question '{question_id}'")]
    UnknownChoice { question_id: String, value: String },
}
